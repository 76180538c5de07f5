//! Knowledge lookups: MediaWiki search, then the REST summary of the top hit.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::KnowledgeBase;
use crate::{Error, Result};

lazy_static! {
    // Sentence end: terminal punctuation followed by whitespace
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?…]+[\s]+").unwrap();
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    page_type: String,
    #[serde(default)]
    extract: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

/// Summaries of the best-matching article for a term.
///
/// The term is first resolved through the MediaWiki full-text search, so
/// catalog tokens like `hound-afghan` reach the "Afghan Hound" article.
pub struct WikipediaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl WikipediaClient {
    /// `base_url` is the wiki root, e.g. `https://en.wikipedia.org`
    pub fn new(base_url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn base(&self) -> Result<reqwest::Url> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Lookup(format!("invalid base url {}: {}", self.base_url, e)))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| Error::Lookup(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn search_url(&self, term: &str) -> Result<reqwest::Url> {
        let mut url = self.endpoint(&["w", "api.php"])?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", term)
            .append_pair("srlimit", "1")
            .append_pair("format", "json");
        Ok(url)
    }

    fn summary_url(&self, title: &str) -> Result<reqwest::Url> {
        let title = title.replace(' ', "_");
        self.endpoint(&["api", "rest_v1", "page", "summary", title.as_str()])
    }

    /// Title of the top search hit for `term`
    fn resolve_title(&self, term: &str) -> Result<String> {
        let query = search_terms(term);
        let url = self.search_url(&query)?;
        tracing::debug!(%url, "knowledge search");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Lookup(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::Lookup(format!("wikipedia search returned {}", resp.status())));
        }

        let found: SearchResponse = resp
            .json()
            .map_err(|e| Error::Lookup(format!("unexpected search response: {}", e)))?;
        found
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title)
            .ok_or_else(|| Error::NotFound(term.to_string()))
    }

    fn fetch_summary(&self, term: &str, title: &str) -> Result<String> {
        let url = self.summary_url(title)?;
        tracing::debug!(%url, "knowledge lookup");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Lookup(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(term.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Lookup(format!("wikipedia returned {}", status)));
        }

        let page: PageSummary = resp
            .json()
            .map_err(|e| Error::Lookup(format!("unexpected summary response: {}", e)))?;

        if page.page_type == "disambiguation" {
            return Err(Error::Lookup(format!("'{}' is ambiguous", title)));
        }
        if page.extract.trim().is_empty() {
            return Err(Error::NotFound(term.to_string()));
        }
        Ok(page.extract)
    }
}

/// Catalog tokens join words with `-`; search wants them spaced
fn search_terms(term: &str) -> String {
    term.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the first `max` sentences of `text`
pub fn first_sentences(text: &str, max: usize) -> String {
    let text = text.trim();
    if max == 0 {
        return String::new();
    }
    match SENTENCE_END.find_iter(text).nth(max - 1) {
        Some(m) => text[..m.end()].trim_end().to_string(),
        None => text.to_string(),
    }
}

impl KnowledgeBase for WikipediaClient {
    fn summarize(&self, term: &str, max_sentences: usize) -> Result<String> {
        let title = self.resolve_title(term)?;
        tracing::debug!(term, %title, "term resolved");
        let extract = self.fetch_summary(term, &title)?;
        Ok(first_sentences(&extract, max_sentences))
    }
}
