use serde::Deserialize;

use super::RemoteCatalog;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct RandomImage {
    message: String,
    status: String,
}

/// Random dog pictures from the dog.ceo API
pub struct DogCeoCatalog {
    url: String,
    client: reqwest::blocking::Client,
}

impl DogCeoCatalog {
    pub fn new(url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

impl RemoteCatalog for DogCeoCatalog {
    fn fetch_random_locator(&self) -> Result<String> {
        let resp = self.client.get(&self.url).send()?;
        if !resp.status().is_success() {
            return Err(Error::Rejected(format!("catalog returned {}", resp.status())));
        }
        let text = resp.text()?;
        let body: RandomImage = serde_json::from_str(&text)
            .map_err(|e| Error::Network(format!("unexpected catalog response: {}", e)))?;

        if body.status != "success" {
            return Err(Error::Rejected(format!(
                "catalog returned status '{}'",
                body.status
            )));
        }
        tracing::debug!(locator = %body.message, "random item located");
        Ok(body.message)
    }

    fn fetch_payload(&self, locator: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(locator).send()?.error_for_status()?;
        let bytes = resp.bytes()?;
        tracing::debug!(locator, bytes = bytes.len(), "payload downloaded");
        Ok(bytes.to_vec())
    }
}
