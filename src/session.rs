//! The single piece of mutable state: the currently loaded remote item.

/// Item fetched by the last successful `FetchNext`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedItem {
    locator: String,
    payload: Vec<u8>,
}

/// Session owned by the assistant loop and mutated only by the dispatcher.
///
/// Locator and payload live in one `LoadedItem`, so they are either both set
/// or both absent.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    item: Option<LoadedItem>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loaded item. Rejects empty locators and payloads so a
    /// half-filled item can never be stored.
    pub fn load(&mut self, locator: String, payload: Vec<u8>) -> bool {
        if locator.is_empty() || payload.is_empty() {
            return false;
        }
        self.item = Some(LoadedItem { locator, payload });
        true
    }

    pub fn locator(&self) -> Option<&str> {
        self.item.as_ref().map(|i| i.locator.as_str())
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.item.as_ref().map(|i| i.payload.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.item.is_some()
    }
}

/// Category token of a locator: its second-to-last `/` segment.
/// An empty segment (`/img.jpg`, `a//b.jpg`) is no category.
pub fn derive_category(locator: &str) -> Option<&str> {
    locator.rsplit('/').nth(1).filter(|c| !c.is_empty())
}

/// File name used when saving the payload of `locator`.
///
/// `dog_<category>.<ext>`, keeping the extension of the last path segment
/// (query strings stripped) and falling back to `jpg`.
pub fn derive_filename(locator: &str) -> Option<String> {
    let category = derive_category(locator)?;
    let last = locator
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let ext = match last.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_lowercase()
        }
        _ => "jpg".to_string(),
    };
    Some(format!("dog_{}.{}", sanitize(category), ext))
}

// Keeps a path segment usable as part of a file name.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
