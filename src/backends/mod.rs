pub mod dog_ceo;
pub mod espeak;
pub mod system;
pub mod vosk;
pub mod wikipedia;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;

/// Makes sure the speech model exists locally before decoding starts
pub trait ModelProvisioner: Send {
    /// Fails with `Error::Provisioning`; the caller must not go on to decode
    fn ensure_available(&self, path: &Path) -> Result<()>;
}

/// Remote source of items to load into the session
pub trait RemoteCatalog: Send {
    /// Returns the locator of a random item, `Error::Network` on failure
    fn fetch_random_locator(&self) -> Result<String>;

    /// Downloads the raw payload behind a locator
    fn fetch_payload(&self, locator: &str) -> Result<Vec<u8>>;
}

/// External viewer for a locator. Fire-and-forget.
pub trait Viewer: Send {
    fn open(&self, locator: &str);
}

/// Persistent storage for saved payloads
pub trait Storage: Send {
    /// Writes `bytes` under `filename` and returns where they ended up
    fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Encyclopedia-style lookup of a term
pub trait KnowledgeBase: Send {
    /// Returns at most `max_sentences` sentences of summary.
    /// `Error::NotFound` when there is no entry, `Error::Lookup` otherwise.
    fn summarize(&self, term: &str, max_sentences: usize) -> Result<String>;
}

/// Trait that all speech output engines implement.
/// Speaking is best-effort: failures are logged, never returned.
pub trait SpeechSynth: Send {
    /// Blocks until the text has been spoken
    fn speak(&self, text: &str);

    /// Returns the unique ID of the engine (e.g., "espeak-ng")
    fn id(&self) -> &'static str;
}

/// Blocking HTTP client shared by the remote collaborators
pub fn http_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}
