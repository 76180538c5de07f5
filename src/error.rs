//! Error types for the voice assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the assistant and its collaborators.
///
/// Only `Provisioning`, `Config` and `Audio` (device open) are fatal; every
/// other kind is turned into a narration by the dispatcher or the loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Speech model could not be downloaded or unpacked
    #[error("provisioning error: {0}")]
    Provisioning(String),

    /// Remote request failed in transport or returned an unreadable body
    #[error("network error: {0}")]
    Network(String),

    /// Remote service answered, but refused or reported failure
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Local storage failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge base has no entry for the term
    #[error("not found: {0}")]
    NotFound(String),

    /// Knowledge base lookup failed for another reason
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech recognizer error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "io error: denied");
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = config::ConfigError::Message("bad".into()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
