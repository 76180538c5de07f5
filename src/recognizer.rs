use std::fmt;

use crate::ear::AudioFrame;
use crate::Result;

/// One finalized, normalized phrase of recognized speech.
///
/// Never empty: blank recognizer output does not produce an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance(String);

impl Utterance {
    /// Normalizes raw recognizer text; returns `None` when nothing was said
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental speech decoder with endpoint detection.
///
/// Implementations keep all decoder context themselves; callers just keep
/// feeding frames.
pub trait Recognizer {
    /// Consumes one frame; yields an utterance once an endpoint is detected
    fn feed(&mut self, frame: &AudioFrame) -> Result<Option<Utterance>>;

    /// Finalizes whatever audio is pending, used when the input ends
    fn flush(&mut self) -> Option<Utterance> {
        None
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn feed(&mut self, frame: &AudioFrame) -> Result<Option<Utterance>> {
        (**self).feed(frame)
    }

    fn flush(&mut self) -> Option<Utterance> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_normalized() {
        let u = Utterance::new("  Load NEXT \n").unwrap();
        assert_eq!(u.as_str(), "load next");
    }

    #[test]
    fn test_blank_is_discarded() {
        assert!(Utterance::new("").is_none());
        assert!(Utterance::new(" \t ").is_none());
    }
}
