//! Literal, ordered keyword matching from utterance text to a command.

use std::fmt;

/// Closed set of commands the assistant understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    FetchNext,
    Show,
    Save,
    DescribeBreed,
    DescribeBreedInfo,
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchNext => "fetch-next",
            Self::Show => "show",
            Self::Save => "save",
            Self::DescribeBreed => "describe-breed",
            Self::DescribeBreedInfo => "describe-breed-info",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Maps utterances to intents using an ordered trigger table.
///
/// The first trigger contained in the utterance wins, so an utterance that
/// mentions several commands always resolves to the one listed earliest.
#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    triggers: &'static [(&'static str, Intent)],
}

impl IntentClassifier {
    pub fn new(triggers: &'static [(&'static str, Intent)]) -> Self {
        Self { triggers }
    }

    pub fn classify(&self, utterance: &str) -> Intent {
        let text = utterance.trim().to_lowercase();
        if text.is_empty() {
            return Intent::Unknown;
        }

        self.triggers
            .iter()
            .find(|(phrase, _)| text.contains(phrase))
            .map(|(_, intent)| *intent)
            .unwrap_or(Intent::Unknown)
    }
}
