//! Executes intents against the session and the external collaborators.
//!
//! Every operation catches its own collaborator errors and turns them into a
//! narration; nothing here returns an error to the loop.

use std::path::PathBuf;

use crate::backends::{KnowledgeBase, RemoteCatalog, Storage, Viewer};
use crate::intent::Intent;
use crate::locale::Locale;
use crate::session::{derive_category, derive_filename, SessionState};
use crate::{Error, Result};

/// What a dispatched command did besides producing a narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Loaded,
    Opened,
    Saved(PathBuf),
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub narration: String,
    pub effect: Effect,
}

impl Dispatch {
    fn say(narration: impl Into<String>) -> Self {
        Self {
            narration: narration.into(),
            effect: Effect::None,
        }
    }

    fn with_effect(narration: impl Into<String>, effect: Effect) -> Self {
        Self {
            narration: narration.into(),
            effect,
        }
    }
}

pub struct CommandDispatcher {
    locale: Locale,
    catalog: Box<dyn RemoteCatalog>,
    viewer: Box<dyn Viewer>,
    storage: Box<dyn Storage>,
    knowledge: Box<dyn KnowledgeBase>,
    summary_sentences: usize,
}

impl CommandDispatcher {
    pub fn new(
        locale: Locale,
        catalog: Box<dyn RemoteCatalog>,
        viewer: Box<dyn Viewer>,
        storage: Box<dyn Storage>,
        knowledge: Box<dyn KnowledgeBase>,
    ) -> Self {
        Self {
            locale,
            catalog,
            viewer,
            storage,
            knowledge,
            summary_sentences: 2,
        }
    }

    pub fn with_summary_sentences(mut self, sentences: usize) -> Self {
        self.summary_sentences = sentences.max(1);
        self
    }

    pub fn dispatch(&self, intent: Intent, state: &mut SessionState) -> Dispatch {
        tracing::debug!(%intent, loaded = state.is_loaded(), "dispatching");
        match intent {
            Intent::FetchNext => self.fetch_next(state),
            Intent::Show => self.show(state),
            Intent::Save => self.save(state),
            Intent::DescribeBreed => self.describe_breed(state),
            Intent::DescribeBreedInfo => self.describe_breed_info(state),
            Intent::Unknown => Dispatch::say(self.locale.not_understood()),
        }
    }

    // Both requests must succeed before the session is touched.
    fn fetch_item(&self) -> Result<(String, Vec<u8>)> {
        let locator = self.catalog.fetch_random_locator()?;
        let payload = self.catalog.fetch_payload(&locator)?;
        Ok((locator, payload))
    }

    fn fetch_next(&self, state: &mut SessionState) -> Dispatch {
        match self.fetch_item() {
            Ok((locator, payload)) => {
                let size = payload.len();
                if state.load(locator, payload) {
                    tracing::info!(locator = state.locator().unwrap_or_default(), bytes = size, "item loaded");
                    Dispatch::with_effect(self.locale.loaded(), Effect::Loaded)
                } else {
                    tracing::warn!("catalog returned an empty locator or payload");
                    Dispatch::say(self.locale.fetch_failed())
                }
            }
            Err(Error::Rejected(reason)) => {
                tracing::warn!(%reason, "catalog refused the request");
                Dispatch::say(self.locale.fetch_failed())
            }
            Err(e) => {
                tracing::error!(error = %e, "fetch failed");
                Dispatch::say(self.locale.fetch_error())
            }
        }
    }

    fn show(&self, state: &SessionState) -> Dispatch {
        match state.locator() {
            Some(locator) => {
                self.viewer.open(locator);
                Dispatch::with_effect(self.locale.shown(), Effect::Opened)
            }
            None => Dispatch::say(self.locale.load_first_hint()),
        }
    }

    fn save(&self, state: &SessionState) -> Dispatch {
        let (Some(locator), Some(payload)) = (state.locator(), state.payload()) else {
            return Dispatch::say(self.locale.nothing_to_save());
        };

        let Some(filename) = derive_filename(locator) else {
            tracing::warn!(locator, "cannot derive a file name");
            return Dispatch::say(self.locale.save_failed());
        };

        match self.storage.write(&filename, payload) {
            Ok(path) => Dispatch::with_effect(self.locale.saved(&filename), Effect::Saved(path)),
            Err(e) => {
                tracing::error!(error = %e, %filename, "save failed");
                Dispatch::say(self.locale.save_failed())
            }
        }
    }

    fn describe_breed(&self, state: &SessionState) -> Dispatch {
        let Some(locator) = state.locator() else {
            return Dispatch::say(self.locale.load_first());
        };
        match derive_category(locator) {
            Some(breed) => Dispatch::say(self.locale.breed(breed)),
            None => Dispatch::say(self.locale.no_category()),
        }
    }

    fn describe_breed_info(&self, state: &SessionState) -> Dispatch {
        let Some(locator) = state.locator() else {
            return Dispatch::say(self.locale.load_first());
        };
        let Some(breed) = derive_category(locator) else {
            return Dispatch::say(self.locale.no_category());
        };

        match self.knowledge.summarize(breed, self.summary_sentences) {
            Ok(summary) => Dispatch::say(self.locale.breed_info(breed, &summary)),
            Err(Error::NotFound(_)) => {
                tracing::info!(breed, "no knowledge base entry");
                Dispatch::say(self.locale.breed_not_found(breed))
            }
            Err(e) => {
                tracing::error!(error = %e, breed, "knowledge lookup failed");
                Dispatch::say(self.locale.lookup_failed())
            }
        }
    }
}
