//! The listen → classify → dispatch → announce cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dispatcher::CommandDispatcher;
use crate::ear::AudioSource;
use crate::intent::IntentClassifier;
use crate::locale::Locale;
use crate::narrator::Narrator;
use crate::recognizer::{Recognizer, Utterance};
use crate::session::SessionState;
use crate::{Error, Result};

/// Cooperative cancellation flag shared between the signal handler and the
/// loop. The loop only looks at it between frames and between commands.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Listening,
    Classifying,
    Dispatching,
    Announcing,
    Stopped,
}

enum Heard {
    Utterance(Utterance),
    Failed(Error),
    EndOfInput,
    Stopped,
}

pub struct Assistant<S: AudioSource, R: Recognizer> {
    source: S,
    recognizer: R,
    classifier: IntentClassifier,
    dispatcher: CommandDispatcher,
    narrator: Narrator,
    locale: Locale,
    session: SessionState,
    stop: StopSignal,
    state: LoopState,
}

impl<S: AudioSource, R: Recognizer> Assistant<S, R> {
    pub fn new(
        source: S,
        recognizer: R,
        dispatcher: CommandDispatcher,
        narrator: Narrator,
        locale: Locale,
        stop: StopSignal,
    ) -> Self {
        Self {
            source,
            recognizer,
            classifier: IntentClassifier::new(locale.triggers()),
            dispatcher,
            narrator,
            locale,
            session: SessionState::new(),
            stop,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    fn transition(&mut self, next: LoopState) {
        tracing::trace!(from = ?self.state, to = ?next, "loop transition");
        self.state = next;
    }

    /// Runs until the stop signal is raised or the audio input ends.
    ///
    /// Only a failure to open the audio source is returned as an error.
    pub fn run(&mut self) -> Result<()> {
        self.source.open()?;

        self.narrator.announce(self.locale.greeting());
        loop {
            self.transition(LoopState::Listening);
            match self.listen() {
                Heard::Utterance(utterance) => self.handle(&utterance),
                Heard::Failed(e) => {
                    tracing::warn!(error = %e, "recognition failed");
                    self.narrator.announce(self.locale.not_heard());
                }
                Heard::EndOfInput => {
                    tracing::info!("audio input ended");
                    if let Some(utterance) = self.recognizer.flush() {
                        self.handle(&utterance);
                    }
                    break;
                }
                Heard::Stopped => break,
            }
        }

        self.shutdown();
        Ok(())
    }

    fn listen(&mut self) -> Heard {
        loop {
            if self.stop.is_raised() {
                return Heard::Stopped;
            }
            let Some(frame) = self.source.read_frame() else {
                return if self.stop.is_raised() {
                    Heard::Stopped
                } else {
                    Heard::EndOfInput
                };
            };
            match self.recognizer.feed(&frame) {
                Ok(Some(utterance)) => return Heard::Utterance(utterance),
                Ok(None) => continue,
                Err(e) => return Heard::Failed(e),
            }
        }
    }

    fn handle(&mut self, utterance: &Utterance) {
        println!("You said: {}", utterance);

        self.transition(LoopState::Classifying);
        let intent = self.classifier.classify(utterance.as_str());
        tracing::info!(%utterance, %intent, "command recognized");

        self.transition(LoopState::Dispatching);
        let outcome = self.dispatcher.dispatch(intent, &mut self.session);
        tracing::debug!(effect = ?outcome.effect, "command finished");

        self.transition(LoopState::Announcing);
        self.narrator.announce(&outcome.narration);
    }

    fn shutdown(&mut self) {
        self.narrator.announce(self.locale.farewell());
        self.source.close();
        self.transition(LoopState::Stopped);
    }
}
