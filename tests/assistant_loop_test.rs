use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use voice_fetch::assistant::{Assistant, LoopState, StopSignal};
use voice_fetch::backends::{KnowledgeBase, RemoteCatalog, SpeechSynth, Storage, Viewer};
use voice_fetch::dispatcher::CommandDispatcher;
use voice_fetch::ear::{AudioFrame, AudioSource};
use voice_fetch::locale::Locale;
use voice_fetch::narrator::Narrator;
use voice_fetch::recognizer::{Recognizer, Utterance};
use voice_fetch::{Error, Result};

const EN: Locale = Locale::English;
const POODLE: &str = "https://images.dog.ceo/breeds/poodle/n02.jpg";

/// Source that yields a fixed number of silent frames
struct ScriptedSource {
    frames: usize,
    opened: bool,
    closes: Arc<Mutex<usize>>,
    fail_open: bool,
}

impl ScriptedSource {
    fn new(frames: usize) -> Self {
        Self {
            frames,
            opened: false,
            closes: Arc::new(Mutex::new(0)),
            fail_open: false,
        }
    }
}

impl AudioSource for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(Error::Audio("no input device found".into()));
        }
        self.opened = true;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        16000
    }

    fn read_frame(&mut self) -> Option<AudioFrame> {
        assert!(self.opened, "read before open");
        if self.frames == 0 {
            return None;
        }
        self.frames -= 1;
        Some(AudioFrame::new(vec![0; 160]))
    }

    fn close(&mut self) {
        *self.closes.lock().unwrap() += 1;
    }
}

/// Recognizer replaying one scripted result per fed frame
struct ScriptedRecognizer {
    script: VecDeque<Result<Option<Utterance>>>,
    pending: Option<Utterance>,
    on_feed: Option<(usize, StopSignal)>,
    fed: usize,
}

impl ScriptedRecognizer {
    fn new(script: Vec<Result<Option<&str>>>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|r| r.map(|text| text.and_then(Utterance::new)))
                .collect(),
            pending: None,
            on_feed: None,
            fed: 0,
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn feed(&mut self, _frame: &AudioFrame) -> Result<Option<Utterance>> {
        self.fed += 1;
        if let Some((at, stop)) = &self.on_feed {
            if self.fed == *at {
                stop.raise();
            }
        }
        self.script.pop_front().unwrap_or(Ok(None))
    }

    fn flush(&mut self) -> Option<Utterance> {
        self.pending.take()
    }
}

#[derive(Clone, Default)]
struct RecordingSynth {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl SpeechSynth for RecordingSynth {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn id(&self) -> &'static str {
        "recording"
    }
}

struct FixedCatalog;

impl RemoteCatalog for FixedCatalog {
    fn fetch_random_locator(&self) -> Result<String> {
        Ok(POODLE.to_string())
    }

    fn fetch_payload(&self, _locator: &str) -> Result<Vec<u8>> {
        Ok(b"\xFF\xD8".to_vec())
    }
}

struct NullViewer;

impl Viewer for NullViewer {
    fn open(&self, _locator: &str) {}
}

struct NullStorage;

impl Storage for NullStorage {
    fn write(&self, filename: &str, _bytes: &[u8]) -> Result<PathBuf> {
        Ok(PathBuf::from(filename))
    }
}

struct EmptyKnowledge;

impl KnowledgeBase for EmptyKnowledge {
    fn summarize(&self, term: &str, _max_sentences: usize) -> Result<String> {
        Err(Error::NotFound(term.to_string()))
    }
}

fn assistant(
    source: ScriptedSource,
    recognizer: ScriptedRecognizer,
    stop: StopSignal,
) -> (Assistant<ScriptedSource, ScriptedRecognizer>, RecordingSynth) {
    let synth = RecordingSynth::default();
    let dispatcher = CommandDispatcher::new(
        EN,
        Box::new(FixedCatalog),
        Box::new(NullViewer),
        Box::new(NullStorage),
        Box::new(EmptyKnowledge),
    );
    let narrator = Narrator::new(Box::new(synth.clone()));
    (
        Assistant::new(source, recognizer, dispatcher, narrator, EN, stop),
        synth,
    )
}

fn spoken(synth: &RecordingSynth) -> Vec<String> {
    synth.spoken.lock().unwrap().clone()
}

#[test]
fn test_full_session_until_input_ends() {
    let recognizer = ScriptedRecognizer::new(vec![
        Ok(None),
        Ok(Some("Load Next")),
        Ok(None),
        Ok(Some("name breed")),
        Ok(Some("tell about breed")),
        Ok(Some("gibberish")),
    ]);
    let source = ScriptedSource::new(8);
    let closes = source.closes.clone();
    let (mut assistant, synth) = assistant(source, recognizer, StopSignal::new());

    assistant.run().unwrap();

    assert_eq!(
        spoken(&synth),
        vec![
            EN.greeting().to_string(),
            EN.loaded().to_string(),
            EN.breed("poodle"),
            EN.breed_not_found("poodle"),
            EN.not_understood().to_string(),
            EN.farewell().to_string(),
        ]
    );
    assert_eq!(assistant.state(), LoopState::Stopped);
    assert_eq!(assistant.session().locator(), Some(POODLE));
    assert_eq!(*closes.lock().unwrap(), 1);
}

#[test]
fn test_blank_results_are_not_dispatched() {
    let recognizer = ScriptedRecognizer::new(vec![Ok(Some("   ")), Ok(Some("")), Ok(None)]);
    let (mut assistant, synth) = assistant(ScriptedSource::new(3), recognizer, StopSignal::new());

    assistant.run().unwrap();

    assert_eq!(
        spoken(&synth),
        vec![EN.greeting().to_string(), EN.farewell().to_string()]
    );
}

#[test]
fn test_recognition_error_is_narrated_and_loop_continues() {
    let recognizer = ScriptedRecognizer::new(vec![
        Err(Error::Recognition("decoding failed".into())),
        Ok(Some("show")),
    ]);
    let (mut assistant, synth) = assistant(ScriptedSource::new(2), recognizer, StopSignal::new());

    assistant.run().unwrap();

    assert_eq!(
        spoken(&synth),
        vec![
            EN.greeting().to_string(),
            EN.not_heard().to_string(),
            EN.load_first_hint().to_string(),
            EN.farewell().to_string(),
        ]
    );
}

#[test]
fn test_stop_signal_ends_loop_at_frame_boundary() {
    let stop = StopSignal::new();
    let mut recognizer = ScriptedRecognizer::new(vec![Ok(None), Ok(None), Ok(Some("load next"))]);
    recognizer.on_feed = Some((2, stop.clone()));

    let source = ScriptedSource::new(100);
    let closes = source.closes.clone();
    let (mut assistant, synth) = assistant(source, recognizer, stop);

    assistant.run().unwrap();

    // Stopped before the third frame, so "load next" was never heard
    assert_eq!(
        spoken(&synth),
        vec![EN.greeting().to_string(), EN.farewell().to_string()]
    );
    assert!(!assistant.session().is_loaded());
    assert_eq!(assistant.state(), LoopState::Stopped);
    assert_eq!(*closes.lock().unwrap(), 1);
}

#[test]
fn test_stop_during_command_finishes_the_cycle() {
    let stop = StopSignal::new();
    let mut recognizer = ScriptedRecognizer::new(vec![Ok(Some("load next")), Ok(Some("save"))]);
    recognizer.on_feed = Some((1, stop.clone()));

    let (mut assistant, synth) = assistant(ScriptedSource::new(100), recognizer, stop);
    assistant.run().unwrap();

    assert_eq!(
        spoken(&synth),
        vec![
            EN.greeting().to_string(),
            EN.loaded().to_string(),
            EN.farewell().to_string(),
        ]
    );
    assert!(assistant.session().is_loaded());
}

#[test]
fn test_flushed_utterance_runs_before_stopping() {
    let mut recognizer = ScriptedRecognizer::new(vec![Ok(None)]);
    recognizer.pending = Utterance::new("load next");

    let (mut assistant, synth) = assistant(ScriptedSource::new(1), recognizer, StopSignal::new());
    assistant.run().unwrap();

    assert_eq!(
        spoken(&synth),
        vec![
            EN.greeting().to_string(),
            EN.loaded().to_string(),
            EN.farewell().to_string(),
        ]
    );
}

#[test]
fn test_open_failure_is_fatal() {
    let mut source = ScriptedSource::new(1);
    source.fail_open = true;
    let (mut assistant, synth) = assistant(source, ScriptedRecognizer::new(vec![]), StopSignal::new());

    assert!(matches!(assistant.run(), Err(Error::Audio(_))));
    assert!(spoken(&synth).is_empty());
    assert_eq!(assistant.state(), LoopState::Idle);
}
