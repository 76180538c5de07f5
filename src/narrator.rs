use crate::backends::SpeechSynth;

/// Announces responses on stdout and through the speech engine
pub struct Narrator {
    synth: Box<dyn SpeechSynth>,
}

impl Narrator {
    pub fn new(synth: Box<dyn SpeechSynth>) -> Self {
        tracing::debug!(engine = synth.id(), "narrator ready");
        Self { synth }
    }

    /// Prints and speaks `text`, returning once speech has finished
    pub fn announce(&self, text: &str) {
        println!("Assistant: {}", text);
        tracing::info!(text, "announce");
        self.synth.speak(text);
    }
}
