use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::sync::mpsc::{channel, Sender};
use std::thread;

use crate::backends::espeak::EspeakBackend;
use crate::backends::SpeechSynth;

struct Playback {
    wav: Vec<u8>,
    done: Sender<()>,
}

/// Speech output through espeak-ng and the default audio device.
///
/// The rodio output stream must live on one thread, so playback happens on a
/// dedicated thread and `speak` waits for it to report completion.
pub struct AudioEngine {
    backend: EspeakBackend,
    tx: Sender<Playback>,
}

impl AudioEngine {
    pub fn new(backend: EspeakBackend) -> Self {
        let (tx, rx) = channel::<Playback>();

        thread::spawn(move || {
            // Audio stream must live on this thread
            let output = match OutputStream::try_default() {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output device, speech will be text only");
                    None
                }
            };

            while let Ok(job) = rx.recv() {
                if let Some((_stream, handle)) = &output {
                    match Sink::try_new(handle) {
                        Ok(sink) => match Decoder::new(Cursor::new(job.wav)) {
                            Ok(source) => {
                                sink.append(source.convert_samples::<f32>());
                                sink.sleep_until_end();
                            }
                            Err(e) => tracing::warn!(error = %e, "failed to decode speech"),
                        },
                        Err(e) => tracing::warn!(error = %e, "failed to create sink"),
                    }
                }
                let _ = job.done.send(());
            }
        });

        Self { backend, tx }
    }
}

impl SpeechSynth for AudioEngine {
    fn speak(&self, text: &str) {
        let wav = match self.backend.synthesize(text) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed");
                return;
            }
        };

        let (done, finished) = channel();
        if self.tx.send(Playback { wav, done }).is_err() {
            tracing::warn!("playback thread is gone");
            return;
        }
        let _ = finished.recv();
    }

    fn id(&self) -> &'static str {
        "espeak-ng"
    }
}

/// Speech output that only logs, used with `--mute` or `enable_audio = false`
pub struct SilentSynth;

impl SpeechSynth for SilentSynth {
    fn speak(&self, text: &str) {
        tracing::trace!(text, "speech muted");
    }

    fn id(&self) -> &'static str {
        "silent"
    }
}
