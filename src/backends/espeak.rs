use std::io::{Error, ErrorKind, Read, Result};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Renders text to WAV bytes with the espeak-ng command line tool
pub struct EspeakBackend {
    voice: String,
    rate: u32,
    timeout: Duration,
}

impl EspeakBackend {
    pub fn new(voice: impl Into<String>, rate: u32, timeout: Duration) -> Self {
        Self {
            voice: voice.into(),
            rate,
            timeout,
        }
    }

    fn command(&self, text: &str) -> Command {
        let mut cmd = Command::new("espeak-ng");
        cmd.arg("--stdout")
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg(text);
        cmd
    }

    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let mut child = self
            .command(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stdout concurrently so a long WAV cannot fill the pipe
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::new(ErrorKind::Other, "espeak-ng stdout unavailable"))?;
        let reader = thread::spawn(move || {
            let mut wav = Vec::new();
            stdout.read_to_end(&mut wav).map(|_| wav)
        });

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let wav = reader
                    .join()
                    .map_err(|_| Error::new(ErrorKind::Other, "espeak-ng reader panicked"))??;
                if status.success() {
                    Ok(wav)
                } else {
                    let output = child.wait_with_output()?;
                    let err_msg = String::from_utf8_lossy(&output.stderr);
                    Err(Error::new(
                        ErrorKind::Other,
                        format!("espeak error: {}", err_msg.trim()),
                    ))
                }
            }
            None => {
                // Timeout occurred, kill the process
                let _ = child.kill();
                let _ = child.wait();
                let _ = reader.join();
                Err(Error::new(
                    ErrorKind::TimedOut,
                    format!("espeak-ng timed out after {:?}", self.timeout),
                ))
            }
        }
    }
}
