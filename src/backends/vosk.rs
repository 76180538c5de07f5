//! Offline speech recognition with vosk, plus model download.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ::vosk::{CompleteResult, DecodingState, Model};

use super::ModelProvisioner;
use crate::ear::AudioFrame;
use crate::recognizer::{Recognizer, Utterance};
use crate::{Error, Result};

/// Streaming recognizer over a vosk model directory
pub struct VoskRecognizer {
    // Kept alive for the recognizer's lifetime
    _model: Model,
    recognizer: ::vosk::Recognizer,
}

impl VoskRecognizer {
    pub fn new(model_path: &Path, sample_rate: u32) -> Result<Self> {
        tracing::info!(path = %model_path.display(), sample_rate, "loading vosk model");
        let model = Model::new(model_path.to_string_lossy()).ok_or_else(|| {
            Error::Recognition(format!(
                "failed to load vosk model from {}",
                model_path.display()
            ))
        })?;
        let recognizer = ::vosk::Recognizer::new(&model, sample_rate as f32)
            .ok_or_else(|| Error::Recognition("failed to create vosk recognizer".to_string()))?;

        Ok(Self {
            _model: model,
            recognizer,
        })
    }
}

fn utterance_of(result: CompleteResult<'_>) -> Option<Utterance> {
    result.single().and_then(|r| Utterance::new(r.text))
}

impl Recognizer for VoskRecognizer {
    fn feed(&mut self, frame: &AudioFrame) -> Result<Option<Utterance>> {
        let state = self
            .recognizer
            .accept_waveform(frame.samples())
            .map_err(|e| Error::Recognition(format!("{:?}", e)))?;

        match state {
            DecodingState::Finalized => {
                let utterance = utterance_of(self.recognizer.result());
                if utterance.is_none() {
                    tracing::trace!("endpoint with empty result");
                }
                Ok(utterance)
            }
            DecodingState::Running => Ok(None),
            DecodingState::Failed => Err(Error::Recognition("decoding failed".to_string())),
        }
    }

    fn flush(&mut self) -> Option<Utterance> {
        utterance_of(self.recognizer.final_result())
    }
}

/// Downloads a zipped vosk model and unpacks it next to the target path
pub struct VoskModelProvisioner {
    url: String,
    client: reqwest::blocking::Client,
}

impl VoskModelProvisioner {
    pub fn new(url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn download(&self, archive: &Path) -> Result<()> {
        let mut resp = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Provisioning(format!("download of {} failed: {}", self.url, e)))?;

        let mut file = fs::File::create(archive)
            .map_err(|e| Error::Provisioning(format!("cannot create {}: {}", archive.display(), e)))?;
        let bytes = std::io::copy(&mut resp, &mut file)
            .map_err(|e| Error::Provisioning(format!("download interrupted: {}", e)))?;

        tracing::info!(bytes, archive = %archive.display(), "model archive downloaded");
        Ok(())
    }

    fn unpack(&self, archive: &Path, dest: &Path) -> Result<()> {
        let out = Command::new("unzip")
            .arg("-q")
            .arg("-o")
            .arg(archive)
            .arg("-d")
            .arg(dest)
            .output()
            .map_err(|e| Error::Provisioning(format!("failed to run unzip: {}", e)))?;

        if out.status.success() {
            Ok(())
        } else {
            Err(Error::Provisioning(format!(
                "unzip error: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )))
        }
    }
}

impl ModelProvisioner for VoskModelProvisioner {
    fn ensure_available(&self, path: &Path) -> Result<()> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "speech model present");
            return Ok(());
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| Error::Provisioning(format!("cannot create {}: {}", parent.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let archive = parent.join(format!("{}.zip", name));

        tracing::info!(url = %self.url, "downloading speech model");
        let result = self
            .download(&archive)
            .and_then(|_| self.unpack(&archive, &parent));
        let _ = fs::remove_file(&archive);
        result?;

        if !path.exists() {
            return Err(Error::Provisioning(format!(
                "archive from {} did not contain {}",
                self.url,
                path.display()
            )));
        }
        tracing::info!(path = %path.display(), "speech model ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::new()
    }

    #[test]
    fn test_existing_model_skips_download() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("vosk-model");
        fs::create_dir(&model).unwrap();

        // Unroutable URL: any request would fail
        let provisioner = VoskModelProvisioner::new("http://127.0.0.1:9/model.zip", client());
        assert!(provisioner.ensure_available(&model).is_ok());
    }

    #[test]
    fn test_failed_download_is_provisioning_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/model.zip")
            .with_status(404)
            .create();

        let dir = tempdir().unwrap();
        let model = dir.path().join("vosk-model");
        let provisioner =
            VoskModelProvisioner::new(format!("{}/model.zip", server.url()), client());

        let err = provisioner.ensure_available(&model).unwrap_err();
        assert!(matches!(err, Error::Provisioning(_)));
        assert!(!dir.path().join("vosk-model.zip").exists());
        mock.assert();
    }

    #[test]
    fn test_garbage_archive_is_provisioning_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/model.zip")
            .with_status(200)
            .with_body("definitely not a zip")
            .create();

        let dir = tempdir().unwrap();
        let model = dir.path().join("vosk-model");
        let provisioner =
            VoskModelProvisioner::new(format!("{}/model.zip", server.url()), client());

        assert!(matches!(
            provisioner.ensure_available(&model),
            Err(Error::Provisioning(_))
        ));
        assert!(!model.exists());
    }
}
