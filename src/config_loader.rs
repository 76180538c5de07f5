use config::{Config, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::locale::Locale;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub language: String, // "en" or "ru"
    // Speech model (defaults follow the language)
    pub model_path: Option<String>,
    pub model_url: Option<String>,
    // Audio capture
    pub sample_rate: u32,
    pub frame_samples: usize,
    // Remote collaborators
    pub catalog_url: String,
    pub wikipedia_language: Option<String>,
    pub wikipedia_url: Option<String>, // Base URL override, e.g. a mirror
    pub summary_sentences: usize,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    // Storage
    pub save_dir: String,
    // Speech output
    pub enable_audio: bool,
    pub speech_rate: u32, // espeak-ng words per minute
    pub espeak_voice: Option<String>,
    pub tts_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            model_path: None,
            model_url: None,
            sample_rate: 16000,
            frame_samples: 4096,
            catalog_url: "https://dog.ceo/api/breeds/image/random".to_string(),
            wikipedia_language: None,
            wikipedia_url: None,
            summary_sentences: 2,
            user_agent: default_user_agent(),
            http_timeout_secs: 30,
            save_dir: ".".to_string(),
            enable_audio: true,
            speech_rate: 150,
            espeak_voice: None,
            tts_timeout_secs: 10,
        }
    }
}

fn default_user_agent() -> String {
    format!("voice-fetch/{}", env!("CARGO_PKG_VERSION"))
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = Config::builder()
            .set_default("language", defaults.language)?
            // Audio defaults
            .set_default("sample_rate", defaults.sample_rate as i64)?
            .set_default("frame_samples", defaults.frame_samples as i64)?
            // Collaborator defaults
            .set_default("catalog_url", defaults.catalog_url)?
            .set_default("summary_sentences", defaults.summary_sentences as i64)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("http_timeout_secs", defaults.http_timeout_secs as i64)?
            .set_default("save_dir", defaults.save_dir)?
            // Speech output defaults
            .set_default("enable_audio", defaults.enable_audio)?
            .set_default("speech_rate", defaults.speech_rate as i64)?
            .set_default("tts_timeout_secs", defaults.tts_timeout_secs as i64)?
            // Merge with local config file (if exists)
            .add_source(File::with_name("Assistant").required(false))
            .add_source(
                File::with_name(
                    &dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("voice-fetch/Assistant")
                        .to_string_lossy(),
                )
                .required(false),
            )
            // Merge with environment variables (e.g. ASSISTANT_LANGUAGE)
            .add_source(config::Environment::with_prefix("ASSISTANT"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if Locale::from_code(&self.language).is_none() {
            return Err(config::ConfigError::Message(format!(
                "Unsupported language: {}. Expected 'en' or 'ru'",
                self.language
            )));
        }
        if self.summary_sentences == 0 {
            return Err(config::ConfigError::Message(
                "summary_sentences must be greater than 0".to_string(),
            ));
        }
        if self.sample_rate == 0 || self.frame_samples == 0 {
            return Err(config::ConfigError::Message(
                "sample_rate and frame_samples must be positive".to_string(),
            ));
        }
        if self.catalog_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "catalog_url must not be empty".to_string(),
            ));
        }
        if !(80..=500).contains(&self.speech_rate) {
            return Err(config::ConfigError::Message(format!(
                "Invalid speech_rate: {}. Must be between 80 and 500",
                self.speech_rate
            )));
        }
        Ok(())
    }

    pub fn locale(&self) -> Locale {
        Locale::from_code(&self.language).unwrap_or(Locale::English)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(self.locale().default_model()))
    }

    pub fn model_url(&self) -> String {
        self.model_url
            .clone()
            .unwrap_or_else(|| self.locale().default_model_url())
    }

    pub fn wikipedia_base_url(&self) -> String {
        if let Some(url) = &self.wikipedia_url {
            return url.trim_end_matches('/').to_string();
        }
        let lang = self
            .wikipedia_language
            .clone()
            .unwrap_or_else(|| self.locale().code().to_string());
        format!("https://{}.wikipedia.org", lang)
    }

    pub fn espeak_voice(&self) -> String {
        self.espeak_voice
            .clone()
            .unwrap_or_else(|| self.locale().espeak_voice().to_string())
    }
}
