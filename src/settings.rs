// Import necessary libraries and modules for file I/O and serialization.
use crate::error::{AppError, SettingsError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "landfall";

// Where the personas of a new game come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaSource {
    #[default]
    Generated,
    Classic,
}

// Define a structure to hold application settings with serialization and deserialization capabilities.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>, // Optional API key for OpenAI services.
    pub model: String,
    pub speech_model: String,
    pub transcription_model: String,
    pub speech_speed: f32,
    pub reply_timeout_secs: u64,
    pub audio_output_enabled: bool, // Flag to enable or disable audio output.
    pub audio_input_enabled: bool,  // Flag to enable or disable audio input.
    pub debug_mode: bool,           // Flag to enable or disable debug logging.
    pub persona_source: PersonaSource,
    pub persona_count: usize,
    pub seed: Option<u64>, // Fixed seed for reproducible persona sets.
    pub backend_url: Option<String>,
    pub player_email: Option<String>,
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            openai_api_key: None,
            model: "gpt-4o-mini".to_string(),
            speech_model: "tts-1".to_string(),
            transcription_model: "whisper-1".to_string(),
            speech_speed: 1.0,
            reply_timeout_secs: 60,
            audio_output_enabled: true,
            audio_input_enabled: true,
            debug_mode: false,
            persona_source: PersonaSource::Generated,
            persona_count: crate::generator::DEFAULT_COUNT,
            seed: None,
            backend_url: None,
            player_email: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    // ~/landfall/data
    pub fn data_dir() -> Result<PathBuf, AppError> {
        let home_dir = dir::home_dir().ok_or(AppError::NoHomeDir)?;
        Ok(home_dir.join(DATA_DIR).join("data"))
    }

    pub fn default_path() -> Result<PathBuf, AppError> {
        Ok(Self::data_dir()?.join("settings.json"))
    }

    // Load settings from the default path, falling back to defaults when the file is broken.
    pub fn load() -> Self {
        let settings = match Self::default_path() {
            Ok(path) => Self::load_or_create(&path).unwrap_or_else(|e| {
                log::info!("Using default settings ({:#})", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        settings.with_env_fallback()
    }

    /// Reads the settings file, writing the defaults there first when there is none.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            let settings = Self::default();
            settings.save_to_file(path)?;
            log::info!("Wrote default settings to {}", path.display());
            return Ok(settings);
        }
        Self::load_settings_from_file(path)
    }

    pub fn load_settings_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    // The settings file wins over the environment.
    pub fn with_env_fallback(mut self) -> Self {
        if self.openai_api_key.as_deref().is_none_or(str::is_empty) {
            self.openai_api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty());
        }
        self
    }

    pub fn api_key(&self) -> Result<&str, AppError> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingApiKey)
    }
}
