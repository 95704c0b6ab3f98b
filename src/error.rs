use crate::turn::TurnState;
use thiserror::Error;

// Enum for handling application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Settings error: {0:#}")]
    Settings(#[from] SettingsError), // Errors loading or saving the settings file.

    #[error("Persona registry error: {0:#}")]
    Registry(#[from] RegistryError),

    #[error("Persona generator error: {0:#}")]
    Generator(#[from] GeneratorError),

    #[error("IO error: {0:#}")]
    IO(#[from] std::io::Error),

    #[error("Logger error: {0:#}")]
    Logger(#[from] log::SetLoggerError),

    #[error("No home directory found")]
    NoHomeDir,

    #[error("OpenAI API key missing")]
    MissingApiKey,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file error: {0:#}")]
    IO(#[from] std::io::Error),

    #[error("Settings format error: {0:#}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("The persona catalog is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Cannot generate an empty persona set")]
    EmptySet,

    #[error("Gave up finding a unique planet name after {0} attempts")]
    NameSpaceExhausted(usize),
}

// Errors surfaced by the speech capture adapter. They end the current capture
// and never propagate past the turn controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Speech capture is not available on this system")]
    Unavailable,

    #[error("Audio input device error: {0}")]
    Device(String),

    #[error("Audio recording error: {0}")]
    Recording(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Speech capture ended unexpectedly")]
    Ended,
}

impl From<hound::Error> for CaptureError {
    fn from(error: hound::Error) -> Self {
        CaptureError::Recording(error.to_string())
    }
}

impl From<cpal::BuildStreamError> for CaptureError {
    fn from(error: cpal::BuildStreamError) -> Self {
        CaptureError::Device(error.to_string())
    }
}

impl From<cpal::PlayStreamError> for CaptureError {
    fn from(error: cpal::PlayStreamError) -> Self {
        CaptureError::Device(error.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for CaptureError {
    fn from(error: cpal::DefaultStreamConfigError) -> Self {
        CaptureError::Device(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
    #[error("AI API error: {0}")]
    Api(String),

    #[error("The AI returned an empty reply")]
    EmptyReply,

    #[error("Timeout occurred")]
    Timeout,
}

impl From<async_openai::error::OpenAIError> for ResponderError {
    fn from(error: async_openai::error::OpenAIError) -> Self {
        ResponderError::Api(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("Speech API error: {0}")]
    Api(String),

    #[error("The speech API returned no audio")]
    EmptyAudio,

    #[error("Timeout occurred")]
    Timeout,
}

impl From<async_openai::error::OpenAIError> for SynthesisError {
    fn from(error: async_openai::error::OpenAIError) -> Self {
        SynthesisError::Api(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("The audio thread has stopped")]
    Closed,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend request failed: {0:#}")]
    Request(#[from] reqwest::Error),

    #[error("Backend answered {0}")]
    Status(reqwest::StatusCode),
}

// Why the turn controller refused a request from the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("Not accepting input while {0}")]
    Busy(TurnState),

    #[error("Nothing to send")]
    Blank,

    #[error("No capture in progress")]
    NotCapturing,

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("This game is already over")]
    AlreadyLanded,
}
