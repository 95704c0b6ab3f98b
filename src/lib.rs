pub mod ai;
pub mod app;
pub mod audio;
pub mod backend;
pub mod capture;
pub mod error;
pub mod game;
pub mod generator;
pub mod logging;
pub mod message;
pub mod microphone;
pub mod persona;
pub mod prompt;
pub mod settings;
pub mod tui;
pub mod turn;
pub mod ui;

// Re-export commonly used items for easier access
pub use ai::{OpenAiResponder, Responder};
pub use audio::{AudioClip, AudioPlayer, PlaybackEvent, Synthesizer};
pub use capture::{CaptureOutcome, CaptureState, Recognizer, RecognizerEvent, SpeechCapture};
pub use error::{AppError, CaptureError, PlaybackError, ResponderError, SynthesisError, TurnError};
pub use game::{GameSession, Outcome};
pub use generator::PersonaGenerator;
pub use message::{ConversationLog, FALLBACK_REPLY, Message, Role};
pub use persona::{Direction, FactTag, Persona, PersonaRegistry};
pub use prompt::{BehaviorSpec, FactPartition};
pub use settings::Settings;
pub use turn::{Signal, SignalQueue, Ticket, TurnController, TurnMachine, TurnState};
