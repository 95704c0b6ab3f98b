use crate::error::{PlaybackError, SynthesisError};
use crate::turn::Ticket;
use async_openai::{
    Audio, Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use rodio::{Decoder, OutputStream, Sink};
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

// Encoded audio as returned by the synthesizer. Dropping it releases the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub trait Synthesizer: Send + Sync + 'static {
    fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> impl Future<Output = Result<AudioClip, SynthesisError>> + Send;
}

#[derive(Clone)]
pub struct OpenAiSynthesizer {
    client: Client<OpenAIConfig>,
    model: String,
    speed: f32,
}

impl OpenAiSynthesizer {
    pub fn new(api_key: &str, model: impl Into<String>, speed: f32) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
            speed,
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }
}

// Persona ids are voice names; anything unknown speaks with the default narrator voice.
pub fn voice_for(voice_id: &str) -> Voice {
    match voice_id.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "ash" => Voice::Ash,
        "ballad" => Voice::Ballad,
        "coral" => Voice::Coral,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "nova" => Voice::Nova,
        "onyx" => Voice::Onyx,
        "sage" => Voice::Sage,
        "shimmer" => Voice::Shimmer,
        _ => {
            log::warn!("Unknown voice id {:?}, using onyx", voice_id);
            Voice::Onyx
        }
    }
}

impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip, SynthesisError> {
        let audio = Audio::new(&self.client);
        let response = audio
            .speech(
                CreateSpeechRequestArgs::default()
                    .input(text)
                    .voice(voice_for(voice_id))
                    .model(self.speech_model())
                    .response_format(SpeechResponseFormat::Mp3)
                    .speed(self.speed)
                    .build()?,
            )
            .await?;

        if response.bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(AudioClip::new(response.bytes.to_vec()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Ended,
    Failed(PlaybackError),
}

pub type PlaybackSink = Arc<dyn Fn(Ticket, PlaybackEvent) + Send + Sync>;

/// The single audio output of the game.
///
/// `play` replaces whatever is playing. Progress is reported through the
/// sink handed to the implementation, tagged with the ticket of the clip.
pub trait AudioPlayer: Send {
    fn play(&mut self, ticket: Ticket, clip: AudioClip) -> Result<(), PlaybackError>;
    fn stop(&mut self);
}

enum PlayerCommand {
    Play(Ticket, AudioClip),
    Stop,
}

// rodio output streams are not Send, so the sink lives on its own thread.
pub struct RodioPlayer {
    commands: mpsc::Sender<PlayerCommand>,
}

impl RodioPlayer {
    pub fn spawn(events: PlaybackSink) -> Result<Self, PlaybackError> {
        let (command_tx, command_rx) = mpsc::channel::<PlayerCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        thread::Builder::new()
            .name("landfall-audio-out".to_string())
            .spawn(move || {
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Output(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut current: Option<(Ticket, Sink)> = None;
                loop {
                    match command_rx.recv_timeout(Duration::from_millis(50)) {
                        Ok(PlayerCommand::Play(ticket, clip)) => {
                            if let Some((_, sink)) = current.take() {
                                sink.stop();
                            }
                            let started = Sink::try_new(&stream_handle)
                                .map_err(|e| PlaybackError::Output(e.to_string()))
                                .and_then(|sink| {
                                    let source = Decoder::new(Cursor::new(clip.into_bytes()))
                                        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
                                    sink.append(source);
                                    Ok(sink)
                                });
                            match started {
                                Ok(sink) => {
                                    events(ticket, PlaybackEvent::Started);
                                    current = Some((ticket, sink));
                                }
                                Err(e) => events(ticket, PlaybackEvent::Failed(e)),
                            }
                        }
                        Ok(PlayerCommand::Stop) => {
                            if let Some((_, sink)) = current.take() {
                                sink.stop();
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    if current.as_ref().is_some_and(|(_, sink)| sink.empty()) {
                        if let Some((ticket, _)) = current.take() {
                            events(ticket, PlaybackEvent::Ended);
                        }
                    }
                }
                log::debug!("Audio output thread finished");
            })
            .map_err(|e| PlaybackError::Output(e.to_string()))?;

        ready_rx.recv().map_err(|_| PlaybackError::Closed)??;
        Ok(Self {
            commands: command_tx,
        })
    }
}

impl AudioPlayer for RodioPlayer {
    fn play(&mut self, ticket: Ticket, clip: AudioClip) -> Result<(), PlaybackError> {
        self.commands
            .send(PlayerCommand::Play(ticket, clip))
            .map_err(|_| PlaybackError::Closed)
    }

    fn stop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Stop);
    }
}
