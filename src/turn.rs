//! Conversation turn controller.
//!
//! [`TurnMachine`] is the pure part: it takes one [`TurnEvent`] at a time and
//! answers with the [`Effect`]s to run. [`TurnController`] owns the machine
//! together with the collaborators and runs those effects. Everything that
//! happens asynchronously (AI replies, synthesized audio, recognizer and
//! playback notifications) comes back as a [`Signal`] on a single queue that
//! the owner drains with [`TurnController::next_signal`].

use crate::ai::Responder;
use crate::audio::{AudioClip, AudioPlayer, PlaybackEvent, PlaybackSink, Synthesizer};
use crate::backend::StatsClient;
use crate::capture::{CaptureOutcome, CaptureState, RecognizerEvent, RecognizerSink, SpeechCapture};
use crate::error::{CaptureError, PlaybackError, ResponderError, SynthesisError, TurnError};
use crate::message::{ConversationLog, FALLBACK_REPLY, Message};
use crate::persona::{Direction, Persona, PersonaRegistry};
use crate::prompt::{self, BehaviorSpec};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const USER_SPEAKER: &str = "user";
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(60);

/// Identifies one user turn. `epoch` is the persona epoch at the time the
/// turn was issued; it goes stale as soon as the player switches persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub turn: u64,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TurnState {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "listening")]
    Capturing,
    #[strum(serialize = "waiting for a reply")]
    AwaitingReply,
    #[strum(serialize = "speaking")]
    Speaking,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    CaptureRequested,
    CaptureStopRequested,
    CaptureFinished(String),
    CaptureFailed(CaptureError),
    TextSubmitted(String),
    ReplyReceived {
        ticket: Ticket,
        result: Result<String, ResponderError>,
    },
    SpeechReady {
        ticket: Ticket,
        result: Result<AudioClip, SynthesisError>,
    },
    PlaybackStarted(Ticket),
    PlaybackEnded(Ticket),
    PlaybackFailed(Ticket, PlaybackError),
    PersonaSwitched,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCapture,
    StopCapture,
    AbortCapture,
    Record {
        message: Message,
        speaker: String,
    },
    RequestReply {
        ticket: Ticket,
        spec: BehaviorSpec,
        message: String,
    },
    RequestSpeech {
        ticket: Ticket,
        text: String,
        voice_id: String,
    },
    StartPlayback {
        ticket: Ticket,
        clip: AudioClip,
    },
    StopPlayback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reply,
    Speech,
    Playback,
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    phase: Phase,
    voice_id: String,
    speaker: String, // Display name of the persona the turn was addressed to.
}

#[derive(Debug, Clone)]
pub struct TurnMachine {
    state: TurnState,
    epoch: u64,
    turns: u64,
    last_transcript: Option<String>,
    in_flight: Option<InFlight>,
    speak: bool, // Replies are synthesized and played only when set.
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TurnMachine {
    pub fn new(speak: bool) -> Self {
        Self {
            state: TurnState::Idle,
            epoch: 0,
            turns: 0,
            last_transcript: None,
            in_flight: None,
            speak,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|turn| turn.ticket)
    }

    pub fn last_transcript(&self) -> Option<&str> {
        self.last_transcript.as_deref()
    }

    pub fn accepts_input(&self) -> bool {
        self.state == TurnState::Idle
    }

    pub fn step(&mut self, event: TurnEvent, persona: &Persona) -> Vec<Effect> {
        match event {
            TurnEvent::CaptureRequested => {
                if self.state != TurnState::Idle {
                    log::debug!("Capture rejected while {}", self.state);
                    return Vec::new();
                }
                self.state = TurnState::Capturing;
                vec![Effect::StartCapture]
            }
            TurnEvent::CaptureStopRequested => {
                if self.state == TurnState::Capturing {
                    vec![Effect::StopCapture]
                } else {
                    Vec::new()
                }
            }
            TurnEvent::CaptureFinished(transcript) => {
                if self.state != TurnState::Capturing {
                    return Vec::new();
                }
                let transcript = transcript.trim();
                if transcript.is_empty() {
                    log::debug!("Capture finished without speech");
                    self.state = TurnState::Idle;
                    return Vec::new();
                }
                if self.last_transcript.as_deref() == Some(transcript) {
                    log::debug!("Ignoring repeated transcript: {}", transcript);
                    self.state = TurnState::Idle;
                    return Vec::new();
                }
                self.last_transcript = Some(transcript.to_string());
                self.begin_turn(transcript, persona)
            }
            TurnEvent::CaptureFailed(error) => {
                if self.state == TurnState::Capturing {
                    log::warn!("Capture failed: {}", error);
                    self.state = TurnState::Idle;
                }
                Vec::new()
            }
            TurnEvent::TextSubmitted(text) => {
                let text = text.trim();
                if self.state != TurnState::Idle || text.is_empty() {
                    return Vec::new();
                }
                self.begin_turn(text, persona)
            }
            TurnEvent::ReplyReceived { ticket, result } => {
                let Some(turn) = self.take_matching(ticket, Phase::Reply) else {
                    log::debug!("Dropping reply for unknown turn {:?}", ticket);
                    return Vec::new();
                };
                match result {
                    Ok(reply) => {
                        let mut effects = vec![Effect::Record {
                            message: Message::assistant(reply.clone()),
                            speaker: turn.speaker.clone(),
                        }];
                        if ticket.epoch != self.epoch {
                            log::info!("Reply for turn {} arrived after a persona switch", ticket.turn);
                            self.state = TurnState::Idle;
                        } else if !self.speak {
                            self.state = TurnState::Idle;
                        } else {
                            effects.push(Effect::RequestSpeech {
                                ticket,
                                text: reply,
                                voice_id: turn.voice_id.clone(),
                            });
                            self.in_flight = Some(InFlight {
                                phase: Phase::Speech,
                                ..turn
                            });
                        }
                        effects
                    }
                    Err(error) => {
                        log::error!("AI reply failed: {}", error);
                        self.state = TurnState::Idle;
                        vec![Effect::Record {
                            message: Message::assistant(FALLBACK_REPLY),
                            speaker: turn.speaker,
                        }]
                    }
                }
            }
            TurnEvent::SpeechReady { ticket, result } => {
                let Some(turn) = self.take_matching(ticket, Phase::Speech) else {
                    return Vec::new();
                };
                if ticket.epoch != self.epoch {
                    self.state = TurnState::Idle;
                    return Vec::new();
                }
                match result {
                    Ok(clip) => {
                        self.in_flight = Some(InFlight {
                            phase: Phase::Playback,
                            ..turn
                        });
                        vec![Effect::StartPlayback { ticket, clip }]
                    }
                    Err(error) => {
                        log::error!("Speech synthesis failed: {}", error);
                        self.state = TurnState::Idle;
                        Vec::new()
                    }
                }
            }
            TurnEvent::PlaybackStarted(ticket) => {
                if !self.matches(ticket, Phase::Playback) {
                    return Vec::new();
                }
                if ticket.epoch != self.epoch {
                    self.finish_turn();
                    return vec![Effect::StopPlayback];
                }
                self.state = TurnState::Speaking;
                Vec::new()
            }
            TurnEvent::PlaybackEnded(ticket) => {
                if self.matches(ticket, Phase::Playback) {
                    self.finish_turn();
                }
                Vec::new()
            }
            TurnEvent::PlaybackFailed(ticket, error) => {
                if self.matches(ticket, Phase::Playback) {
                    log::error!("Playback failed: {}", error);
                    self.finish_turn();
                }
                Vec::new()
            }
            TurnEvent::PersonaSwitched => {
                self.epoch += 1;
                let playing = self
                    .in_flight
                    .as_ref()
                    .is_some_and(|turn| turn.phase == Phase::Playback);
                if playing {
                    self.finish_turn();
                    vec![Effect::StopPlayback]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Drops the turn in flight and any capture, for a new game. Counters keep
    /// running so late signals from the old game can never match a new ticket.
    pub fn reset(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.state == TurnState::Capturing {
            effects.push(Effect::AbortCapture);
        }
        if self.in_flight.is_some() {
            effects.push(Effect::StopPlayback);
        }
        self.epoch += 1;
        self.last_transcript = None;
        self.finish_turn();
        effects
    }

    fn begin_turn(&mut self, text: &str, persona: &Persona) -> Vec<Effect> {
        self.turns += 1;
        let ticket = Ticket {
            turn: self.turns,
            epoch: self.epoch,
        };
        self.in_flight = Some(InFlight {
            ticket,
            phase: Phase::Reply,
            voice_id: persona.id.clone(),
            speaker: persona.display_name.clone(),
        });
        self.state = TurnState::AwaitingReply;

        vec![
            Effect::Record {
                message: Message::user(text),
                speaker: USER_SPEAKER.to_string(),
            },
            Effect::RequestReply {
                ticket,
                spec: prompt::build(persona),
                message: text.to_string(),
            },
        ]
    }

    fn matches(&self, ticket: Ticket, phase: Phase) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|turn| turn.ticket == ticket && turn.phase == phase)
    }

    fn take_matching(&mut self, ticket: Ticket, phase: Phase) -> Option<InFlight> {
        if self.matches(ticket, phase) {
            self.in_flight.take()
        } else {
            None
        }
    }

    fn finish_turn(&mut self) {
        self.in_flight = None;
        self.state = TurnState::Idle;
    }
}

/// Everything that reaches the controller from outside its own call stack.
#[derive(Debug)]
pub enum Signal {
    Recognizer(RecognizerEvent),
    Reply {
        ticket: Ticket,
        result: Result<String, ResponderError>,
    },
    Speech {
        ticket: Ticket,
        result: Result<AudioClip, SynthesisError>,
    },
    Playback {
        ticket: Ticket,
        event: PlaybackEvent,
    },
}

// Single-consumer queue shared by the recognizer, the player and spawned tasks.
pub struct SignalQueue {
    tx: UnboundedSender<Signal>,
    rx: UnboundedReceiver<Signal>,
}

impl Default for SignalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> UnboundedSender<Signal> {
        self.tx.clone()
    }

    pub fn recognizer_sink(&self) -> RecognizerSink {
        let tx = self.tx.clone();
        Arc::new(move |event| {
            let _ = tx.send(Signal::Recognizer(event));
        })
    }

    pub fn playback_sink(&self) -> PlaybackSink {
        let tx = self.tx.clone();
        Arc::new(move |ticket, event| {
            let _ = tx.send(Signal::Playback { ticket, event });
        })
    }
}

pub struct TurnController<R: Responder, S: Synthesizer, P: AudioPlayer> {
    machine: TurnMachine,
    log: ConversationLog,
    registry: PersonaRegistry,
    current: usize,
    capture: SpeechCapture,
    responder: Arc<R>,
    synthesizer: Arc<S>,
    player: Option<P>,
    stats: Option<StatsClient>,
    reply_timeout: Duration,
    signals: SignalQueue,
}

impl<R: Responder, S: Synthesizer, P: AudioPlayer> TurnController<R, S, P> {
    /// `capture` and `player` must report through sinks taken from `signals`.
    /// Without a player, replies are shown but never spoken.
    pub fn new(
        registry: PersonaRegistry,
        capture: SpeechCapture,
        responder: R,
        synthesizer: S,
        player: Option<P>,
        signals: SignalQueue,
    ) -> Self {
        Self {
            machine: TurnMachine::new(player.is_some()),
            log: ConversationLog::new(),
            registry,
            current: 0,
            capture,
            responder: Arc::new(responder),
            synthesizer: Arc::new(synthesizer),
            player,
            stats: None,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            signals,
        }
    }

    pub fn with_stats(mut self, stats: Option<StatsClient>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn state(&self) -> TurnState {
        self.machine.state()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_persona(&self) -> &Persona {
        self.registry.at(self.current)
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn is_voice_available(&self) -> bool {
        self.capture.is_available()
    }

    pub fn is_speaking_enabled(&self) -> bool {
        self.player.is_some()
    }

    pub fn begin_capture(&mut self) -> Result<(), TurnError> {
        if !self.capture.is_available() {
            return Err(CaptureError::Unavailable.into());
        }
        self.ensure_idle()?;
        self.apply(TurnEvent::CaptureRequested)
    }

    pub fn end_capture(&mut self) -> Result<(), TurnError> {
        if self.machine.state() != TurnState::Capturing {
            return Err(TurnError::NotCapturing);
        }
        self.apply(TurnEvent::CaptureStopRequested)
    }

    pub fn submit_text(&mut self, text: &str) -> Result<(), TurnError> {
        self.ensure_idle()?;
        if text.trim().is_empty() {
            return Err(TurnError::Blank);
        }
        self.apply(TurnEvent::TextSubmitted(text.to_string()))
    }

    // Allowed in every state.
    pub fn switch_persona(&mut self, direction: Direction) -> &Persona {
        self.current = self.registry.step(self.current, direction);
        log::debug!("Switched to {}", self.registry.at(self.current).display_name);
        if let Err(e) = self.apply(TurnEvent::PersonaSwitched) {
            log::warn!("Persona switch: {}", e);
        }
        self.registry.at(self.current)
    }

    /// Replaces the persona set and clears the conversation for a new game.
    pub fn start_session(&mut self, registry: PersonaRegistry) {
        let effects = self.machine.reset();
        let mut follow_ups = VecDeque::new();
        for effect in effects {
            let _ = self.execute(effect, &mut follow_ups);
        }
        self.registry = registry;
        self.current = 0;
        self.log = ConversationLog::new();
    }

    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.signals.rx.recv().await
    }

    pub fn try_next_signal(&mut self) -> Option<Signal> {
        self.signals.rx.try_recv().ok()
    }

    pub fn handle(&mut self, signal: Signal) {
        let event = match signal {
            Signal::Recognizer(event) => match self.capture.on_event(event) {
                Some(CaptureOutcome::Finished(transcript)) => TurnEvent::CaptureFinished(transcript),
                Some(CaptureOutcome::Failed(error)) => TurnEvent::CaptureFailed(error),
                None => return,
            },
            Signal::Reply { ticket, result } => TurnEvent::ReplyReceived { ticket, result },
            Signal::Speech { ticket, result } => TurnEvent::SpeechReady { ticket, result },
            Signal::Playback { ticket, event } => match event {
                PlaybackEvent::Started => TurnEvent::PlaybackStarted(ticket),
                PlaybackEvent::Ended => TurnEvent::PlaybackEnded(ticket),
                PlaybackEvent::Failed(error) => TurnEvent::PlaybackFailed(ticket, error),
            },
        };
        if let Err(e) = self.apply(event) {
            log::warn!("Failed to handle signal: {}", e);
        }
    }

    fn ensure_idle(&self) -> Result<(), TurnError> {
        match self.machine.state() {
            TurnState::Idle => Ok(()),
            state => Err(TurnError::Busy(state)),
        }
    }

    // Runs an event and every follow-up event its effects produce.
    fn apply(&mut self, event: TurnEvent) -> Result<(), TurnError> {
        let mut pending = VecDeque::from([event]);
        let mut outcome = Ok(());
        while let Some(event) = pending.pop_front() {
            let effects = self.machine.step(event, self.registry.at(self.current));
            for effect in effects {
                if let Err(e) = self.execute(effect, &mut pending) {
                    if outcome.is_ok() {
                        outcome = Err(e);
                    }
                }
            }
        }
        outcome
    }

    fn execute(&mut self, effect: Effect, pending: &mut VecDeque<TurnEvent>) -> Result<(), TurnError> {
        match effect {
            Effect::StartCapture => {
                if let Err(e) = self.capture.start() {
                    pending.push_back(TurnEvent::CaptureFailed(e.clone()));
                    return Err(e.into());
                }
            }
            Effect::StopCapture => self.capture.stop(),
            Effect::AbortCapture => self.capture.abort(),
            Effect::Record { message, speaker } => {
                if let Some(stats) = &self.stats {
                    stats.record_message(&speaker, &message.content);
                }
                self.log.push(message);
            }
            Effect::RequestReply {
                ticket,
                spec,
                message,
            } => {
                let responder = Arc::clone(&self.responder);
                let tx = self.signals.sender();
                let reply_timeout = self.reply_timeout;
                tokio::spawn(async move {
                    let result =
                        match tokio::time::timeout(reply_timeout, responder.respond(&spec, &message))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(ResponderError::Timeout),
                        };
                    let _ = tx.send(Signal::Reply { ticket, result });
                });
            }
            Effect::RequestSpeech {
                ticket,
                text,
                voice_id,
            } => {
                let synthesizer = Arc::clone(&self.synthesizer);
                let tx = self.signals.sender();
                let reply_timeout = self.reply_timeout;
                tokio::spawn(async move {
                    let result = match tokio::time::timeout(
                        reply_timeout,
                        synthesizer.synthesize(&text, &voice_id),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(SynthesisError::Timeout),
                    };
                    let _ = tx.send(Signal::Speech { ticket, result });
                });
            }
            Effect::StartPlayback { ticket, clip } => match self.player.as_mut() {
                Some(player) => {
                    if let Err(e) = player.play(ticket, clip) {
                        pending.push_back(TurnEvent::PlaybackFailed(ticket, e));
                    }
                }
                None => pending.push_back(TurnEvent::PlaybackFailed(ticket, PlaybackError::Closed)),
            },
            Effect::StopPlayback => {
                if let Some(player) = self.player.as_mut() {
                    player.stop();
                }
            }
        }
        Ok(())
    }
}
