// Test doubles for the turn controller's collaborators.
#![allow(dead_code)]

use landfall::audio::PlaybackSink;
use landfall::capture::RecognizerSink;
use landfall::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn persona(known_facts: &[FactTag]) -> Persona {
    Persona {
        id: "echo".to_string(),
        display_name: "Voice 3".to_string(),
        description: "Planetary Researcher".to_string(),
        planet_name: "Kalmora".to_string(),
        avg_temp: "91°F".to_string(),
        planet_color: "Jungle green with gold clouds".to_string(),
        ocean_coverage: "42%".to_string(),
        gravity: "1.03g".to_string(),
        is_truthful: false,
        known_facts: known_facts.to_vec(),
    }
}

pub fn researcher() -> Persona {
    Persona {
        id: "fable".to_string(),
        display_name: "Voice 6".to_string(),
        description: "Planetary Researcher".to_string(),
        planet_name: "Earth Research Station".to_string(),
        avg_temp: "59°F".to_string(),
        planet_color: "Blue and green with white clouds".to_string(),
        ocean_coverage: "71%".to_string(),
        gravity: "1.00g".to_string(),
        is_truthful: true,
        known_facts: Vec::new(),
    }
}

#[derive(Clone)]
pub struct FakeResponder {
    reply: Result<String, ResponderError>,
    hang: bool,
    pub calls: Arc<Mutex<Vec<(BehaviorSpec, String)>>>,
}

impl FakeResponder {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            hang: false,
            calls: Arc::default(),
        }
    }

    pub fn failing(error: ResponderError) -> Self {
        Self {
            reply: Err(error),
            hang: false,
            calls: Arc::default(),
        }
    }

    // Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::replying("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Responder for FakeResponder {
    async fn respond(&self, spec: &BehaviorSpec, user_message: &str) -> Result<String, ResponderError> {
        self.calls
            .lock()
            .unwrap()
            .push((spec.clone(), user_message.to_string()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.reply.clone()
    }
}

#[derive(Clone)]
pub struct FakeSynthesizer {
    fail: bool,
    hang: bool,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeSynthesizer {
    pub fn working() -> Self {
        Self {
            fail: false,
            hang: false,
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            hang: false,
            calls: Arc::default(),
        }
    }

    // Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::working()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip, SynthesisError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.to_string()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            Err(SynthesisError::EmptyAudio)
        } else {
            Ok(AudioClip::new(text.as_bytes().to_vec()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Play(Ticket),
    Stop,
}

// Reports Started as soon as a clip is handed over; Ended is up to the test.
pub struct FakePlayer {
    sink: PlaybackSink,
    pub calls: Arc<Mutex<Vec<PlayerCall>>>,
}

impl AudioPlayer for FakePlayer {
    fn play(&mut self, ticket: Ticket, _clip: AudioClip) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push(PlayerCall::Play(ticket));
        (self.sink)(ticket, PlaybackEvent::Started);
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push(PlayerCall::Stop);
    }
}

#[derive(Default)]
pub struct RecognizerProbe {
    pub starts: usize,
    pub stops: usize,
    pub aborts: usize,
    pub sink: Option<RecognizerSink>,
    pub transcript: String, // Delivered as the final result on stop().
}

#[derive(Clone, Default)]
pub struct FakeRecognizer {
    pub probe: Arc<Mutex<RecognizerProbe>>,
}

impl FakeRecognizer {
    pub fn say(&self, transcript: &str) {
        self.probe.lock().unwrap().transcript = transcript.to_string();
    }

    // Pushes an event as if the recognizer had produced it on its own.
    pub fn emit(&self, event: RecognizerEvent) {
        let sink = self.probe.lock().unwrap().sink.clone();
        if let Some(sink) = sink {
            sink(event);
        }
    }
}

impl Recognizer for FakeRecognizer {
    fn start(&mut self, sink: RecognizerSink) -> Result<(), CaptureError> {
        let mut probe = self.probe.lock().unwrap();
        probe.starts += 1;
        probe.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        let (sink, transcript) = {
            let mut probe = self.probe.lock().unwrap();
            probe.stops += 1;
            (probe.sink.clone(), probe.transcript.clone())
        };
        if let Some(sink) = sink {
            sink(RecognizerEvent::Interim(transcript.clone()));
            sink(RecognizerEvent::Final(transcript));
            sink(RecognizerEvent::Ended);
        }
    }

    fn abort(&mut self) {
        self.probe.lock().unwrap().aborts += 1;
    }
}

pub type TestController = TurnController<FakeResponder, FakeSynthesizer, FakePlayer>;

pub struct Harness {
    pub controller: TestController,
    pub responder: FakeResponder,
    pub synthesizer: FakeSynthesizer,
    pub recognizer: FakeRecognizer,
    pub player_calls: Arc<Mutex<Vec<PlayerCall>>>,
    pub playback: PlaybackSink,
}

pub struct HarnessBuilder {
    registry: PersonaRegistry,
    responder: FakeResponder,
    synthesizer: FakeSynthesizer,
    with_player: bool,
    with_recognizer: bool,
    reply_timeout: Option<Duration>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            registry: PersonaRegistry::classic(),
            responder: FakeResponder::replying("Our data shows 79°F."),
            synthesizer: FakeSynthesizer::working(),
            with_player: true,
            with_recognizer: true,
            reply_timeout: None,
        }
    }

    pub fn registry(mut self, registry: PersonaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn responder(mut self, responder: FakeResponder) -> Self {
        self.responder = responder;
        self
    }

    pub fn synthesizer(mut self, synthesizer: FakeSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn without_player(mut self) -> Self {
        self.with_player = false;
        self
    }

    pub fn reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = Some(reply_timeout);
        self
    }

    pub fn without_recognizer(mut self) -> Self {
        self.with_recognizer = false;
        self
    }

    pub fn build(self) -> Harness {
        let signals = SignalQueue::new();
        let recognizer = FakeRecognizer::default();
        let capture = SpeechCapture::new(
            self.with_recognizer
                .then(|| Box::new(recognizer.clone()) as Box<dyn Recognizer>),
            signals.recognizer_sink(),
        );
        let player_calls = Arc::new(Mutex::new(Vec::new()));
        let player = self.with_player.then(|| FakePlayer {
            sink: signals.playback_sink(),
            calls: Arc::clone(&player_calls),
        });
        let playback = signals.playback_sink();

        let mut controller = TurnController::new(
            self.registry,
            capture,
            self.responder.clone(),
            self.synthesizer.clone(),
            player,
            signals,
        );
        if let Some(reply_timeout) = self.reply_timeout {
            controller = controller.with_reply_timeout(reply_timeout);
        }

        Harness {
            controller,
            responder: self.responder,
            synthesizer: self.synthesizer,
            recognizer,
            player_calls,
            playback,
        }
    }
}

impl Harness {
    /// Handles queued signals until `done` holds. Panics after two seconds.
    pub async fn pump_until(&mut self, done: impl Fn(&TestController) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !done(&self.controller) {
            let signal = tokio::time::timeout_at(deadline, self.controller.next_signal())
                .await
                .expect("timed out waiting for the controller")
                .expect("signal queue closed");
            self.controller.handle(signal);
        }
    }

    /// Handles whatever arrives within a short grace period.
    pub async fn pump_for(&mut self, period: Duration) {
        while let Ok(Some(signal)) =
            tokio::time::timeout(period, self.controller.next_signal()).await
        {
            self.controller.handle(signal);
        }
    }

    pub fn player_calls(&self) -> Vec<PlayerCall> {
        self.player_calls.lock().unwrap().clone()
    }

    pub fn finish_playback(&self, ticket: Ticket) {
        (self.playback)(ticket, PlaybackEvent::Ended);
    }
}
