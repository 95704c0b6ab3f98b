//! Speech capture adapter.
//!
//! Wraps a continuous speech-to-text [`Recognizer`] behind `start`, `stop`
//! and the latest final transcript. Recognizers report back through a
//! [`RecognizerSink`]; the owner feeds those events to
//! [`SpeechCapture::on_event`] from its event loop.

use crate::error::CaptureError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    Interim(String),
    Final(String),
    Error(CaptureError),
    Ended,
}

pub type RecognizerSink = Arc<dyn Fn(RecognizerEvent) + Send + Sync>;

pub trait Recognizer: Send {
    /// Begin listening. Results are reported through `sink` until `Ended`.
    fn start(&mut self, sink: RecognizerSink) -> Result<(), CaptureError>;
    /// Stop listening, deliver any pending final result, then report `Ended`.
    fn stop(&mut self);
    /// Stop listening and discard whatever was heard.
    fn abort(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Stopped,
    Listening,
    Unavailable,
}

// What a finished capture hands to the turn controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Finished(String),
    Failed(CaptureError),
}

pub struct SpeechCapture {
    recognizer: Option<Box<dyn Recognizer>>,
    sink: RecognizerSink,
    state: CaptureState,
    latest_final: String,
    // Set between stop() and the recognizer's Ended.
    finalizing: bool,
    // Bumped on every start and abort. Events from an older capture never reach the sink.
    generation: Arc<AtomicU64>,
}

impl SpeechCapture {
    pub fn new(recognizer: Option<Box<dyn Recognizer>>, sink: RecognizerSink) -> Self {
        let state = if recognizer.is_some() {
            CaptureState::Stopped
        } else {
            log::error!("Speech capture is not available, voice input disabled");
            CaptureState::Unavailable
        };
        Self {
            recognizer,
            sink,
            state,
            latest_final: String::new(),
            finalizing: false,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state != CaptureState::Unavailable
    }

    pub fn latest_final_transcript(&self) -> &str {
        &self.latest_final
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return Err(CaptureError::Unavailable);
        };
        if self.state == CaptureState::Listening {
            return Ok(());
        }
        if self.finalizing {
            recognizer.abort();
            self.finalizing = false;
        }

        self.latest_final.clear();
        let sink = gated(&self.sink, &self.generation);
        recognizer.start(sink)?;
        self.state = CaptureState::Listening;
        log::debug!("Speech capture listening");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state != CaptureState::Listening {
            return;
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
        self.state = CaptureState::Stopped;
        self.finalizing = true;
    }

    pub fn abort(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.state == CaptureState::Listening || self.finalizing {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
            log::debug!("Speech capture aborted");
        }
        if self.state == CaptureState::Listening {
            self.state = CaptureState::Stopped;
        }
        self.finalizing = false;
    }

    /// Applies one recognizer event. Returns an outcome once the capture is over.
    pub fn on_event(&mut self, event: RecognizerEvent) -> Option<CaptureOutcome> {
        let active = self.state == CaptureState::Listening || self.finalizing;
        if !active {
            log::debug!("Ignoring recognizer event outside a capture: {:?}", event);
            return None;
        }

        match event {
            RecognizerEvent::Interim(_) => None,
            RecognizerEvent::Final(transcript) => {
                self.latest_final = transcript;
                None
            }
            RecognizerEvent::Error(error) => {
                log::error!("Speech capture error: {}", error);
                self.state = CaptureState::Stopped;
                self.finalizing = false;
                Some(CaptureOutcome::Failed(error))
            }
            RecognizerEvent::Ended if self.finalizing => {
                self.finalizing = false;
                Some(CaptureOutcome::Finished(self.latest_final.clone()))
            }
            RecognizerEvent::Ended => {
                log::warn!("Speech capture ended before it was stopped");
                self.state = CaptureState::Stopped;
                Some(CaptureOutcome::Failed(CaptureError::Ended))
            }
        }
    }
}

// Recognizers may still report after an abort (a transcription already in
// flight), so each capture gets a sink that goes quiet once it is superseded.
fn gated(sink: &RecognizerSink, generation: &Arc<AtomicU64>) -> RecognizerSink {
    let mine = generation.fetch_add(1, Ordering::SeqCst) + 1;
    let sink = Arc::clone(sink);
    let generation = Arc::clone(generation);
    Arc::new(move |event| {
        if generation.load(Ordering::SeqCst) == mine {
            sink(event);
        } else {
            log::debug!("Dropping event from a superseded capture: {:?}", event);
        }
    })
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        self.abort();
    }
}
