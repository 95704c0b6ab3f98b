mod common;

use common::{FakeResponder, FakeSynthesizer, HarnessBuilder, PlayerCall, researcher};
use landfall::*;
use std::time::Duration;

const FIRST: Ticket = Ticket { turn: 1, epoch: 0 };

#[tokio::test]
async fn typed_turn_is_answered_spoken_and_finished() {
    let mut h = HarnessBuilder::new()
        .responder(FakeResponder::replying("Our sensors record 79°F."))
        .build();

    h.controller.submit_text("What's the temperature?").unwrap();
    assert_eq!(h.controller.state(), TurnState::AwaitingReply);
    // The user message is logged before the reply arrives.
    assert_eq!(h.controller.messages(), &[Message::user("What's the temperature?")]);

    h.pump_until(|c| c.state() == TurnState::Speaking).await;
    assert_eq!(
        h.controller.messages(),
        &[
            Message::user("What's the temperature?"),
            Message::assistant("Our sensors record 79°F."),
        ]
    );
    assert_eq!(
        h.synthesizer.calls.lock().unwrap().clone(),
        vec![("Our sensors record 79°F.".to_string(), "onyx".to_string())]
    );
    assert_eq!(h.player_calls(), vec![PlayerCall::Play(FIRST)]);

    h.finish_playback(FIRST);
    h.pump_until(|c| c.state() == TurnState::Idle).await;
    assert_eq!(h.responder.call_count(), 1);
    assert_eq!(h.synthesizer.call_count(), 1);
}

#[tokio::test]
async fn truthful_persona_prompt_carries_the_real_temperature() {
    let registry = PersonaRegistry::new(vec![researcher()]).unwrap();
    let mut h = HarnessBuilder::new().registry(registry).without_player().build();

    h.recognizer.say("What's the temperature?");
    h.controller.begin_capture().unwrap();
    assert_eq!(h.controller.state(), TurnState::Capturing);
    h.controller.end_capture().unwrap();
    h.pump_until(|c| c.messages().len() == 2).await;

    let calls = h.responder.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let (spec, message) = &calls[0];
    assert_eq!(message, "What's the temperature?");
    assert!(spec.instructions().contains("59°F"));
    assert!(spec.prompt_for(message).contains("59°F"));
}

#[tokio::test]
async fn repeated_transcript_is_processed_once() {
    let mut h = HarnessBuilder::new().without_player().build();
    h.recognizer.say("hello");

    h.controller.begin_capture().unwrap();
    h.controller.end_capture().unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle && c.messages().len() == 2)
        .await;

    h.controller.begin_capture().unwrap();
    h.controller.end_capture().unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;
    h.pump_for(Duration::from_millis(50)).await;

    let user_messages = h
        .controller
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .count();
    assert_eq!(user_messages, 1);
    assert_eq!(h.responder.call_count(), 1);
}

#[tokio::test]
async fn typed_text_is_not_deduplicated() {
    let mut h = HarnessBuilder::new().without_player().build();

    for _ in 0..2 {
        h.controller.submit_text("hello").unwrap();
        h.pump_until(|c| c.state() == TurnState::Idle).await;
    }
    assert_eq!(h.controller.messages().len(), 4);
    assert_eq!(h.responder.call_count(), 2);
}

#[tokio::test]
async fn empty_transcript_returns_to_idle_silently() {
    let mut h = HarnessBuilder::new().build();
    h.recognizer.say("   ");

    h.controller.begin_capture().unwrap();
    h.controller.end_capture().unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert!(h.controller.messages().is_empty());
    assert_eq!(h.responder.call_count(), 0);
}

#[tokio::test]
async fn capture_failure_returns_to_idle_without_a_message() {
    let mut h = HarnessBuilder::new().build();

    h.controller.begin_capture().unwrap();
    h.recognizer.emit(RecognizerEvent::Error(CaptureError::Transcription(
        "network down".into(),
    )));
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert!(h.controller.messages().is_empty());
    assert_eq!(h.controller.capture_state(), CaptureState::Stopped);
}

#[tokio::test]
async fn input_is_rejected_while_a_turn_is_in_flight() {
    let mut h = HarnessBuilder::new().build();

    h.controller.submit_text("first").unwrap();
    assert_eq!(
        h.controller.begin_capture(),
        Err(TurnError::Busy(TurnState::AwaitingReply))
    );
    assert_eq!(
        h.controller.submit_text("second"),
        Err(TurnError::Busy(TurnState::AwaitingReply))
    );

    h.pump_until(|c| c.state() == TurnState::Speaking).await;
    assert_eq!(
        h.controller.begin_capture(),
        Err(TurnError::Busy(TurnState::Speaking))
    );
    assert_eq!(h.recognizer.probe.lock().unwrap().starts, 0);
    assert_eq!(h.responder.call_count(), 1);
}

#[tokio::test]
async fn blank_text_is_ignored() {
    let mut h = HarnessBuilder::new().build();

    assert_eq!(h.controller.submit_text("  \n "), Err(TurnError::Blank));
    assert_eq!(h.controller.state(), TurnState::Idle);
    assert!(h.controller.messages().is_empty());
}

#[tokio::test]
async fn responder_failure_appends_the_fallback() {
    let mut h = HarnessBuilder::new()
        .responder(FakeResponder::failing(ResponderError::Api("503".into())))
        .build();

    h.controller.submit_text("Is anyone there?").unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert_eq!(
        h.controller.messages(),
        &[
            Message::user("Is anyone there?"),
            Message::assistant(FALLBACK_REPLY),
        ]
    );
    assert_eq!(h.synthesizer.call_count(), 0);
}

#[tokio::test]
async fn synthesis_failure_keeps_the_reply_text() {
    let mut h = HarnessBuilder::new()
        .synthesizer(FakeSynthesizer::failing())
        .build();

    h.controller.submit_text("hello").unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert_eq!(h.controller.messages().len(), 2);
    assert_eq!(h.synthesizer.call_count(), 1);
    assert!(h.player_calls().is_empty());
}

#[tokio::test]
async fn without_audio_output_replies_are_only_shown() {
    let mut h = HarnessBuilder::new().without_player().build();
    assert!(!h.controller.is_speaking_enabled());

    h.controller.submit_text("hello").unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert_eq!(h.controller.messages().len(), 2);
    assert_eq!(h.synthesizer.call_count(), 0);
}

#[tokio::test]
async fn stale_reply_is_logged_but_not_spoken() {
    let mut h = HarnessBuilder::new().build();

    h.controller.submit_text("What color is your planet?").unwrap();
    h.controller.switch_persona(Direction::Next);
    h.pump_until(|c| c.messages().len() == 2).await;
    h.pump_for(Duration::from_millis(50)).await;

    assert_eq!(h.controller.state(), TurnState::Idle);
    assert_eq!(h.controller.messages()[1].role, Role::Assistant);
    assert_eq!(h.synthesizer.call_count(), 0);
    assert!(h.player_calls().is_empty());
}

#[tokio::test]
async fn switching_persona_stops_playback() {
    let mut h = HarnessBuilder::new().build();

    h.controller.submit_text("hello").unwrap();
    h.pump_until(|c| c.state() == TurnState::Speaking).await;

    let persona = h.controller.switch_persona(Direction::Previous);
    assert_eq!(persona.display_name, "Voice 10");
    assert_eq!(h.controller.state(), TurnState::Idle);
    assert_eq!(
        h.player_calls(),
        vec![PlayerCall::Play(FIRST), PlayerCall::Stop]
    );

    // The end of the stopped clip belongs to a finished turn.
    h.finish_playback(FIRST);
    h.pump_for(Duration::from_millis(50)).await;
    assert_eq!(h.controller.state(), TurnState::Idle);
    assert_eq!(h.controller.messages().len(), 2);
}

#[tokio::test]
async fn switching_while_listening_addresses_the_new_persona() {
    let mut h = HarnessBuilder::new().build();
    h.recognizer.say("Where are you?");

    h.controller.begin_capture().unwrap();
    h.controller.switch_persona(Direction::Next);
    assert_eq!(h.controller.state(), TurnState::Capturing);
    h.controller.end_capture().unwrap();
    h.pump_until(|c| c.state() == TurnState::Speaking).await;

    let calls = h.responder.calls.lock().unwrap().clone();
    assert!(calls[0].0.instructions().contains("Velkara"));
    let voice = h.synthesizer.calls.lock().unwrap()[0].1.clone();
    assert_eq!(voice, "nova");
}

#[tokio::test]
async fn voice_input_unavailable_is_reported() {
    let mut h = HarnessBuilder::new().without_recognizer().build();

    assert!(!h.controller.is_voice_available());
    assert_eq!(
        h.controller.begin_capture(),
        Err(TurnError::Capture(CaptureError::Unavailable))
    );
    assert_eq!(h.controller.state(), TurnState::Idle);
    // Typing still works.
    h.controller.submit_text("hello").unwrap();
}

#[tokio::test]
async fn end_capture_requires_a_capture() {
    let mut h = HarnessBuilder::new().build();
    assert_eq!(h.controller.end_capture(), Err(TurnError::NotCapturing));
}

#[tokio::test]
async fn new_session_clears_the_conversation() {
    let mut h = HarnessBuilder::new().build();

    h.controller.submit_text("hello").unwrap();
    h.controller.switch_persona(Direction::Next);
    h.controller.start_session(PersonaRegistry::new(vec![researcher()]).unwrap());

    assert_eq!(h.controller.state(), TurnState::Idle);
    assert!(h.controller.messages().is_empty());
    assert_eq!(h.controller.current_index(), 0);
    assert!(h.controller.current_persona().is_truthful);

    // The reply of the abandoned turn finds nothing to attach to.
    h.pump_for(Duration::from_millis(50)).await;
    assert!(h.controller.messages().is_empty());
}

#[tokio::test]
async fn unanswered_reply_times_out_into_the_fallback() {
    let mut h = HarnessBuilder::new()
        .responder(FakeResponder::hanging())
        .reply_timeout(Duration::from_millis(50))
        .build();

    h.controller.submit_text("Hello?").unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert_eq!(
        h.controller.messages(),
        &[Message::user("Hello?"), Message::assistant(FALLBACK_REPLY)]
    );
    assert_eq!(h.synthesizer.call_count(), 0);
    h.controller.submit_text("Anyone?").unwrap();
}

#[tokio::test]
async fn unanswered_speech_times_out_and_frees_the_radio() {
    let mut h = HarnessBuilder::new()
        .responder(FakeResponder::replying("Standing by."))
        .synthesizer(FakeSynthesizer::hanging())
        .reply_timeout(Duration::from_millis(50))
        .build();

    h.controller.submit_text("Status?").unwrap();
    h.pump_until(|c| c.state() == TurnState::Idle).await;

    assert_eq!(
        h.controller.messages(),
        &[Message::user("Status?"), Message::assistant("Standing by.")]
    );
    assert_eq!(h.synthesizer.call_count(), 1);
    assert!(h.player_calls().is_empty());
    h.controller.submit_text("Again?").unwrap();
}
