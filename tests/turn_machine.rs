mod common;

use common::{persona, researcher};
use landfall::turn::{Effect, TurnEvent};
use landfall::*;

fn reply_for(machine: &mut TurnMachine, ticket: Ticket, reply: &str) -> Vec<Effect> {
    machine.step(
        TurnEvent::ReplyReceived {
            ticket,
            result: Ok(reply.to_string()),
        },
        &researcher(),
    )
}

#[test]
fn capture_is_only_requested_from_idle() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();

    assert_eq!(
        machine.step(TurnEvent::CaptureRequested, &p),
        vec![Effect::StartCapture]
    );
    assert_eq!(machine.state(), TurnState::Capturing);
    assert!(machine.step(TurnEvent::CaptureRequested, &p).is_empty());
}

#[test]
fn finished_capture_records_then_requests_a_reply() {
    let mut machine = TurnMachine::new(true);
    let p = persona(&[FactTag::Ocean, FactTag::Gravity]);
    machine.step(TurnEvent::CaptureRequested, &p);

    let effects = machine.step(TurnEvent::CaptureFinished("  hello there ".into()), &p);
    let ticket = Ticket { turn: 1, epoch: 0 };
    assert_eq!(
        effects,
        vec![
            Effect::Record {
                message: Message::user("hello there"),
                speaker: "user".to_string(),
            },
            Effect::RequestReply {
                ticket,
                spec: prompt::build(&p),
                message: "hello there".to_string(),
            },
        ]
    );
    assert_eq!(machine.state(), TurnState::AwaitingReply);
    assert_eq!(machine.in_flight(), Some(ticket));
    assert_eq!(machine.last_transcript(), Some("hello there"));
}

#[test]
fn reply_is_recorded_under_the_persona_name_and_spoken_in_its_voice() {
    let mut machine = TurnMachine::new(true);
    let p = persona(&[FactTag::Color, FactTag::Ocean]);
    machine.step(TurnEvent::TextSubmitted("hi".into()), &p);
    let ticket = machine.in_flight().unwrap();

    let effects = reply_for(&mut machine, ticket, "Greetings.");
    assert_eq!(
        effects,
        vec![
            Effect::Record {
                message: Message::assistant("Greetings."),
                speaker: "Voice 3".to_string(),
            },
            Effect::RequestSpeech {
                ticket,
                text: "Greetings.".to_string(),
                voice_id: "echo".to_string(),
            },
        ]
    );
    // Still waiting until audio actually starts.
    assert_eq!(machine.state(), TurnState::AwaitingReply);
}

#[test]
fn replies_for_unknown_turns_are_dropped() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();
    machine.step(TurnEvent::TextSubmitted("hi".into()), &p);

    let effects = reply_for(&mut machine, Ticket { turn: 7, epoch: 0 }, "late");
    assert!(effects.is_empty());
    assert_eq!(machine.state(), TurnState::AwaitingReply);
}

#[test]
fn audio_started_after_a_switch_is_stopped() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();
    machine.step(TurnEvent::TextSubmitted("hi".into()), &p);
    let ticket = machine.in_flight().unwrap();
    reply_for(&mut machine, ticket, "Hello.");
    let effects = machine.step(
        TurnEvent::SpeechReady {
            ticket,
            result: Ok(AudioClip::new(vec![1, 2, 3])),
        },
        &p,
    );
    assert_eq!(
        effects,
        vec![Effect::StartPlayback {
            ticket,
            clip: AudioClip::new(vec![1, 2, 3]),
        }]
    );

    // Switched after play() was issued but before the player confirmed.
    assert_eq!(
        machine.step(TurnEvent::PersonaSwitched, &p),
        vec![Effect::StopPlayback]
    );
    assert_eq!(machine.state(), TurnState::Idle);
    assert!(machine.step(TurnEvent::PlaybackStarted(ticket), &p).is_empty());
    assert_eq!(machine.state(), TurnState::Idle);
}

#[test]
fn speech_ready_after_a_switch_is_discarded() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();
    machine.step(TurnEvent::TextSubmitted("hi".into()), &p);
    let ticket = machine.in_flight().unwrap();
    reply_for(&mut machine, ticket, "Hello.");

    machine.step(TurnEvent::PersonaSwitched, &p);
    let effects = machine.step(
        TurnEvent::SpeechReady {
            ticket,
            result: Ok(AudioClip::new(vec![0])),
        },
        &p,
    );
    assert!(effects.is_empty());
    assert_eq!(machine.state(), TurnState::Idle);
    assert_eq!(machine.epoch(), 1);
}

#[test]
fn playback_lifecycle() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();
    machine.step(TurnEvent::TextSubmitted("hi".into()), &p);
    let ticket = machine.in_flight().unwrap();
    reply_for(&mut machine, ticket, "Hello.");
    machine.step(
        TurnEvent::SpeechReady {
            ticket,
            result: Ok(AudioClip::new(vec![0])),
        },
        &p,
    );

    machine.step(TurnEvent::PlaybackStarted(ticket), &p);
    assert_eq!(machine.state(), TurnState::Speaking);
    assert!(!machine.accepts_input());

    machine.step(TurnEvent::PlaybackEnded(ticket), &p);
    assert_eq!(machine.state(), TurnState::Idle);
    assert_eq!(machine.in_flight(), None);
}

#[test]
fn reset_abandons_capture_and_moves_the_epoch() {
    let mut machine = TurnMachine::new(true);
    let p = researcher();
    machine.step(TurnEvent::CaptureRequested, &p);

    assert_eq!(machine.reset(), vec![Effect::AbortCapture]);
    assert_eq!(machine.state(), TurnState::Idle);
    assert_eq!(machine.epoch(), 1);
    assert_eq!(machine.last_transcript(), None);
}

#[test]
fn turns_keep_counting_across_resets() {
    let mut machine = TurnMachine::new(false);
    let p = researcher();
    machine.step(TurnEvent::TextSubmitted("one".into()), &p);
    machine.reset();
    machine.step(TurnEvent::TextSubmitted("two".into()), &p);

    assert_eq!(machine.in_flight(), Some(Ticket { turn: 2, epoch: 1 }));
}
