mod common;

use common::{Call, GatedSender, PanickingSender, Step, harness};
use std::path::PathBuf;
use std::sync::Arc;
use whispr_core::chat::{BubbleState, Role};
use whispr_core::stream::{StreamEvent, StreamKind, TurnId, TurnOutcome, TurnState};

/// Verify fragments assemble into one bubble and the turn returns to idle.
#[test]
fn test_fragments_assemble_into_one_bubble() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    assert!(h.assistant.send_input("What is 2+2?"));
    assert_eq!(h.assistant.state(), TurnState::Dispatching);
    assert!(h.transcript().is_loading());

    script.fragments(&["The ", "answer ", "is 4."]);
    script.push(Step::Finish);
    h.pump_until(|a| a.state() == TurnState::Idle);

    let bubbles = h.transcript().bubbles();
    assert_eq!(bubbles.len(), 2);
    assert_eq!(bubbles[0].role, Role::User);
    assert_eq!(bubbles[0].text, "What is 2+2?");
    assert_eq!(bubbles[1].role, Role::Assistant);
    assert_eq!(bubbles[1].text, "The answer is 4.");
    assert_eq!(bubbles[1].state, BubbleState::Complete);
    assert!(!h.transcript().is_loading());
    assert!(h.transcript().streaming_bubble().is_none());
    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Finished));
}

/// Verify a new message finalizes the in-flight bubble and nothing from the old turn follows it.
#[test]
fn test_new_message_supersedes_streaming_turn() {
    let sender = GatedSender::default();
    let first = sender.script();
    let second = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("A");
    first.fragments(&["a1", "a2"]);
    h.pump_until(|a| {
        a.chat()
            .transcript
            .streaming_bubble()
            .is_some_and(|b| b.text == "a1a2")
    });

    h.assistant.send_input("B");
    assert!(h.transcript().streaming_bubble().is_none());
    assert_eq!(h.transcript().bubbles()[1].state, BubbleState::Complete);

    first.fragments(&["a3", "a4"]);
    first.push(Step::Finish);
    assert_eq!(first.wait_returned(), vec!["a1", "a2"]);

    second.fragments(&["b1", "b2"]);
    second.push(Step::Finish);
    h.pump_until(|a| a.state() == TurnState::Idle);

    let after_b: Vec<Call> = h
        .calls()
        .iter()
        .skip_while(|c| **c != Call::Add("B".to_string(), true))
        .cloned()
        .collect();
    assert_eq!(
        after_b,
        vec![
            Call::Add("B".to_string(), true),
            Call::Start,
            Call::Append("b1".to_string()),
            Call::Append("b2".to_string()),
            Call::Finalize,
        ]
    );

    let texts: Vec<&str> = h
        .transcript()
        .bubbles()
        .iter()
        .map(|b| b.text.as_str())
        .collect();
    assert_eq!(texts, vec!["A", "a1a2", "B", "b1b2"]);
}

/// Verify a turn superseded before its first fragment leaves no empty bubble behind.
#[test]
fn test_supersede_before_first_fragment() {
    let sender = GatedSender::default();
    let first = sender.script();
    let second = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("first");
    h.assistant.send_input("second");

    let bubbles = h.transcript().bubbles();
    assert_eq!(bubbles.len(), 2);
    assert!(bubbles.iter().all(|b| b.role == Role::User));
    assert!(h.transcript().is_loading());

    second.fragments(&["hi"]);
    h.pump_until(|a| a.chat().transcript.streaming_bubble().is_some());

    first.fragments(&["late"]);
    first.push(Step::Finish);
    assert!(first.wait_returned().is_empty());
    h.pump();

    let assistant_bubbles: Vec<_> = h
        .transcript()
        .bubbles()
        .iter()
        .filter(|b| b.role == Role::Assistant)
        .collect();
    assert_eq!(assistant_bubbles.len(), 1);
    assert_eq!(assistant_bubbles[0].text, "hi");
    assert_eq!(assistant_bubbles[0].state, BubbleState::Streaming);
    assert!(!h.calls().contains(&Call::Append("late".to_string())));

    second.push(Step::Finish);
    h.pump_until(|a| a.state() == TurnState::Idle);
}

/// Verify a failure after partial output replaces the partial bubble with the error.
#[test]
fn test_failure_after_fragment_shows_error_bubble() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("do it");
    script.fragments(&["Working..."]);
    h.pump_until(|a| a.state() == TurnState::Streaming);

    script.push(Step::Fail("boom"));
    h.pump_until(|a| a.state() == TurnState::Idle);

    let bubbles = h.transcript().bubbles();
    assert_eq!(bubbles.len(), 2);
    let last = &bubbles[1];
    assert_eq!(last.state, BubbleState::Error);
    assert_eq!(last.text, "Error generating response: provider error: boom");
    assert!(bubbles.iter().all(|b| b.text != "Working..."));
    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Errored));
}

/// Verify a failure before any fragment appends a standalone error message.
#[test]
fn test_failure_before_fragment_appends_error() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("hello");
    script.push(Step::Fail("quota exceeded"));
    h.pump_until(|a| a.state() == TurnState::Idle);

    let bubbles = h.transcript().bubbles();
    assert_eq!(bubbles.len(), 2);
    assert_eq!(bubbles[1].role, Role::Assistant);
    assert_eq!(bubbles[1].state, BubbleState::Error);
    assert!(!h.calls().contains(&Call::Start));
    assert!(!h.transcript().is_loading());
}

/// Verify cancelling after two of five fragments blocks the rest and the terminal signal.
#[test]
fn test_cancel_mid_stream_drops_remaining_signals() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("count");
    script.fragments(&["1 ", "2 "]);
    h.pump_until(|a| {
        a.chat()
            .transcript
            .streaming_bubble()
            .is_some_and(|b| b.text == "1 2 ")
    });

    h.assistant.stop();
    assert_eq!(h.assistant.state(), TurnState::Idle);
    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Cancelled));
    let calls_at_cancel = h.calls().len();

    script.fragments(&["3 ", "4 ", "5"]);
    script.push(Step::Finish);
    assert_eq!(script.wait_returned(), vec!["1 ", "2 "]);

    assert!(h.queue.drain().is_empty());
    assert_eq!(h.calls().len(), calls_at_cancel);
    let bubble = &h.transcript().bubbles()[1];
    assert_eq!(bubble.text, "1 2 ");
    assert_eq!(bubble.state, BubbleState::Complete);
    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Cancelled));
}

/// Verify events tagged with a finished or unknown turn are ignored.
#[test]
fn test_events_for_inactive_turns_are_ignored() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("q");
    h.assistant.stop();
    script.push(Step::Finish);
    script.wait_returned();

    let before = h.calls().len();
    h.assistant.apply(StreamEvent {
        turn: TurnId(1),
        kind: StreamKind::Fragment("ghost".to_string()),
    });
    h.assistant.apply(StreamEvent {
        turn: TurnId(42),
        kind: StreamKind::Failed("ghost".to_string()),
    });
    assert_eq!(h.calls().len(), before);
    assert_eq!(h.assistant.state(), TurnState::Idle);
}

/// Verify a panic inside the sender is reported as an error bubble.
#[test]
fn test_sender_panic_becomes_error_bubble() {
    let mut h = harness(Arc::new(PanickingSender));

    h.assistant.send_input("crash");
    h.pump_until(|a| a.state() == TurnState::Idle && a.last_outcome().is_some());

    let last = h.transcript().bubbles().last().unwrap();
    assert_eq!(last.state, BubbleState::Error);
    assert_eq!(
        last.text,
        "Error generating response: connection state corrupted"
    );
    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Errored));
}

/// Verify empty input with no pending screenshots sends nothing.
#[test]
fn test_empty_input_is_ignored() {
    let sender = GatedSender::default();
    let mut h = harness(Arc::new(sender.clone()));

    assert!(!h.assistant.send_input("   "));
    assert!(h.calls().is_empty());
    assert_eq!(h.assistant.state(), TurnState::Idle);
    assert!(sender.inputs().is_empty());
}

/// Verify sending with a screenshot attaches the new capture and earlier pending ones.
#[test]
fn test_send_with_screenshot_attaches_pending() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.capture_screenshot().unwrap();
    assert!(h.assistant.send_with_screenshot("  what is this?  "));
    assert!(h.assistant.screenshots().released.is_empty());
    script.push(Step::Finish);
    script.wait_returned();
    h.pump_until(|a| a.state() == TurnState::Idle);

    let shots = vec![
        PathBuf::from("shots").join("shot-1.png"),
        PathBuf::from("shots").join("shot-2.png"),
    ];
    let inputs = sender.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].0, "what is this?");
    assert_eq!(inputs[0].1, shots);
    assert!(h.assistant.screenshots().pending.is_empty());
    assert_eq!(h.assistant.screenshots().released, shots);
}

/// Verify a screenshot alone, with no text, is enough to send.
#[test]
fn test_screenshot_without_text_is_sent() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    assert!(h.assistant.send_with_screenshot(""));
    assert_eq!(h.calls()[0], Call::Add("[screenshot]".to_string(), true));
    script.push(Step::Finish);
    script.wait_returned();
    assert_eq!(sender.inputs()[0].0, "");
    assert_eq!(sender.inputs()[0].1.len(), 1);
}

/// Verify a superseded turn's screenshots are released once the next turn starts.
#[test]
fn test_superseded_turn_releases_screenshots() {
    let sender = GatedSender::default();
    let first = sender.script();
    let second = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.capture_screenshot().unwrap();
    h.assistant.capture_screenshot().unwrap();
    assert!(h.assistant.send_input(""));
    assert_eq!(h.calls()[0], Call::Add("[2 screenshots]".to_string(), true));

    assert!(h.assistant.send_input("never mind"));
    assert_eq!(
        h.assistant.screenshots().released,
        vec![
            PathBuf::from("shots").join("shot-1.png"),
            PathBuf::from("shots").join("shot-2.png"),
        ]
    );

    first.push(Step::Finish);
    second.push(Step::Finish);
    h.pump_until(|a| a.state() == TurnState::Idle);
    assert_eq!(h.assistant.screenshots().released.len(), 2);
}

/// Verify a failed turn still releases its screenshots.
#[test]
fn test_failed_turn_releases_screenshots() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    assert!(h.assistant.send_with_screenshot("what went wrong?"));
    script.push(Step::Fail("boom"));
    h.pump_until(|a| a.state() == TurnState::Idle);

    assert_eq!(h.assistant.last_outcome(), Some(TurnOutcome::Errored));
    assert_eq!(
        h.assistant.screenshots().released,
        vec![PathBuf::from("shots").join("shot-1.png")]
    );
}

/// Verify a failed capture still sends the message text.
#[test]
fn test_failed_capture_still_sends_text() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));
    h.assistant.screenshots_mut().fail = true;

    assert!(h.assistant.send_with_screenshot_fix("fix this"));
    script.push(Step::Finish);
    script.wait_returned();

    let inputs = sender.inputs();
    assert_eq!(inputs[0].0, "fix this");
    assert!(inputs[0].1.is_empty());
}

/// Verify clearing mid-stream cancels the turn and empties chat and screenshots.
#[test]
fn test_clear_cancels_and_empties() {
    let sender = GatedSender::default();
    let script = sender.script();
    let mut h = harness(Arc::new(sender.clone()));

    h.assistant.send_input("long answer please");
    script.fragments(&["x"]);
    h.pump_until(|a| a.state() == TurnState::Streaming);

    h.assistant.clear();
    assert!(h.transcript().bubbles().is_empty());
    assert!(h.assistant.screenshots().cleared);
    assert_eq!(h.assistant.state(), TurnState::Idle);

    script.fragments(&["y"]);
    script.wait_returned();
    h.pump();
    assert!(h.transcript().bubbles().is_empty());
}
