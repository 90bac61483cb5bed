use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use whispr_core::config::ShortcutsConfig;
use whispr_core::hook::{HookEngine, KeyEvent, ModifierSource, Verdict, VisibilityGate};
use whispr_core::hotkey::{Action, HotkeyTables};
use whispr_core::keys::{Modifiers, vk};
use whispr_core::stream::{UiMessage, UiQueue, ui_channel};

const KEY_E: u32 = 0x45;
const KEY_S: u32 = 0x53;

#[derive(Clone, Default)]
struct HeldModifiers(Arc<AtomicU8>);

impl HeldModifiers {
    fn set(&self, modifiers: Modifiers) {
        self.0.store(modifiers.bits(), Ordering::SeqCst);
    }
}

impl ModifierSource for HeldModifiers {
    fn current(&self) -> Modifiers {
        let bits = self.0.load(Ordering::SeqCst);
        [Modifiers::CTRL, Modifiers::ALT, Modifiers::SHIFT]
            .into_iter()
            .filter(|m| bits & m.bits() != 0)
            .fold(Modifiers::NONE, |acc, m| acc | m)
    }
}

fn setup(visible: bool) -> (HookEngine, HeldModifiers, VisibilityGate, UiQueue) {
    let tables = HotkeyTables::from_config(&ShortcutsConfig::default()).unwrap();
    let modifiers = HeldModifiers::default();
    let gate = VisibilityGate::new(visible);
    let (ui, queue) = ui_channel(|| {});
    let engine = HookEngine::new(tables, gate.clone(), Box::new(modifiers.clone()), Box::new(ui));
    (engine, modifiers, gate, queue)
}

fn actions(queue: &UiQueue) -> Vec<Action> {
    queue
        .drain()
        .into_iter()
        .filter_map(|m| match m {
            UiMessage::Action(action) => Some(action),
            UiMessage::Stream(_) => None,
        })
        .collect()
}

/// Verify matched hotkeys reach the UI queue in the order they were pressed.
#[test]
fn test_actions_reach_ui_queue_in_order() {
    let (mut engine, modifiers, _gate, queue) = setup(true);
    modifiers.set(Modifiers::CTRL | Modifiers::ALT);

    for _ in 0..3 {
        assert_eq!(engine.handle(KeyEvent::down(vk::LEFT)), Verdict::Suppress);
    }
    assert_eq!(engine.handle(KeyEvent::up(vk::LEFT)), Verdict::Suppress);
    assert_eq!(engine.handle(KeyEvent::down(vk::UP)), Verdict::Suppress);
    assert_eq!(engine.handle(KeyEvent::up(vk::UP)), Verdict::Suppress);

    assert_eq!(
        actions(&queue),
        vec![
            Action::MoveLeft,
            Action::MoveLeft,
            Action::MoveLeft,
            Action::MoveUp
        ]
    );
}

/// Verify only the toggle hotkey is live while the window is hidden.
#[test]
fn test_hidden_window_only_toggles() {
    let (mut engine, modifiers, gate, queue) = setup(false);

    modifiers.set(Modifiers::CTRL | Modifiers::SHIFT);
    assert_eq!(engine.handle(KeyEvent::down(KEY_S)), Verdict::PassThrough);
    assert_eq!(engine.handle(KeyEvent::up(KEY_S)), Verdict::PassThrough);

    modifiers.set(Modifiers::CTRL);
    assert_eq!(engine.handle(KeyEvent::down(KEY_E)), Verdict::Suppress);
    assert_eq!(engine.handle(KeyEvent::up(KEY_E)), Verdict::Suppress);
    gate.set_visible(true);

    modifiers.set(Modifiers::CTRL | Modifiers::SHIFT);
    assert_eq!(engine.handle(KeyEvent::down(KEY_S)), Verdict::Suppress);
    assert_eq!(engine.handle(KeyEvent::up(KEY_S)), Verdict::Suppress);

    assert_eq!(
        actions(&queue),
        vec![Action::ToggleVisibility, Action::Screenshot]
    );
}

/// Verify a send chord held under auto-repeat fires exactly once.
#[test]
fn test_send_chord_fires_once_under_auto_repeat() {
    let (mut engine, modifiers, _gate, queue) = setup(true);
    modifiers.set(Modifiers::CTRL);

    for _ in 0..10 {
        assert_eq!(engine.handle(KeyEvent::down(vk::RETURN)), Verdict::Suppress);
    }
    assert_eq!(engine.handle(KeyEvent::up(vk::RETURN)), Verdict::Suppress);

    assert_eq!(actions(&queue), vec![Action::SendWithScreenshot]);
    assert_eq!(engine.held_count(), 0);
}

/// Verify plain typing is never swallowed.
#[test]
fn test_unbound_keys_pass_through() {
    let (mut engine, modifiers, _gate, queue) = setup(true);
    modifiers.set(Modifiers::NONE);

    for code in [KEY_E, KEY_S, vk::RETURN, vk::SPACE] {
        assert_eq!(engine.handle(KeyEvent::down(code)), Verdict::PassThrough);
        assert_eq!(engine.handle(KeyEvent::up(code)), Verdict::PassThrough);
    }
    assert!(actions(&queue).is_empty());
}
