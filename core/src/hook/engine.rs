use crate::hotkey::{Action, HotkeyTables};
use crate::keys::{Binding, Modifiers, is_modifier_key};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// One key transition as delivered by the OS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub vk_code: u32,
    pub direction: KeyDirection,
}

impl KeyEvent {
    pub const fn down(vk_code: u32) -> Self {
        Self {
            vk_code,
            direction: KeyDirection::Down,
        }
    }

    pub const fn up(vk_code: u32) -> Self {
        Self {
            vk_code,
            direction: KeyDirection::Up,
        }
    }
}

/// What the interceptor should do with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Forward to the next hook in the chain.
    PassThrough,
    /// Consume; no other application sees the event.
    Suppress,
}

/// Reads the modifier keys held right now.
pub trait ModifierSource: Send {
    fn current(&self) -> Modifiers;
}

/// Receives matched actions on the hook thread.
///
/// Implementations must not block and must not touch UI state; they hand the
/// action off to the UI thread.
pub trait ActionSink: Send {
    fn dispatch(&self, action: Action);
}

/// Whether the main window is shown, and with it whether the conditional table is live.
///
/// Written by the UI thread when it shows or hides the window, read by the hook
/// thread once per key event, so the conditional table flips as a whole.
#[derive(Clone, Debug, Default)]
pub struct VisibilityGate(Arc<AtomicBool>);

impl VisibilityGate {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.store(visible, Ordering::Release);
    }
}

/// Key classification state machine. Lives on the hook thread only.
pub struct HookEngine {
    tables: HotkeyTables,
    gate: VisibilityGate,
    modifiers: Box<dyn ModifierSource>,
    sink: Box<dyn ActionSink>,
    /// Codes currently down whose key-down matched a binding.
    held: HashSet<u32>,
    /// Codes whose key-down was swallowed; always a subset of `held`.
    suppressed: HashSet<u32>,
}

impl HookEngine {
    pub fn new(
        tables: HotkeyTables,
        gate: VisibilityGate,
        modifiers: Box<dyn ModifierSource>,
        sink: Box<dyn ActionSink>,
    ) -> Self {
        Self {
            tables,
            gate,
            modifiers,
            sink,
            held: HashSet::new(),
            suppressed: HashSet::new(),
        }
    }

    /// Classifies one event, invoking the bound action on a fresh match.
    pub fn handle(&mut self, event: KeyEvent) -> Verdict {
        let vk_code = event.vk_code;
        if is_modifier_key(vk_code) {
            return Verdict::PassThrough;
        }

        let binding = Binding::new(self.modifiers.current(), vk_code);
        let entry = self.tables.lookup(&binding, self.gate.is_visible());

        match (entry, event.direction) {
            (Some(entry), KeyDirection::Down) => {
                if !entry.repeat && self.held.contains(&vk_code) {
                    trace!(%binding, "swallowing auto-repeat");
                    return Verdict::Suppress;
                }
                self.held.insert(vk_code);
                self.suppressed.insert(vk_code);
                trace!(%binding, action = ?entry.action, "hotkey matched");
                self.sink.dispatch(entry.action);
                Verdict::Suppress
            }
            (Some(_), KeyDirection::Up) => {
                self.held.remove(&vk_code);
                if self.suppressed.remove(&vk_code) {
                    Verdict::Suppress
                } else {
                    Verdict::PassThrough
                }
            }
            (None, KeyDirection::Up) => {
                // Chord broken mid-press (e.g. a modifier released first): the
                // down was swallowed, so the up must be too.
                if self.held.remove(&vk_code) {
                    self.suppressed.remove(&vk_code);
                    Verdict::Suppress
                } else {
                    Verdict::PassThrough
                }
            }
            (None, KeyDirection::Down) => Verdict::PassThrough,
        }
    }

    pub fn is_held(&self, vk_code: u32) -> bool {
        self.held.contains(&vk_code)
    }

    pub fn is_suppressed(&self, vk_code: u32) -> bool {
        self.suppressed.contains(&vk_code)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}
