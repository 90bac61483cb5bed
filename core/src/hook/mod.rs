//! Global keyboard hook protocol.
//!
//! [`HookEngine`] classifies key events against the hotkey tables and decides
//! which ones to swallow; [`HookThread`] owns the dedicated thread that installs
//! the platform interceptor and pumps its queue until shutdown is posted.

mod engine;
mod thread;

pub use engine::{
    ActionSink, HookEngine, KeyDirection, KeyEvent, ModifierSource, Verdict, VisibilityGate,
};
pub use thread::{HookPump, HookThread, PumpStopper};
