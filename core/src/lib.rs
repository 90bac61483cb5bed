//! Core of the Whispr overlay assistant.
//!
//! Holds the global hotkey protocol (tables, hook engine, hook thread) and the
//! streaming response pipeline (worker, coordinator, chat surface model). Nothing
//! here touches a windowing API; the platform shell plugs in through the
//! [`hook::HookPump`], [`hook::ModifierSource`], [`screenshot::CaptureBackend`]
//! and [`chat::ChatSurface`] seams.

pub mod animation;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
pub mod hook;
pub mod hotkey;
pub mod keys;
pub mod screenshot;
pub mod stream;

pub use assistant::Assistant;
pub use error::{CaptureError, ConfigError, Error, HookError, SendError};
