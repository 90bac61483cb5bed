//! Win32 platform layer.

pub mod hook;
pub mod screenshot;
pub mod tray;
pub mod window;
pub mod wm;
