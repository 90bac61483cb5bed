//! Custom window messages (WM_APP + N).
use windows::Win32::UI::WindowsAndMessaging::WM_APP;

/// Posted by the hook and stream worker threads after queueing a `UiMessage`.
/// The UI thread drains the whole queue on receipt.
pub const DRAIN_QUEUE: u32 = WM_APP + 1;

/// Posted by the input box when Enter is pressed.
pub const SUBMIT_INPUT: u32 = WM_APP + 2;

/// Timer keeping the overlay above other topmost windows.
pub const TIMER_TOPMOST: usize = 1;
/// Timer driving window and scroll animations.
pub const TIMER_ANIMATION: usize = 2;
