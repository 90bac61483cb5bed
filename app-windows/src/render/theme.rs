//! Colors and layout constants.

use windows::Win32::Foundation::COLORREF;

/// Builds a COLORREF from RGB components (COLORREF stores 0x00BBGGRR).
const fn rgb(r: u8, g: u8, b: u8) -> COLORREF {
    COLORREF((r as u32) | ((g as u32) << 8) | ((b as u32) << 16))
}

pub const COLOR_BG: COLORREF = rgb(24, 24, 27);
pub const COLOR_TEXT: COLORREF = rgb(228, 228, 231);
pub const COLOR_MUTED: COLORREF = rgb(161, 161, 170);
pub const COLOR_USER_BUBBLE: COLORREF = rgb(37, 99, 235);
pub const COLOR_ASSISTANT_BUBBLE: COLORREF = rgb(39, 39, 42);
pub const COLOR_ERROR_BUBBLE: COLORREF = rgb(127, 29, 29);

pub const EDIT_BG_COLORREF: COLORREF = rgb(39, 39, 42);
pub const EDIT_TEXT_COLORREF: COLORREF = COLOR_TEXT;

/// Padding around the chat area and between bubbles.
pub const PADDING: i32 = 12;
/// Padding inside a bubble.
pub const BUBBLE_PADDING: i32 = 10;
pub const BUBBLE_RADIUS: i32 = 14;
/// Bubbles never exceed this share of the chat width, in percent.
pub const BUBBLE_MAX_WIDTH_PERCENT: i32 = 80;

/// Height of the input box at the bottom of the window.
pub const INPUT_HEIGHT: i32 = 32;
