//! Keyboard model shared by the hook engine and the hotkey tables.
//!
//! Shortcut format: `[Ctrl+][Alt+][Shift+]<e.code>`
//! where `<e.code>` is the DOM KeyboardEvent.code value (e.g., "KeyA", "Digit1", "F12").
//! Codes resolve to Windows virtual-key codes for the US layout.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Virtual-key codes the core refers to by name.
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PRIOR: u32 = 0x21;
    pub const NEXT: u32 = 0x22;
    pub const END: u32 = 0x23;
    pub const HOME: u32 = 0x24;
    pub const LEFT: u32 = 0x25;
    pub const UP: u32 = 0x26;
    pub const RIGHT: u32 = 0x27;
    pub const DOWN: u32 = 0x28;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    pub const NUMPAD0: u32 = 0x60;
    pub const F1: u32 = 0x70;
    pub const LSHIFT: u32 = 0xA0;
    pub const RSHIFT: u32 = 0xA1;
    pub const LCONTROL: u32 = 0xA2;
    pub const RCONTROL: u32 = 0xA3;
    pub const LMENU: u32 = 0xA4;
    pub const RMENU: u32 = 0xA5;
}

/// Bitmask of held modifier keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const CTRL: Self = Self(0x01);
    pub const ALT: Self = Self(0x02);
    pub const SHIFT: Self = Self(0x04);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Self::CTRL, "Ctrl+"),
            (Self::ALT, "Alt+"),
            (Self::SHIFT, "Shift+"),
        ] {
            if self.contains(flag) {
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}

/// Returns true for Ctrl/Alt/Shift and their left/right variants.
///
/// These are read as modifier state and never matched as the key of a binding.
pub fn is_modifier_key(vk_code: u32) -> bool {
    matches!(
        vk_code,
        vk::SHIFT
            | vk::CONTROL
            | vk::MENU
            | vk::LSHIFT
            | vk::RSHIFT
            | vk::LCONTROL
            | vk::RCONTROL
            | vk::LMENU
            | vk::RMENU
    )
}

/// A keyboard combination: modifier bitmask plus the virtual-key code of the main key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Binding {
    pub modifiers: Modifiers,
    pub vk_code: u32,
}

impl Binding {
    pub const fn new(modifiers: Modifiers, vk_code: u32) -> Self {
        Self { modifiers, vk_code }
    }

    /// Parses a shortcut string like "Ctrl+Alt+KeyK" into a Binding.
    ///
    /// Format: `[Ctrl+][Alt+][Shift+]<e.code>`
    ///
    /// Returns `None` if the shortcut string is empty or invalid.
    pub fn parse(shortcut: &str) -> Option<Self> {
        let shortcut = shortcut.trim();
        if shortcut.is_empty() {
            return None;
        }

        let mut modifiers = Modifiers::NONE;
        let mut key_part: Option<&str> = None;

        for part in shortcut.split('+') {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= Modifiers::CTRL,
                "alt" => modifiers |= Modifiers::ALT,
                "shift" => modifiers |= Modifiers::SHIFT,
                _ => {
                    if key_part.is_some() {
                        return None;
                    }
                    key_part = Some(part);
                }
            }
        }

        let vk_code = code_to_vk(key_part?)?;
        if is_modifier_key(vk_code) {
            return None;
        }

        Some(Self { modifiers, vk_code })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}vk 0x{:02X}", self.modifiers, self.vk_code)
    }
}

/// Converts a DOM e.code string to a Windows virtual key code.
pub fn code_to_vk(code: &str) -> Option<u32> {
    if let Some(letter) = code.strip_prefix("Key") {
        return single_char(letter)
            .filter(char::is_ascii_uppercase)
            .map(|c| c as u32);
    }
    if let Some(digit) = code.strip_prefix("Digit") {
        return single_char(digit)
            .and_then(|c| c.to_digit(10))
            .map(|d| 0x30 + d);
    }
    if let Some(digit) = code.strip_prefix("Numpad")
        && let Some(d) = single_char(digit).and_then(|c| c.to_digit(10))
    {
        return Some(vk::NUMPAD0 + d);
    }
    if let Some(n) = code.strip_prefix('F')
        && let Ok(n) = n.parse::<u32>()
    {
        return (1..=24).contains(&n).then(|| vk::F1 + n - 1);
    }

    let vk_code = match code {
        "Backspace" => vk::BACK,
        "Tab" => vk::TAB,
        "Enter" | "NumpadEnter" => vk::RETURN,
        "Escape" => vk::ESCAPE,
        "Space" => vk::SPACE,
        "PageUp" => vk::PRIOR,
        "PageDown" => vk::NEXT,
        "End" => vk::END,
        "Home" => vk::HOME,
        "ArrowLeft" => vk::LEFT,
        "ArrowUp" => vk::UP,
        "ArrowRight" => vk::RIGHT,
        "ArrowDown" => vk::DOWN,
        "Insert" => vk::INSERT,
        "Delete" => vk::DELETE,
        "Semicolon" => 0xBA,
        "Equal" => 0xBB,
        "Comma" => 0xBC,
        "Minus" => 0xBD,
        "Period" => 0xBE,
        "Slash" => 0xBF,
        "Backquote" => 0xC0,
        "BracketLeft" => 0xDB,
        "Backslash" => 0xDC,
        "BracketRight" => 0xDD,
        "Quote" => 0xDE,
        "ShiftLeft" => vk::LSHIFT,
        "ShiftRight" => vk::RSHIFT,
        "ControlLeft" => vk::LCONTROL,
        "ControlRight" => vk::RCONTROL,
        "AltLeft" => vk::LMENU,
        "AltRight" => vk::RMENU,
        _ => return None,
    };
    Some(vk_code)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

#[cfg(test)]
mod tests;
