use super::*;

fn parse_vk(shortcut: &str) -> Option<u32> {
    Binding::parse(shortcut).map(|b| b.vk_code)
}

#[test]
fn parse_letters() {
    // KeyA-KeyZ should map to VK 0x41-0x5A
    assert_eq!(parse_vk("Ctrl+KeyA"), Some(0x41));
    assert_eq!(parse_vk("Ctrl+KeyZ"), Some(0x5A));
    assert_eq!(parse_vk("Ctrl+KeyE"), Some(0x45));
}

#[test]
fn parse_digits() {
    assert_eq!(parse_vk("Ctrl+Digit0"), Some(0x30));
    assert_eq!(parse_vk("Ctrl+Digit9"), Some(0x39));
    assert_eq!(parse_vk("Alt+Numpad5"), Some(0x65));
}

#[test]
fn parse_function_keys() {
    assert_eq!(parse_vk("Alt+F1"), Some(0x70));
    assert_eq!(parse_vk("Alt+F12"), Some(0x7B));
    assert_eq!(parse_vk("F24"), Some(0x87));
    assert_eq!(parse_vk("F25"), None);
    assert_eq!(parse_vk("F0"), None);
}

#[test]
fn parse_arrow_keys() {
    assert_eq!(parse_vk("Ctrl+Alt+ArrowUp"), Some(vk::UP));
    assert_eq!(parse_vk("Ctrl+Alt+ArrowDown"), Some(vk::DOWN));
    assert_eq!(parse_vk("Ctrl+Alt+ArrowLeft"), Some(vk::LEFT));
    assert_eq!(parse_vk("Ctrl+Alt+ArrowRight"), Some(vk::RIGHT));
}

#[test]
fn parse_special_keys() {
    assert_eq!(parse_vk("Ctrl+Space"), Some(0x20));
    assert_eq!(parse_vk("Ctrl+Tab"), Some(0x09));
    assert_eq!(parse_vk("Ctrl+Enter"), Some(0x0D));
    assert_eq!(parse_vk("Ctrl+Escape"), Some(0x1B));
    assert_eq!(parse_vk("Ctrl+Backspace"), Some(0x08));
    assert_eq!(parse_vk("Ctrl+Slash"), Some(0xBF));
}

#[test]
fn parse_modifiers() {
    let binding = Binding::parse("Ctrl+Alt+KeyK").unwrap();
    assert_eq!(binding.modifiers, Modifiers::CTRL | Modifiers::ALT);

    let binding = Binding::parse("ctrl + shift + KeyA").unwrap();
    assert_eq!(binding.modifiers, Modifiers::CTRL | Modifiers::SHIFT);

    let binding = Binding::parse("Enter").unwrap();
    assert!(binding.modifiers.is_empty());
}

#[test]
fn parse_empty_returns_none() {
    assert!(Binding::parse("").is_none());
    assert!(Binding::parse("   ").is_none());
}

#[test]
fn parse_invalid_returns_none() {
    assert!(Binding::parse("Ctrl+InvalidKey").is_none());
    assert!(Binding::parse("Ctrl+").is_none());
    assert!(Binding::parse("Ctrl+KeyA+KeyB").is_none()); // Two keys
    assert!(Binding::parse("Ctrl+Keya").is_none());
    assert!(Binding::parse("Win+KeyA").is_none());
}

#[test]
fn modifier_keys_cannot_be_bound() {
    assert!(Binding::parse("Ctrl+ShiftLeft").is_none());
    assert!(Binding::parse("AltRight").is_none());
}

#[test]
fn modifier_codes_are_recognised() {
    for code in [0x10, 0x11, 0x12, 0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5] {
        assert!(is_modifier_key(code), "0x{code:02X}");
    }
    assert!(!is_modifier_key(vk::LEFT));
    assert!(!is_modifier_key(0x45));
}

#[test]
fn binding_display() {
    let binding = Binding::parse("Ctrl+Shift+ArrowUp").unwrap();
    assert_eq!(binding.to_string(), "Ctrl+Shift+vk 0x26");
}
