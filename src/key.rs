//! Logical key representation shared by the input parser and the Windows
//! console translation path.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys active when a [`Key`] was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const SHIFT      = 0b0000_0001;
        const ALT        = 0b0000_0010;
        const CTRL       = 0b0000_0100;
        const SUPER      = 0b0000_1000;
        const HYPER      = 0b0001_0000;
        const META       = 0b0010_0000;
        const CAPS_LOCK  = 0b0100_0000;
        const NUM_LOCK   = 0b1000_0000;
        const SCROLL_LOCK = 0b1_0000_0000;
    }
}

impl Modifiers {
    /// Decode the Kitty/xterm modifier subparameter, which is `modifiers - 1`
    /// encoded as a bitmask: bit0 Shift, bit1 Alt, bit2 Ctrl, bit3 Super,
    /// bit4 Hyper, bit5 Meta, bit6 CapsLock, bit7 NumLock.
    pub fn from_kitty_param(param: u32) -> Self {
        if param == 0 {
            return Modifiers::empty();
        }
        let bits = param.saturating_sub(1);
        let mut m = Modifiers::empty();
        if bits & 0b0000_0001 != 0 {
            m |= Modifiers::SHIFT;
        }
        if bits & 0b0000_0010 != 0 {
            m |= Modifiers::ALT;
        }
        if bits & 0b0000_0100 != 0 {
            m |= Modifiers::CTRL;
        }
        if bits & 0b0000_1000 != 0 {
            m |= Modifiers::SUPER;
        }
        if bits & 0b0001_0000 != 0 {
            m |= Modifiers::HYPER;
        }
        if bits & 0b0010_0000 != 0 {
            m |= Modifiers::META;
        }
        if bits & 0b0100_0000 != 0 {
            m |= Modifiers::CAPS_LOCK;
        }
        if bits & 0b1000_0000 != 0 {
            m |= Modifiers::NUM_LOCK;
        }
        m
    }
}

/// The Kitty functional-key codepoint range (Unicode PUA), 57344..=57454.
pub const FUNCTIONAL_KEY_BASE: u32 = 57344;
pub const FUNCTIONAL_KEY_END: u32 = 57454;

/// Non-printable functional keys addressed by Kitty codepoint.
///
/// Discriminant values match the Kitty keyboard protocol's codepoint
/// assignments (offset from [`FUNCTIONAL_KEY_BASE`]) so `KeyCode::Functional`
/// round-trips through `as u32 + FUNCTIONAL_KEY_BASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Functional {
    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    Menu,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    KpEnter,
    KpEqual,
    KpMultiply,
    KpPlus,
    KpComma,
    KpMinus,
    KpDecimal,
    KpDivide,
    Kp0,
    Kp1,
    Kp2,
    Kp3,
    Kp4,
    Kp5,
    Kp6,
    Kp7,
    Kp8,
    Kp9,
    MediaPlay,
    MediaPause,
    MediaPlayPause,
    MediaStop,
    MediaNext,
    MediaPrevious,
    LeftShift,
    LeftControl,
    LeftAlt,
    LeftSuper,
    LeftHyper,
    LeftMeta,
    RightShift,
    RightControl,
    RightAlt,
    RightSuper,
    RightHyper,
    RightMeta,
}

/// The logical key a message reports, mirroring spec.md §3: a plain Unicode
/// scalar for printable keys, or a [`Functional`] entry drawn from the
/// Kitty PUA range for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable Unicode scalar value.
    Char(char),
    /// A non-printable / functional key.
    Functional(Functional),
}

/// A decoded keyboard event.
///
/// `shifted_code`/`base_code` carry the Kitty progressive-enhancement
/// alternate-key subparameters (`code:shifted:base`) when the terminal
/// reports them; otherwise both are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub code: KeyCode,
    pub shifted_code: Option<KeyCode>,
    pub base_code: Option<KeyCode>,
    pub modifiers: Modifiers,
    /// The textual insertion this key represents, empty when a non-text
    /// modifier is active (Ctrl/Alt/Super/Hyper/Meta), except for Shift or
    /// CapsLock which still produce text.
    pub text: Option<String>,
    pub is_repeat: bool,
}

impl Key {
    pub fn new(code: KeyCode) -> Self {
        Key {
            code,
            shifted_code: None,
            base_code: None,
            modifiers: Modifiers::empty(),
            text: None,
            is_repeat: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Plain, printable character key with no modifiers.
    pub fn char(c: char) -> Self {
        Key::new(KeyCode::Char(c)).with_text(c.to_string())
    }

    pub fn functional(f: Functional) -> Self {
        Key::new(KeyCode::Functional(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kitty_modifier_bitmask_decodes() {
        // param 6 => bits 0b101 => Shift + Ctrl
        let m = Modifiers::from_kitty_param(6);
        assert!(m.contains(Modifiers::SHIFT));
        assert!(m.contains(Modifiers::CTRL));
        assert!(!m.contains(Modifiers::ALT));
    }

    #[test]
    fn zero_param_is_no_modifier() {
        assert_eq!(Modifiers::from_kitty_param(0), Modifiers::empty());
    }

    #[test]
    fn one_param_is_no_modifier() {
        // modifiers field is (modifier-1), so literal value 1 means "no mods"
        assert_eq!(Modifiers::from_kitty_param(1), Modifiers::empty());
    }

    #[test]
    fn char_key_carries_text() {
        let k = Key::char('a');
        assert_eq!(k.text.as_deref(), Some("a"));
        assert_eq!(k.code, KeyCode::Char('a'));
    }
}
