//! The declarative frame contract a [`crate::model::Model`] produces per
//! tick (spec.md §3). This replaces the source framework's legacy
//! imperative "toggle" commands (`EnterAltScreen`, `HideCursor`, …): those
//! are sugar that should set the corresponding field for the next render
//! rather than being modeled as distinct control messages.

use crate::color::Color;
use crate::mouse::Mouse;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseMode {
    #[default]
    None,
    CellMotion,
    AllMotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
    pub shape: CursorShape,
    pub blink: bool,
    pub color: Option<Color>,
}

impl Cursor {
    pub fn new(x: u16, y: u16) -> Self {
        Cursor {
            x,
            y,
            shape: CursorShape::default(),
            blink: true,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProgressState {
    #[default]
    None,
    Default,
    Error,
    Indeterminate,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressBar {
    pub state: ProgressState,
    /// 0..=100
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardEnhancements {
    pub report_event_types: bool,
    pub report_alternate_keys: bool,
    pub report_all_keys_as_escape_codes: bool,
}

impl KeyboardEnhancements {
    /// Kitty progressive-enhancement flag bits: 1 disambiguate (always on
    /// when any enhancement is requested), 2 report event types, 4 report
    /// alternate keys, 8 report all keys as escape codes.
    pub fn flag_bits(&self) -> u8 {
        let mut bits = 0u8;
        if self.report_event_types || self.report_alternate_keys || self.report_all_keys_as_escape_codes {
            bits |= 0b0001;
        }
        if self.report_event_types {
            bits |= 0b0010;
        }
        if self.report_alternate_keys {
            bits |= 0b0100;
        }
        if self.report_all_keys_as_escape_codes {
            bits |= 0b1000;
        }
        bits
    }
}

/// View-scoped mouse dispatch: a callback from a mouse message to an
/// optional follow-up command, consulted by the orchestrator before the
/// message reaches `Model::update`.
pub type OnMouse = Arc<dyn Fn(Mouse) -> Option<crate::message::Cmd> + Send + Sync>;

/// The declarative frame a `Model::view` call produces.
///
/// Invariants (spec.md §3):
/// - every field is consulted on every flush; the renderer emits a mode
///   transition only when the field changed since the previously-flushed
///   view.
/// - `cursor == None` implies the cursor is hidden.
/// - an `alt_screen` change always forces a full redraw of the next frame.
#[derive(Clone)]
pub struct View {
    pub content: String,
    pub alt_screen: bool,
    pub mouse_mode: MouseMode,
    pub report_focus: bool,
    pub disable_bracketed_paste: bool,
    pub window_title: String,
    pub foreground_color: Option<Color>,
    pub background_color: Option<Color>,
    pub cursor: Option<Cursor>,
    pub progress_bar: Option<ProgressBar>,
    pub keyboard_enhancements: KeyboardEnhancements,
    pub on_mouse: Option<OnMouse>,
}

impl Default for View {
    fn default() -> Self {
        View {
            content: String::new(),
            alt_screen: false,
            mouse_mode: MouseMode::None,
            report_focus: false,
            disable_bracketed_paste: false,
            window_title: String::new(),
            foreground_color: None,
            background_color: None,
            cursor: None,
            progress_bar: None,
            keyboard_enhancements: KeyboardEnhancements::default(),
            on_mouse: None,
        }
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("content", &self.content)
            .field("alt_screen", &self.alt_screen)
            .field("mouse_mode", &self.mouse_mode)
            .field("report_focus", &self.report_focus)
            .field("disable_bracketed_paste", &self.disable_bracketed_paste)
            .field("window_title", &self.window_title)
            .field("foreground_color", &self.foreground_color)
            .field("background_color", &self.background_color)
            .field("cursor", &self.cursor)
            .field("progress_bar", &self.progress_bar)
            .field("keyboard_enhancements", &self.keyboard_enhancements)
            .field("on_mouse", &self.on_mouse.is_some())
            .finish()
    }
}

impl PartialEq for View {
    /// Field-by-field comparison per spec.md §4.3.1 step 1. `on_mouse` is
    /// compared only by presence: closures aren't comparable, and whether a
    /// view wants mouse dispatch at all is the only thing diffing cares
    /// about.
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.alt_screen == other.alt_screen
            && self.mouse_mode == other.mouse_mode
            && self.report_focus == other.report_focus
            && self.disable_bracketed_paste == other.disable_bracketed_paste
            && self.window_title == other.window_title
            && self.foreground_color == other.foreground_color
            && self.background_color == other.background_color
            && self.cursor == other.cursor
            && self.progress_bar == other.progress_bar
            && self.keyboard_enhancements == other.keyboard_enhancements
            && self.on_mouse.is_some() == other.on_mouse.is_some()
    }
}

impl View {
    pub fn new(content: impl Into<String>) -> Self {
        View {
            content: content.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_has_no_cursor() {
        let v = View::default();
        assert!(v.cursor.is_none());
    }

    #[test]
    fn equal_views_compare_equal() {
        let a = View::new("hello");
        let b = View::new("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn differing_content_not_equal() {
        let a = View::new("hello");
        let b = View::new("world");
        assert_ne!(a, b);
    }

    #[test]
    fn kitty_flag_bits_always_set_disambiguate_when_any_flag_on() {
        let ke = KeyboardEnhancements {
            report_event_types: true,
            ..Default::default()
        };
        assert_eq!(ke.flag_bits() & 0b0001, 0b0001);
        assert_eq!(ke.flag_bits() & 0b0010, 0b0010);
    }

    #[test]
    fn no_enhancements_means_zero_flags() {
        assert_eq!(KeyboardEnhancements::default().flag_bits(), 0);
    }
}
