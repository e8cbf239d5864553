//! Pure ANSI/VT escape-sequence emission. No terminal state is read here;
//! every function just appends bytes for a fully-specified transition.
//! Adapted from the pack's differential terminal renderer's ANSI module,
//! retargeted at this crate's simplified [`Color`] type.

use crate::cellbuf::{Attr, UnderlineStyle};
use crate::color::Color;
use crate::view::{CursorShape, KeyboardEnhancements};
use std::fmt::Write;

pub fn cursor_to(out: &mut String, x: u16, y: u16) {
    let _ = write!(out, "\x1b[{};{}H", y + 1, x + 1);
}

pub fn cursor_up(out: &mut String, n: u16) {
    if n > 0 {
        let _ = write!(out, "\x1b[{n}A");
    }
}

pub fn cursor_down(out: &mut String, n: u16) {
    if n > 0 {
        let _ = write!(out, "\x1b[{n}B");
    }
}

pub fn cursor_forward(out: &mut String, n: u16) {
    if n > 0 {
        let _ = write!(out, "\x1b[{n}C");
    }
}

pub fn cursor_back(out: &mut String, n: u16) {
    if n > 0 {
        let _ = write!(out, "\x1b[{n}D");
    }
}

pub fn cursor_hide(out: &mut String) {
    out.push_str("\x1b[?25l");
}

pub fn cursor_show(out: &mut String) {
    out.push_str("\x1b[?25h");
}

pub fn cursor_shape(out: &mut String, shape: CursorShape, blink: bool) {
    let n = match (shape, blink) {
        (CursorShape::Block, true) => 1,
        (CursorShape::Block, false) => 2,
        (CursorShape::Underline, true) => 3,
        (CursorShape::Underline, false) => 4,
        (CursorShape::Bar, true) => 5,
        (CursorShape::Bar, false) => 6,
    };
    let _ = write!(out, "\x1b[{n} q");
}

pub fn erase_line_right(out: &mut String) {
    out.push_str("\x1b[K");
}

pub fn clear_screen(out: &mut String) {
    out.push_str("\x1b[2J\x1b[H");
}

pub fn reset_sgr(out: &mut String) {
    out.push_str("\x1b[0m");
}

pub fn fg(out: &mut String, color: Color) {
    match color {
        Color::Default => out.push_str("\x1b[39m"),
        Color::Ansi(n) if n < 8 => {
            let _ = write!(out, "\x1b[{}m", 30 + n);
        }
        Color::Ansi(n) => {
            let _ = write!(out, "\x1b[{}m", 90 + (n - 8));
        }
        Color::Ansi256(n) => {
            let _ = write!(out, "\x1b[38;5;{n}m");
        }
        Color::Rgb(r, g, b) => {
            let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
        }
    }
}

pub fn bg(out: &mut String, color: Color) {
    match color {
        Color::Default => out.push_str("\x1b[49m"),
        Color::Ansi(n) if n < 8 => {
            let _ = write!(out, "\x1b[{}m", 40 + n);
        }
        Color::Ansi(n) => {
            let _ = write!(out, "\x1b[{}m", 100 + (n - 8));
        }
        Color::Ansi256(n) => {
            let _ = write!(out, "\x1b[48;5;{n}m");
        }
        Color::Rgb(r, g, b) => {
            let _ = write!(out, "\x1b[48;2;{r};{g};{b}m");
        }
    }
}

pub fn attrs(out: &mut String, a: Attr) {
    if a.is_empty() {
        return;
    }
    let mut codes = Vec::new();
    if a.contains(Attr::BOLD) {
        codes.push("1");
    }
    if a.contains(Attr::DIM) {
        codes.push("2");
    }
    if a.contains(Attr::ITALIC) {
        codes.push("3");
    }
    if a.contains(Attr::SLOW_BLINK) {
        codes.push("5");
    }
    if a.contains(Attr::RAPID_BLINK) {
        codes.push("6");
    }
    if a.contains(Attr::INVERSE) {
        codes.push("7");
    }
    if a.contains(Attr::HIDDEN) {
        codes.push("8");
    }
    if a.contains(Attr::STRIKETHROUGH) {
        codes.push("9");
    }
    let _ = write!(out, "\x1b[{}m", codes.join(";"));
}

pub fn underline(out: &mut String, style: UnderlineStyle) {
    match style {
        UnderlineStyle::None => out.push_str("\x1b[24m"),
        UnderlineStyle::Straight => out.push_str("\x1b[4:1m"),
        UnderlineStyle::Double => out.push_str("\x1b[4:2m"),
        UnderlineStyle::Curly => out.push_str("\x1b[4:3m"),
        UnderlineStyle::Dotted => out.push_str("\x1b[4:4m"),
        UnderlineStyle::Dashed => out.push_str("\x1b[4:5m"),
    }
}

pub fn begin_sync(out: &mut String) {
    out.push_str("\x1b[?2026h");
}

pub fn end_sync(out: &mut String) {
    out.push_str("\x1b[?2026l");
}

pub fn enter_alt_screen(out: &mut String) {
    out.push_str("\x1b[?1049h");
}

pub fn exit_alt_screen(out: &mut String) {
    out.push_str("\x1b[?1049l");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseMode {
    Off,
    Click,
    AllMotion,
}

pub fn set_mouse_mode(out: &mut String, mode: MouseMode) {
    match mode {
        MouseMode::Off => out.push_str("\x1b[?1000l\x1b[?1002l\x1b[?1003l\x1b[?1006l"),
        MouseMode::Click => out.push_str("\x1b[?1000h\x1b[?1002h\x1b[?1006h"),
        MouseMode::AllMotion => out.push_str("\x1b[?1000h\x1b[?1003h\x1b[?1006h"),
    }
}

pub fn enable_kitty_keyboard(out: &mut String, ke: &KeyboardEnhancements) {
    let _ = write!(out, "\x1b[>{};1u", ke.flag_bits());
}

pub fn disable_kitty_keyboard(out: &mut String) {
    out.push_str("\x1b[<u");
}

pub fn enable_bracketed_paste(out: &mut String) {
    out.push_str("\x1b[?2004h");
}

pub fn disable_bracketed_paste(out: &mut String) {
    out.push_str("\x1b[?2004l");
}

pub fn enable_focus_reporting(out: &mut String) {
    out.push_str("\x1b[?1004h");
}

pub fn disable_focus_reporting(out: &mut String) {
    out.push_str("\x1b[?1004l");
}

pub fn set_window_title(out: &mut String, title: &str) {
    let _ = write!(out, "\x1b]0;{title}\x07");
}

pub fn set_fg_color(out: &mut String, color: Color) {
    if let Color::Rgb(r, g, b) = color {
        let _ = write!(out, "\x1b]10;rgb:{r:02x}/{g:02x}/{b:02x}\x1b\\");
    }
}

pub fn set_bg_color(out: &mut String, color: Color) {
    if let Color::Rgb(r, g, b) = color {
        let _ = write!(out, "\x1b]11;rgb:{r:02x}/{g:02x}/{b:02x}\x1b\\");
    }
}

pub fn set_cursor_color(out: &mut String, color: Color) {
    if let Color::Rgb(r, g, b) = color {
        let _ = write!(out, "\x1b]12;rgb:{r:02x}/{g:02x}/{b:02x}\x1b\\");
    }
}

pub fn reset_fg_color(out: &mut String) {
    out.push_str("\x1b]110\x07");
}

pub fn reset_bg_color(out: &mut String) {
    out.push_str("\x1b]111\x07");
}

pub fn reset_cursor_color(out: &mut String) {
    out.push_str("\x1b]112\x07");
}

pub fn set_progress_bar(out: &mut String, state: u8, value: u8) {
    let _ = write!(out, "\x1b]9;4;{state};{value}\x07");
}

pub fn clear_progress_bar(out: &mut String) {
    out.push_str("\x1b]9;4;0;0\x07");
}

pub fn request_window_size(out: &mut String) {
    out.push_str("\x1b[18t");
}

pub fn request_cursor_position(out: &mut String) {
    out.push_str("\x1b[6n");
}

pub fn request_kitty_keyboard_flags(out: &mut String) {
    out.push_str("\x1b[?u");
}

/// OSC 52 clipboard set. `selector` is `c` for the system clipboard or
/// `p` for the primary selection.
pub fn set_clipboard(out: &mut String, selector: char, content: &str) {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(content.as_bytes());
    let _ = write!(out, "\x1b]52;{selector};{encoded}\x07");
}

/// OSC 52 clipboard query; the terminal replies with the same sequence
/// carrying the base64 payload instead of `?`.
pub fn request_clipboard(out: &mut String, selector: char) {
    let _ = write!(out, "\x1b]52;{selector};?\x07");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_to_is_one_indexed() {
        let mut s = String::new();
        cursor_to(&mut s, 0, 0);
        assert_eq!(s, "\x1b[1;1H");
    }

    #[test]
    fn truecolor_fg_emits_38_2() {
        let mut s = String::new();
        fg(&mut s, Color::Rgb(1, 2, 3));
        assert_eq!(s, "\x1b[38;2;1;2;3m");
    }

    #[test]
    fn ansi_bright_bg_uses_100_range() {
        let mut s = String::new();
        bg(&mut s, Color::Ansi(9));
        assert_eq!(s, "\x1b[101m");
    }

    #[test]
    fn kitty_enable_uses_gt_u() {
        let mut s = String::new();
        enable_kitty_keyboard(&mut s, &KeyboardEnhancements::default());
        assert_eq!(s, "\x1b[>0;1u");
    }

    #[test]
    fn kitty_disable_uses_lt_u() {
        let mut s = String::new();
        disable_kitty_keyboard(&mut s);
        assert_eq!(s, "\x1b[<u");
    }

    #[test]
    fn mouse_all_motion_sets_1003() {
        let mut s = String::new();
        set_mouse_mode(&mut s, MouseMode::AllMotion);
        assert!(s.contains("?1003h"));
    }
}
