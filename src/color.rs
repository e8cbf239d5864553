//! Color profile detection and the compact color type views carry.
//!
//! Grounded on the pack's differential terminal renderer's `CellColor`
//! enum, stripped of its OKLCH perceptual-color machinery: this runtime
//! only needs to know how to *emit* a color, not blend or gamut-map one.

use std::collections::HashMap;

/// The five color capability tiers a terminal can be detected as supporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorProfile {
    TrueColor,
    Ansi256,
    Ansi,
    Ascii,
    NoTty,
}

impl ColorProfile {
    /// Detect from an environment variable snapshot, per spec.md §6.
    ///
    /// `is_tty` should reflect whether the output stream is a terminal;
    /// when false the profile is always [`ColorProfile::NoTty`] regardless
    /// of env vars, matching the runtime's "degrade gracefully when piped"
    /// behavior.
    pub fn detect(environ: &HashMap<String, String>, is_tty: bool) -> Self {
        if !is_tty {
            return ColorProfile::NoTty;
        }
        if environ.get("NO_COLOR").is_some() {
            return ColorProfile::Ascii;
        }
        if environ
            .get("CLICOLOR_FORCE")
            .map(|v| v != "0")
            .unwrap_or(false)
        {
            // Forced color even without a recognized terminal; assume ANSI.
        } else if environ.get("CLICOLOR").map(|v| v == "0").unwrap_or(false) {
            return ColorProfile::Ascii;
        }

        let colorterm = environ.get("COLORTERM").map(String::as_str).unwrap_or("");
        if colorterm == "truecolor" || colorterm == "24bit" {
            return ColorProfile::TrueColor;
        }

        let term_program = environ
            .get("TERM_PROGRAM")
            .map(String::as_str)
            .unwrap_or("");
        if matches!(
            term_program,
            "iTerm.app" | "WezTerm" | "vscode" | "Apple_Terminal" | "ghostty"
        ) {
            return ColorProfile::TrueColor;
        }

        let term = environ.get("TERM").map(String::as_str).unwrap_or("");
        if term.contains("256color") {
            ColorProfile::Ansi256
        } else if term.contains("color") || term == "screen" || term.starts_with("xterm") {
            ColorProfile::Ansi
        } else if term == "dumb" || term.is_empty() {
            ColorProfile::Ascii
        } else {
            ColorProfile::Ansi
        }
    }
}

/// A color carried by a [`crate::view::View`] field. Kept deliberately thin:
/// the renderer only needs to turn this into SGR/OSC bytes, never to mix or
/// gamut-map it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Rgb(u8, u8, u8),
    Ansi256(u8),
    /// One of the 16 standard ANSI colors (0..=15).
    Ansi(u8),
    Default,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r, g, b)
    }

    /// Parse a `#rrggbb` or `#rgb` hex literal.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        match s.len() {
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16).ok()?;
                let g = u8::from_str_radix(&s[2..4], 16).ok()?;
                let b = u8::from_str_radix(&s[4..6], 16).ok()?;
                Some(Color::Rgb(r, g, b))
            }
            3 => {
                let r = u8::from_str_radix(&s[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&s[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&s[2..3].repeat(2), 16).ok()?;
                Some(Color::Rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Downgrade to what `profile` can express.
    pub fn clamp_to_profile(self, profile: ColorProfile) -> Option<Self> {
        match profile {
            ColorProfile::NoTty | ColorProfile::Ascii => None,
            ColorProfile::TrueColor => Some(self),
            ColorProfile::Ansi256 => match self {
                Color::Rgb(r, g, b) => Some(Color::Ansi256(ansi::nearest_ansi256(r, g, b))),
                other => Some(other),
            },
            ColorProfile::Ansi => match self {
                Color::Rgb(r, g, b) => Some(Color::Ansi(ansi::nearest_ansi16(r, g, b))),
                Color::Ansi256(idx) => {
                    let (r, g, b) = ansi::ansi256_to_rgb(idx);
                    Some(Color::Ansi(ansi::nearest_ansi16(r, g, b)))
                }
                other => Some(other),
            },
        }
    }
}

/// ANSI palette conversion helpers, adapted from the pack's terminal-
/// renderer color table.
pub mod ansi {
    pub const ANSI16_RGB: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (205, 0, 0),
        (0, 205, 0),
        (205, 205, 0),
        (0, 0, 238),
        (205, 0, 205),
        (0, 205, 205),
        (229, 229, 229),
        (127, 127, 127),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (92, 92, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];

    pub fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
        match idx {
            0..=15 => ANSI16_RGB[idx as usize],
            16..=231 => {
                let i = idx - 16;
                let r = i / 36;
                let g = (i % 36) / 6;
                let b = i % 6;
                let scale = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
                (scale(r), scale(g), scale(b))
            }
            232..=255 => {
                let v = 8 + (idx - 232) * 10;
                (v, v, v)
            }
        }
    }

    fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
        let dr = a.0 as i32 - b.0 as i32;
        let dg = a.1 as i32 - b.1 as i32;
        let db = a.2 as i32 - b.2 as i32;
        dr * dr + dg * dg + db * db
    }

    pub fn nearest_ansi256(r: u8, g: u8, b: u8) -> u8 {
        let target = (r, g, b);
        (0u16..256)
            .map(|i| i as u8)
            .min_by_key(|&i| dist2(target, ansi256_to_rgb(i)))
            .unwrap_or(0)
    }

    pub fn nearest_ansi16(r: u8, g: u8, b: u8) -> u8 {
        let target = (r, g, b);
        (0u8..16)
            .min_by_key(|&i| dist2(target, ANSI16_RGB[i as usize]))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tty_always_wins() {
        let env = HashMap::new();
        assert_eq!(ColorProfile::detect(&env, false), ColorProfile::NoTty);
    }

    #[test]
    fn no_color_forces_ascii() {
        let mut env = HashMap::new();
        env.insert("NO_COLOR".to_string(), "1".to_string());
        assert_eq!(ColorProfile::detect(&env, true), ColorProfile::Ascii);
    }

    #[test]
    fn colorterm_truecolor_detected() {
        let mut env = HashMap::new();
        env.insert("COLORTERM".to_string(), "truecolor".to_string());
        assert_eq!(ColorProfile::detect(&env, true), ColorProfile::TrueColor);
    }

    #[test]
    fn term_256color_detected() {
        let mut env = HashMap::new();
        env.insert("TERM".to_string(), "xterm-256color".to_string());
        assert_eq!(ColorProfile::detect(&env, true), ColorProfile::Ansi256);
    }

    #[test]
    fn hex_parses() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("f00"), Some(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn ansi256_roundtrips_grayscale() {
        let (r, g, b) = ansi::ansi256_to_rgb(232);
        assert_eq!((r, g, b), (8, 8, 8));
    }

    #[test]
    fn clamp_drops_color_for_ascii() {
        assert_eq!(
            Color::Rgb(10, 20, 30).clamp_to_profile(ColorProfile::Ascii),
            None
        );
    }
}
