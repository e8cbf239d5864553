//! The renderer's cell buffer (spec.md §3, §9): a contiguous array of cells
//! with a width-per-line vector, avoiding per-cell heap allocation.
//! Graphemes wider than one column occupy the leftmost cell and leave a
//! sentinel zero-width cell in the following column.

use crate::color::Color;
use bitflags::bitflags;
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const SLOW_BLINK    = 1 << 3;
        const RAPID_BLINK   = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnderlineStyle {
    #[default]
    None,
    Straight,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// One monospace grid position: a grapheme plus style plus an optional
/// hyperlink. `width == 0` marks a continuation cell trailing a wide
/// grapheme stored in the preceding cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub width: u8,
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attr,
    pub underline: UnderlineStyle,
    pub link: Option<Arc<str>>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            width: 1,
            fg: Color::Default,
            bg: Color::Default,
            attrs: Attr::empty(),
            underline: UnderlineStyle::None,
            link: None,
        }
    }
}

impl Cell {
    /// A continuation cell following a wide grapheme in the previous column.
    pub fn continuation() -> Self {
        Cell {
            ch: '\0',
            width: 0,
            ..Default::default()
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    pub fn same_style(&self, other: &Cell) -> bool {
        self.fg == other.fg
            && self.bg == other.bg
            && self.attrs == other.attrs
            && self.underline == other.underline
            && self.link == other.link
    }
}

/// Pending SGR state while painting a styled string into the buffer.
#[derive(Debug, Clone, Default)]
struct PenState {
    fg: Color,
    bg: Color,
    attrs: Attr,
    underline: UnderlineStyle,
}

impl PenState {
    fn apply_sgr(&mut self, params: &[i64]) {
        if params.is_empty() {
            *self = PenState::default();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => *self = PenState::default(),
                1 => self.attrs |= Attr::BOLD,
                2 => self.attrs |= Attr::DIM,
                3 => self.attrs |= Attr::ITALIC,
                4 => self.underline = UnderlineStyle::Straight,
                5 => self.attrs |= Attr::SLOW_BLINK,
                6 => self.attrs |= Attr::RAPID_BLINK,
                7 => self.attrs |= Attr::INVERSE,
                8 => self.attrs |= Attr::HIDDEN,
                9 => self.attrs |= Attr::STRIKETHROUGH,
                22 => self.attrs.remove(Attr::BOLD | Attr::DIM),
                23 => self.attrs.remove(Attr::ITALIC),
                24 => self.underline = UnderlineStyle::None,
                25 => self.attrs.remove(Attr::SLOW_BLINK | Attr::RAPID_BLINK),
                27 => self.attrs.remove(Attr::INVERSE),
                28 => self.attrs.remove(Attr::HIDDEN),
                29 => self.attrs.remove(Attr::STRIKETHROUGH),
                30..=37 => self.fg = Color::Ansi((params[i] - 30) as u8),
                38 => {
                    if let Some((color, advance)) = parse_extended_color(&params[i + 1..]) {
                        self.fg = color;
                        i += advance;
                    }
                }
                39 => self.fg = Color::Default,
                40..=47 => self.bg = Color::Ansi((params[i] - 40) as u8),
                48 => {
                    if let Some((color, advance)) = parse_extended_color(&params[i + 1..]) {
                        self.bg = color;
                        i += advance;
                    }
                }
                49 => self.bg = Color::Default,
                90..=97 => self.fg = Color::Ansi((params[i] - 90 + 8) as u8),
                100..=107 => self.bg = Color::Ansi((params[i] - 100 + 8) as u8),
                _ => {}
            }
            i += 1;
        }
    }
}

fn parse_extended_color(rest: &[i64]) -> Option<(Color, usize)> {
    match rest.first() {
        Some(5) => rest.get(1).map(|&idx| (Color::Ansi256(idx as u8), 2)),
        Some(2) => {
            if rest.len() >= 4 {
                Some((
                    Color::Rgb(rest[1] as u8, rest[2] as u8, rest[3] as u8),
                    4,
                ))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// A fixed-capacity grid of cells sized to the viewport (alt-screen) or the
/// content height (inline mode).
#[derive(Debug, Clone)]
pub struct CellBuffer {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty: Vec<bool>,
}

impl CellBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let n = width as usize * height as usize;
        CellBuffer {
            width,
            height,
            cells: vec![Cell::default(); n],
            dirty: vec![false; height as usize],
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn row_dirty(&self, y: u16) -> bool {
        self.dirty.get(y as usize).copied().unwrap_or(false)
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = true);
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = false);
    }

    /// Resize to new dimensions. Per spec.md §4.3.1 step 2, a bounds change
    /// marks every cell dirty.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        let n = width as usize * height as usize;
        self.cells = vec![Cell::default(); n];
        self.dirty = vec![true; height as usize];
    }

    /// Reset every cell to its default style. Does not touch dirty state:
    /// callers that need a full repaint call [`mark_all_dirty`] themselves;
    /// otherwise dirtiness is computed by [`diff_against`] once the new
    /// frame has been painted.
    ///
    /// [`mark_all_dirty`]: CellBuffer::mark_all_dirty
    /// [`diff_against`]: CellBuffer::diff_against
    pub fn clear(&mut self) {
        for c in &mut self.cells {
            *c = Cell::default();
        }
    }

    /// Compare against the last-flushed shadow buffer and mark only the
    /// rows whose cells actually changed. `prev` must have the same
    /// dimensions as `self` (callers resize both buffers together).
    pub fn diff_against(&mut self, prev: &CellBuffer) {
        debug_assert_eq!(self.width, prev.width);
        debug_assert_eq!(self.height, prev.height);
        for y in 0..self.height {
            let start = self.index(0, y);
            let end = start + self.width as usize;
            let row_changed = self.cells[start..end]
                .iter()
                .zip(&prev.cells[start..end])
                .any(|(a, b)| a.ch != b.ch || a.width != b.width || !a.same_style(b));
            if row_changed {
                self.dirty[y as usize] = true;
            }
        }
    }

    fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            if self.cells[idx] != cell {
                self.dirty[y as usize] = true;
            }
            self.cells[idx] = cell;
        }
    }

    /// Paint an ANSI-styled string starting at the top-left, wrapping at
    /// `\n` and at the buffer width. Recognizes SGR (`CSI ... m`) sequences
    /// embedded in the text and carries their state across cells; any other
    /// escape sequence is passed over without being painted as text.
    pub fn paint_styled(&mut self, text: &str) {
        self.clear();
        let mut pen = PenState::default();
        let mut x: u16 = 0;
        let mut y: u16 = 0;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\n' {
                x = 0;
                y += 1;
                if y >= self.height {
                    break;
                }
                continue;
            }
            if c == '\x1b' {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    let mut raw = String::new();
                    let mut final_byte = 0u8;
                    for next in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&next) {
                            final_byte = next as u8;
                            break;
                        }
                        raw.push(next);
                    }
                    if final_byte == b'm' {
                        let params: Vec<i64> = if raw.is_empty() {
                            vec![0]
                        } else {
                            raw.split(';').map(|p| p.parse().unwrap_or(0)).collect()
                        };
                        pen.apply_sgr(&params);
                    }
                    // Non-SGR CSI sequences are swallowed: Content is a
                    // styled string, not a cursor-control stream.
                    continue;
                }
                // Lone ESC with no CSI: drop it.
                continue;
            }

            if y >= self.height {
                break;
            }
            let w = c.width().unwrap_or(0) as u8;
            if w == 0 {
                // Combining mark or zero-width char: merge into previous
                // cell's grapheme if one exists in this column.
                continue;
            }
            if x as u32 + w as u32 > self.width as u32 {
                x = 0;
                y += 1;
                if y >= self.height {
                    break;
                }
            }
            let cell = Cell {
                ch: c,
                width: w,
                fg: pen.fg,
                bg: pen.bg,
                attrs: pen.attrs,
                underline: pen.underline,
                link: None,
            };
            self.set(x, y, cell);
            if w == 2 && x + 1 < self.width {
                self.set(x + 1, y, Cell::continuation());
            }
            x += w as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_paints_cells() {
        let mut buf = CellBuffer::new(10, 2);
        buf.paint_styled("hi");
        assert_eq!(buf.get(0, 0).unwrap().ch, 'h');
        assert_eq!(buf.get(1, 0).unwrap().ch, 'i');
    }

    #[test]
    fn sgr_bold_applies_to_following_cells() {
        let mut buf = CellBuffer::new(10, 1);
        buf.paint_styled("\x1b[1mhi\x1b[0m");
        assert!(buf.get(0, 0).unwrap().attrs.contains(Attr::BOLD));
        assert!(!buf.get(0, 0).unwrap().attrs.is_empty());
    }

    #[test]
    fn sgr_reset_clears_style() {
        let mut buf = CellBuffer::new(10, 1);
        buf.paint_styled("\x1b[1mx\x1b[0my");
        assert!(buf.get(0, 0).unwrap().attrs.contains(Attr::BOLD));
        assert!(buf.get(1, 0).unwrap().attrs.is_empty());
    }

    #[test]
    fn wide_char_leaves_continuation_cell() {
        let mut buf = CellBuffer::new(10, 1);
        buf.paint_styled("\u{4f60}"); // 你, width 2
        assert_eq!(buf.get(0, 0).unwrap().width, 2);
        assert!(buf.get(1, 0).unwrap().is_continuation());
    }

    #[test]
    fn newline_advances_row() {
        let mut buf = CellBuffer::new(10, 2);
        buf.paint_styled("a\nb");
        assert_eq!(buf.get(0, 0).unwrap().ch, 'a');
        assert_eq!(buf.get(0, 1).unwrap().ch, 'b');
    }

    #[test]
    fn resize_marks_all_dirty() {
        let mut buf = CellBuffer::new(5, 5);
        buf.clear_dirty();
        buf.resize(10, 10);
        assert!(buf.row_dirty(0));
    }

    #[test]
    fn resize_to_same_dims_is_noop() {
        let mut buf = CellBuffer::new(5, 5);
        buf.clear_dirty();
        buf.resize(5, 5);
        assert!(!buf.row_dirty(0));
    }

    #[test]
    fn extended_256_color_parses() {
        let mut buf = CellBuffer::new(10, 1);
        buf.paint_styled("\x1b[38;5;196mx");
        assert_eq!(buf.get(0, 0).unwrap().fg, Color::Ansi256(196));
    }

    #[test]
    fn extended_truecolor_parses() {
        let mut buf = CellBuffer::new(10, 1);
        buf.paint_styled("\x1b[38;2;10;20;30mx");
        assert_eq!(buf.get(0, 0).unwrap().fg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn clear_does_not_mark_dirty() {
        let mut buf = CellBuffer::new(5, 5);
        buf.clear_dirty();
        buf.clear();
        assert!(!buf.row_dirty(0));
    }

    #[test]
    fn diff_against_only_marks_changed_rows() {
        let mut prev = CellBuffer::new(10, 2);
        prev.paint_styled("Hello\nWorld");
        prev.clear_dirty();

        let mut cur = CellBuffer::new(10, 2);
        cur.paint_styled("Hello\nEarth");
        cur.clear_dirty();

        cur.diff_against(&prev);
        assert!(!cur.row_dirty(0));
        assert!(cur.row_dirty(1));
    }

    #[test]
    fn diff_against_identical_frame_marks_nothing() {
        let mut prev = CellBuffer::new(10, 2);
        prev.paint_styled("Hello\nWorld");
        prev.clear_dirty();

        let mut cur = CellBuffer::new(10, 2);
        cur.paint_styled("Hello\nWorld");
        cur.clear_dirty();

        cur.diff_against(&prev);
        assert!(!cur.row_dirty(0));
        assert!(!cur.row_dirty(1));
    }
}
