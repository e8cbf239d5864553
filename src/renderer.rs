//! Frame reconciliation (spec.md §4.3). Owns the current and
//! previously-flushed [`CellBuffer`]s, computes the minimal ANSI update
//! stream between them, and manages every mode that this crate's renderer
//! toggles (alt-screen, mouse, bracketed paste, focus, keyboard
//! enhancements, colors, cursor, progress bar).
//!
//! Grounded on the pack's differential terminal renderer (`diff.rs`'s
//! resize/full-redraw handling and synchronized-output wrapping, and
//! `output.rs`'s `CellWriter` stateful last-position/last-style tracking
//! that informs the cursor-movement-encoding cost heuristics below).

use crate::ansi;
use crate::cellbuf::{Cell, CellBuffer};
use crate::view::{MouseMode, View};
use parking_lot::Mutex;
use std::io::Write;

struct Inner {
    output: Box<dyn Write + Send>,
    ext_width: u16,
    ext_height: u16,
    /// Scratch buffer the current frame is painted into.
    buffer: CellBuffer,
    /// The cell contents actually written to the terminal on the previous
    /// flush. `buffer` is diffed against this to find the minimal update;
    /// swapped with `buffer` at the end of every flush so it always holds
    /// what's really on screen without a per-frame clone.
    shadow: CellBuffer,
    pending: Option<View>,
    last_flushed: Option<View>,
    last_cursor: (u16, u16),
    above_lines: Vec<String>,
    first_render: bool,
    last_bytes_written: usize,
}

/// Owns the terminal output writer and the cell buffers. Guarded by a
/// mutex because the render ticker task and the dispatcher both touch it
/// (spec.md §5's shared-resource policy).
pub struct Renderer {
    inner: Mutex<Inner>,
}

impl Renderer {
    pub fn new(output: Box<dyn Write + Send>, width: u16, height: u16) -> Self {
        Renderer {
            inner: Mutex::new(Inner {
                output,
                ext_width: width,
                ext_height: height,
                buffer: CellBuffer::new(width, height.max(1)),
                shadow: CellBuffer::new(width, height.max(1)),
                pending: None,
                last_flushed: None,
                last_cursor: (0, 0),
                above_lines: Vec::new(),
                first_render: true,
                last_bytes_written: 0,
            }),
        }
    }

    /// Stash `v` as the pending frame; actual diffing happens in [`flush`].
    pub fn render(&self, v: View) {
        self.inner.lock().pending = Some(v);
    }

    /// Update the external terminal size (alt-screen dimensions). Per
    /// spec.md §4.3.1 step 2, a bounds change marks every cell dirty.
    pub fn resize(&self, width: u16, height: u16) {
        let mut inner = self.inner.lock();
        inner.ext_width = width;
        inner.ext_height = height;
    }

    /// Queue a line to be inserted above the inline frame on the next
    /// flush (spec.md §4.3.4). Ignored while `alt_screen` is the active
    /// mode — the spec's stated "safe behavior" for the relevant open
    /// question.
    pub fn print_line_above(&self, line: String) {
        let mut inner = self.inner.lock();
        let alt_screen = inner
            .last_flushed
            .as_ref()
            .map(|v| v.alt_screen)
            .unwrap_or(false);
        if !alt_screen {
            inner.above_lines.push(line);
        }
    }

    pub fn last_bytes_written(&self) -> usize {
        self.inner.lock().last_bytes_written
    }

    /// Force every cell dirty and drop the previously-flushed view, so the
    /// next [`flush`] re-emits every mode transition and repaints the whole
    /// frame. Used when resuming after the terminal was released to an
    /// external process (spec.md §4.5, §4.6): the child may have scribbled
    /// over the screen and left modes in an unknown state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.last_flushed = None;
        // `first_render` forces the next flush to treat the shadow as
        // untrustworthy and repaint every cell (the child process may have
        // scribbled over the screen), so there's no need to pre-mark the
        // buffer dirty here.
        inner.first_render = true;
    }

    /// Write bytes straight to the output, bypassing the diff pipeline.
    /// Used for one-shot device queries (window size, cursor position,
    /// keyboard-enhancement flags, clipboard get/set) that don't belong
    /// in the frame buffer.
    pub fn write_raw(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut inner = self.inner.lock();
        inner.output.write_all(bytes)?;
        inner.output.flush()
    }

    /// Run the 8-step frame-reconciliation algorithm (spec.md §4.3.1).
    pub fn flush(&self, closing: bool) -> std::io::Result<()> {
        let mut inner = self.inner.lock();
        let view = match inner.pending.take() {
            Some(v) => v,
            None => {
                inner.last_bytes_written = 0;
                return Ok(());
            }
        };

        let target_width = inner.ext_width;
        let target_height = if view.alt_screen {
            inner.ext_height
        } else {
            inline_height(&view.content)
        };

        let bounds_changed =
            target_width != inner.buffer.width || target_height != inner.buffer.height;
        let alt_screen_changed = inner
            .last_flushed
            .as_ref()
            .map(|prev| prev.alt_screen != view.alt_screen)
            .unwrap_or(view.alt_screen);

        if !bounds_changed && !alt_screen_changed && inner.last_flushed.as_ref() == Some(&view) && !inner.first_render {
            inner.last_bytes_written = 0;
            inner.pending = None;
            return Ok(());
        }

        // Per spec.md §3/§4.3.1 step 2-3: a bounds change, an alt-screen
        // toggle, or the very first frame makes the shadow untrustworthy
        // (the physical screen no longer matches what it records), so the
        // whole frame is repainted rather than diffed cell-by-cell.
        let mut force_full_redraw = bounds_changed || alt_screen_changed || inner.first_render;

        if bounds_changed {
            inner.buffer.resize(target_width, target_height);
            inner.shadow.resize(target_width, target_height);
        }

        let mut out = String::new();

        if alt_screen_changed {
            if view.alt_screen {
                ansi::enter_alt_screen(&mut out);
            } else {
                ansi::exit_alt_screen(&mut out);
            }
        }

        if !view.alt_screen && !inner.above_lines.is_empty() {
            let lines = std::mem::take(&mut inner.above_lines);
            for line in &lines {
                out.push_str(line);
                out.push_str("\r\n");
            }
            force_full_redraw = true;
        }

        inner.buffer.paint_styled(&view.content);

        if force_full_redraw {
            inner.buffer.mark_all_dirty();
        } else {
            let Inner { buffer, shadow, .. } = &mut *inner;
            buffer.diff_against(shadow);
        }

        let had_pending_updates = render_diff(&mut out, &mut inner, !force_full_redraw);

        emit_mode_transitions(&mut out, &view, inner.last_flushed.as_ref());

        let cursor_was_visible = inner
            .last_flushed
            .as_ref()
            .map(|v| v.cursor.is_some())
            .unwrap_or(false);

        let body = out;
        let mut framed = String::new();
        if had_pending_updates || !body.is_empty() {
            ansi::begin_sync(&mut framed);
            framed.push_str(&body);
            ansi::end_sync(&mut framed);
        } else if cursor_was_visible {
            ansi::cursor_hide(&mut framed);
            framed.push_str(&body);
            ansi::cursor_show(&mut framed);
        } else {
            framed.push_str(&body);
        }

        place_final_cursor(&mut framed, &view, &mut inner, closing);

        inner.output.write_all(framed.as_bytes())?;
        inner.output.flush()?;
        inner.last_bytes_written = framed.len();
        inner.last_flushed = Some(view);
        inner.first_render = false;
        // `buffer` now holds exactly what's on screen; swap it into
        // `shadow` so the next flush diffs against it, and reuse the old
        // shadow as next frame's scratch space instead of cloning.
        std::mem::swap(&mut inner.buffer, &mut inner.shadow);
        Ok(())
    }

    /// Lifecycle close (spec.md §4.3.3): reset every mode this renderer
    /// enabled and restore the terminal.
    pub fn close(&self) -> std::io::Result<()> {
        let mut inner = self.inner.lock();
        let mut out = String::new();
        if let Some(v) = inner.last_flushed.clone() {
            if v.alt_screen {
                ansi::exit_alt_screen(&mut out);
            }
            if v.mouse_mode != MouseMode::None {
                ansi::set_mouse_mode(&mut out, ansi::MouseMode::Off);
            }
            if !v.disable_bracketed_paste {
                ansi::disable_bracketed_paste(&mut out);
            }
            if v.report_focus {
                ansi::disable_focus_reporting(&mut out);
            }
            if v.progress_bar.is_some() {
                ansi::clear_progress_bar(&mut out);
            }
            if v.keyboard_enhancements.flag_bits() != 0 {
                ansi::disable_kitty_keyboard(&mut out);
            }
            if v.foreground_color.is_some() {
                ansi::reset_fg_color(&mut out);
            }
            if v.background_color.is_some() {
                ansi::reset_bg_color(&mut out);
            }
        }
        ansi::cursor_show(&mut out);
        ansi::reset_sgr(&mut out);
        inner.output.write_all(out.as_bytes())?;
        inner.output.flush()?;
        Ok(())
    }
}

fn inline_height(content: &str) -> u16 {
    content.split('\n').count().max(1) as u16
}

/// Walk dirty rows and emit a minimal move-and-write diff against the
/// buffer's previously-flushed shadow. `trust_shadow` is false right after
/// a resize/alt-screen toggle/first frame, when the shadow no longer
/// reflects the physical screen and every cell of a dirty row must be
/// rewritten rather than narrowed to the span that actually changed.
/// Returns whether any bytes were produced.
fn render_diff(out: &mut String, inner: &mut Inner, trust_shadow: bool) -> bool {
    let mut wrote = false;
    let (w, h) = (inner.buffer.width, inner.buffer.height);
    for y in 0..h {
        if !inner.buffer.row_dirty(y) {
            continue;
        }

        let (write_start, write_end, use_erase_right) = if trust_shadow {
            match diff_span(inner, y) {
                Some(span) => span,
                None => continue,
            }
        } else {
            (0, w, false)
        };

        ansi::cursor_to(out, write_start, y);
        let mut x = write_start;
        while x < write_end {
            let cell = inner.buffer.get(x, y).cloned().unwrap_or_default();
            if cell.is_continuation() {
                x += 1;
                continue;
            }
            ansi::fg(out, cell.fg);
            ansi::bg(out, cell.bg);
            ansi::attrs(out, cell.attrs);
            ansi::underline(out, cell.underline);
            out.push(cell.ch);
            wrote = true;
            x += cell.width.max(1) as u16;
        }
        if write_end > write_start {
            ansi::reset_sgr(out);
        }
        if use_erase_right {
            ansi::erase_line_right(out);
            wrote = true;
        }
    }
    inner.buffer.clear_dirty();
    wrote
}

/// Find the column span of row `y` that actually differs from the
/// last-flushed shadow, and whether the remainder can be cleared with
/// `EraseLineRight` instead of being written out as spaces (spec.md §9's
/// "space trick", guarded by a minimum byte-cost so short rows aren't
/// penalized). Returns `None` when the row turns out not to differ at all.
fn diff_span(inner: &Inner, y: u16) -> Option<(u16, u16, bool)> {
    let w = inner.buffer.width;
    let is_blank = |c: &Cell| !c.is_continuation() && c.ch == ' ' && c.same_style(&Cell::default());

    let mut first_diff = None;
    let mut last_diff = None;
    for x in 0..w {
        let differs = match (inner.buffer.get(x, y), inner.shadow.get(x, y)) {
            (Some(a), Some(b)) => a.ch != b.ch || a.width != b.width || !a.same_style(b),
            _ => true,
        };
        if differs {
            first_diff.get_or_insert(x);
            last_diff = Some(x);
        }
    }
    let (start, end) = (first_diff?, last_diff?);

    // Scanned over the whole row, not just the diff span: content past
    // `end` that's unchanged from the shadow must still count towards
    // where the new row's real content ends, or EraseLineRight below would
    // wipe out unchanged trailing characters.
    let content_end = (0..w)
        .rev()
        .find(|&x| inner.buffer.get(x, y).map(|c| !is_blank(c)).unwrap_or(false))
        .map(|x| x + 1)
        .unwrap_or(start);
    let old_had_trailing_content =
        (content_end..w).any(|x| inner.shadow.get(x, y).map(|c| !is_blank(c)).unwrap_or(false));
    let remainder = w.saturating_sub(content_end);
    let use_erase_right = old_had_trailing_content && remainder > 4;

    let write_end = if use_erase_right { content_end } else { end + 1 };
    Some((start, write_end, use_erase_right))
}

fn emit_mode_transitions(out: &mut String, view: &View, prev: Option<&View>) {
    let changed = |get: fn(&View) -> bool| prev.map(|p| get(p) != get(view)).unwrap_or(get(view));

    if prev.map(|p| p.mouse_mode != view.mouse_mode).unwrap_or(view.mouse_mode != MouseMode::None) {
        let mode = match view.mouse_mode {
            MouseMode::None => ansi::MouseMode::Off,
            MouseMode::CellMotion => ansi::MouseMode::Click,
            MouseMode::AllMotion => ansi::MouseMode::AllMotion,
        };
        ansi::set_mouse_mode(out, mode);
    }

    if changed(|v| v.report_focus) {
        if view.report_focus {
            ansi::enable_focus_reporting(out);
        } else {
            ansi::disable_focus_reporting(out);
        }
    }

    if changed(|v| v.disable_bracketed_paste) {
        if view.disable_bracketed_paste {
            ansi::disable_bracketed_paste(out);
        } else {
            ansi::enable_bracketed_paste(out);
        }
    }

    if prev
        .map(|p| p.window_title != view.window_title)
        .unwrap_or(!view.window_title.is_empty())
    {
        ansi::set_window_title(out, &view.window_title);
    }

    if prev
        .map(|p| p.keyboard_enhancements != view.keyboard_enhancements)
        .unwrap_or(view.keyboard_enhancements.flag_bits() != 0)
    {
        if view.keyboard_enhancements.flag_bits() == 0 {
            ansi::disable_kitty_keyboard(out);
        } else {
            ansi::enable_kitty_keyboard(out, &view.keyboard_enhancements);
        }
    }

    if prev
        .map(|p| p.foreground_color != view.foreground_color)
        .unwrap_or(view.foreground_color.is_some())
    {
        match view.foreground_color {
            Some(c) => ansi::set_fg_color(out, c),
            None => ansi::reset_fg_color(out),
        }
    }
    if prev
        .map(|p| p.background_color != view.background_color)
        .unwrap_or(view.background_color.is_some())
    {
        match view.background_color {
            Some(c) => ansi::set_bg_color(out, c),
            None => ansi::reset_bg_color(out),
        }
    }

    if prev
        .map(|p| p.progress_bar != view.progress_bar)
        .unwrap_or(view.progress_bar.is_some())
    {
        match view.progress_bar {
            Some(pb) => ansi::set_progress_bar(out, pb.state as u8, pb.value),
            None => ansi::clear_progress_bar(out),
        }
    }

    let prev_cursor_color = prev.and_then(|p| p.cursor.and_then(|c| c.color));
    let cur_cursor_color = view.cursor.and_then(|c| c.color);
    if prev_cursor_color != cur_cursor_color {
        match cur_cursor_color {
            Some(c) => ansi::set_cursor_color(out, c),
            None => ansi::reset_cursor_color(out),
        }
    }
}

fn place_final_cursor(out: &mut String, view: &View, inner: &mut Inner, closing: bool) {
    match view.cursor {
        Some(c) => {
            let mut x = c.x;
            let y = c.y;
            if closing && !view.alt_screen && x + 1 >= inner.buffer.width {
                // Per spec.md §4.3.1 step 7: forced to column 0 of the next
                // line to avoid autowrap artefacts when the cursor is
                // hidden and inline mode is active. Here applied whenever
                // we're at the edge to keep the terminal's own autowrap
                // from misbehaving on close.
                x = 0;
            }
            move_cursor(out, inner.last_cursor, (x, y), view.alt_screen);
            ansi::cursor_shape(out, c.shape, c.blink);
            ansi::cursor_show(out);
            inner.last_cursor = (x, y);
        }
        None => {
            ansi::cursor_hide(out);
        }
    }
}

/// Cursor-movement encoding heuristics (spec.md §4.3.2).
fn move_cursor(out: &mut String, from: (u16, u16), to: (u16, u16), alt_screen: bool) {
    let (x0, y0) = from;
    let (x1, y1) = to;
    if x0 == x1 && y0 == y1 {
        return;
    }
    if alt_screen {
        ansi::cursor_to(out, x1, y1);
        return;
    }
    if x1 == 0 && x0 > 0 && y0 == y1 {
        out.push('\r');
        return;
    }
    if y1 > y0 && x1 == 0 {
        let dy = y1 - y0;
        if dy < 3 {
            for _ in 0..dy {
                out.push('\n');
            }
            return;
        }
    }
    if y0 == y1 {
        if x1 > x0 {
            let dx = x1 - x0;
            if dx < 3 {
                ansi::cursor_forward(out, dx);
                return;
            }
        } else {
            let dx = x0 - x1;
            if dx < 3 {
                for _ in 0..dx {
                    out.push('\x08');
                }
                return;
            }
        }
    }
    ansi::cursor_to(out, x1, y1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::View;

    struct Sink(Vec<u8>);
    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// A [`Write`] sink that shares its captured bytes with the test, since
    /// `Renderer` owns its output `Box<dyn Write>` outright.
    #[derive(Clone, Default)]
    struct SharedSink(std::sync::Arc<Mutex<Vec<u8>>>);
    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn identical_views_write_zero_bytes_on_second_flush() {
        let r = Renderer::new(Box::new(Sink(Vec::new())), 20, 5);
        let v = View::new("hello");
        r.render(v.clone());
        r.flush(false).unwrap();
        assert!(r.last_bytes_written() > 0);
        r.render(v);
        r.flush(false).unwrap();
        assert_eq!(r.last_bytes_written(), 0);
    }

    #[test]
    fn alt_screen_toggle_emits_1049_then_resets() {
        let r = Renderer::new(Box::new(Sink(Vec::new())), 20, 5);
        let mut v = View::new("x");
        v.alt_screen = true;
        r.render(v.clone());
        r.flush(false).unwrap();

        let mut v2 = v.clone();
        v2.alt_screen = false;
        r.render(v2);
        r.flush(false).unwrap();
        assert!(r.last_bytes_written() > 0);
    }

    #[test]
    fn no_pending_view_is_a_noop() {
        let r = Renderer::new(Box::new(Sink(Vec::new())), 20, 5);
        r.flush(false).unwrap();
        assert_eq!(r.last_bytes_written(), 0);
    }

    #[test]
    fn print_line_above_ignored_in_alt_screen() {
        let r = Renderer::new(Box::new(Sink(Vec::new())), 20, 5);
        let mut v = View::new("x");
        v.alt_screen = true;
        r.render(v.clone());
        r.flush(false).unwrap();
        r.print_line_above("hi".into());
        // Still flushed as part of last_flushed alt_screen=true, so the
        // line must have been dropped rather than queued.
        r.render(v);
        r.flush(false).unwrap();
        assert_eq!(r.last_bytes_written(), 0);
    }

    #[test]
    fn unchanged_line_is_not_rewritten_on_second_flush() {
        // spec.md §8: "Hello\nWorld" -> "Hello\nEarth" must emit only a
        // cursor move onto row 1 plus "Earth", not a repaint of "Hello".
        let sink = SharedSink::default();
        let r = Renderer::new(Box::new(sink.clone()), 20, 2);
        r.render(View::new("Hello\nWorld"));
        r.flush(false).unwrap();
        sink.0.lock().clear();

        r.render(View::new("Hello\nEarth"));
        r.flush(false).unwrap();

        let bytes = sink.0.lock().clone();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Earth"));
        assert!(!text.contains("Hello"));
        assert!(!text.contains("World"));
    }

    #[test]
    fn changed_line_rewrite_does_not_touch_unchanged_prefix() {
        let sink = SharedSink::default();
        let r = Renderer::new(Box::new(sink.clone()), 20, 1);
        r.render(View::new("aaaaa"));
        r.flush(false).unwrap();
        sink.0.lock().clear();

        r.render(View::new("aaaXa"));
        r.flush(false).unwrap();

        let bytes = sink.0.lock().clone();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains('X'));
        // Only the changed column needed a cursor move onto column 3; the
        // unchanged "aaa" prefix and trailing "a" aren't rewritten.
        assert!(text.contains("\x1b[1;4H"));
    }

    #[test]
    fn shorter_line_erases_remainder_instead_of_writing_spaces() {
        let sink = SharedSink::default();
        let r = Renderer::new(Box::new(sink.clone()), 20, 1);
        r.render(View::new("0123456789"));
        r.flush(false).unwrap();
        sink.0.lock().clear();

        r.render(View::new("01234"));
        r.flush(false).unwrap();

        let bytes = sink.0.lock().clone();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("\x1b[K"));
        assert!(!text.contains('5'));
    }

    #[test]
    fn resize_forces_full_redraw_even_if_content_matches() {
        let r = Renderer::new(Box::new(Sink(Vec::new())), 20, 2);
        r.render(View::new("same"));
        r.flush(false).unwrap();

        r.resize(30, 2);
        r.render(View::new("same"));
        r.flush(false).unwrap();
        // Bounds changed, so even identical content must be repainted.
        assert!(r.last_bytes_written() > 0);
    }
}
