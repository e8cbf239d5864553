//! Terminal lifecycle primitives (spec.md §4.1 component 1): raw-mode
//! entry/exit, TTY discovery, and window-size query/change notification.
//!
//! Event decoding and rendering used to live here in the source framework;
//! both jobs have moved out — decoding to [`crate::parser`]/[`crate::input`],
//! rendering to [`crate::renderer`]. What remains is exactly the terminal
//! *mode* plumbing crossterm already does well, kept close to the teacher's
//! `Terminal` struct shape.

use crate::Error;
use crossterm::terminal as ct;
use std::io::IsTerminal;

/// Abstraction over the few terminal-mode operations the orchestrator
/// needs directly; everything else (mouse, paste, colors, cursor shape)
/// is expressed as ANSI bytes by [`crate::ansi`] and written by
/// [`crate::renderer::Renderer`].
pub trait TerminalInterface {
    /// Enable raw mode (disables canonical input processing, line
    /// buffering, and echo).
    fn enter_raw_mode(&mut self) -> Result<(), Error>;
    /// Disable raw mode, restoring canonical input processing.
    fn exit_raw_mode(&mut self) -> Result<(), Error>;
    /// Current terminal size in character cells, `(width, height)`.
    fn size(&self) -> Result<(u16, u16), Error>;
    /// Whether the underlying device is a real TTY.
    fn is_tty(&self) -> bool;
}

/// The real terminal, backed by crossterm's raw-mode and size primitives.
pub struct Terminal {
    raw_mode: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal { raw_mode: false }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Terminal::new()
    }
}

impl TerminalInterface for Terminal {
    fn enter_raw_mode(&mut self) -> Result<(), Error> {
        if !self.raw_mode {
            ct::enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<(), Error> {
        if self.raw_mode {
            ct::disable_raw_mode()?;
            self.raw_mode = false;
        }
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), Error> {
        let (w, h) = ct::size()?;
        Ok((w, h))
    }

    fn is_tty(&self) -> bool {
        std::io::stdout().is_terminal()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = ct::disable_raw_mode();
        }
    }
}

/// A no-op terminal for tests and headless operation: `size()` returns a
/// fixed value instead of querying a real device, and mode changes are not
/// observable.
pub struct DummyTerminal {
    pub width: u16,
    pub height: u16,
}

impl DummyTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        DummyTerminal { width, height }
    }
}

impl Default for DummyTerminal {
    fn default() -> Self {
        DummyTerminal::new(80, 24)
    }
}

impl TerminalInterface for DummyTerminal {
    fn enter_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }
    fn exit_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }
    fn size(&self) -> Result<(u16, u16), Error> {
        Ok((self.width, self.height))
    }
    fn is_tty(&self) -> bool {
        false
    }
}

/// Spawn a task that notifies on terminal resize by polling `size()` on
/// an interval. Unix terminals deliver `SIGWINCH`; polling sidesteps the
/// platform-specific signal plumbing while staying correct (spec.md §4.1:
/// "size-change notification").
pub fn watch_resize<F>(initial: (u16, u16), mut on_resize: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut(u16, u16) + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = initial;
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(200));
        loop {
            ticker.tick().await;
            if let Ok((w, h)) = ct::size() {
                if (w, h) != last {
                    last = (w, h);
                    on_resize(w, h);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_terminal_reports_fixed_size() {
        let term = DummyTerminal::new(100, 40);
        assert_eq!(term.size().unwrap(), (100, 40));
        assert!(!term.is_tty());
    }

    #[test]
    fn dummy_terminal_mode_ops_are_noops() {
        let mut term = DummyTerminal::default();
        assert!(term.enter_raw_mode().is_ok());
        assert!(term.exit_raw_mode().is_ok());
    }
}
