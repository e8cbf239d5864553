//! Input reader (spec.md §4.2): a background thread pulls raw bytes off
//! the terminal device and a [`ParserState`] turns them into [`Msg`]s that
//! land in the program's inbox.
//!
//! Grounded on the pack's `n-term` `StdinReader`: a dedicated OS thread
//! does a short-timeout `poll()` against an `AtomicBool` stop flag so a
//! blocking `read()` never outlives shutdown, generalized here to feed a
//! stateful byte-stream parser instead of handing chunks to the caller
//! directly.

use crate::message::Msg;
use crate::parser::{self, ParserState};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::Sender;

/// How often the reader thread checks the stop flag, in milliseconds.
const POLL_TIMEOUT_MS: i32 = 50;
const READ_BUF_SIZE: usize = 4096;

/// Owns the background reader thread. Dropping or calling [`stop`](Self::stop)
/// joins it; the channel into the program's inbox is closed at that point.
pub struct InputReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl InputReader {
    /// Spawn a reader over the real terminal input device (stdin on every
    /// platform; translated via a cancellable `poll`+`read` loop on Unix).
    #[cfg(unix)]
    pub fn spawn_tty(inbox: Sender<Msg>) -> Self {
        use std::os::unix::io::AsRawFd;
        let fd = std::io::stdin().as_raw_fd();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("bubbletea-input".into())
            .spawn(move || unix_poll_loop(fd, stop_flag, inbox))
            .expect("failed to spawn input reader thread");
        InputReader {
            handle: Some(handle),
            stop,
        }
    }

    #[cfg(windows)]
    pub fn spawn_tty(inbox: Sender<Msg>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("bubbletea-input".into())
            .spawn(move || windows::console_loop(stop_flag, inbox))
            .expect("failed to spawn input reader thread");
        InputReader {
            handle: Some(handle),
            stop,
        }
    }

    /// Spawn a reader over an arbitrary byte source, used for custom
    /// non-TTY input (spec.md §6: `ProgramConfig.input`) and for tests.
    /// Cancellation is best-effort: a blocking read on a generic [`Read`]
    /// cannot be interrupted mid-call, so the stop flag is only checked
    /// between reads.
    pub fn spawn_reader<R: Read + Send + 'static>(mut source: R, inbox: Sender<Msg>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("bubbletea-input".into())
            .spawn(move || {
                let mut state = ParserState::new();
                let mut buf = [0u8; READ_BUF_SIZE];
                loop {
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    match source.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if !deliver(&mut state, &buf[..n], &inbox) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            })
            .expect("failed to spawn input reader thread");
        InputReader {
            handle: Some(handle),
            stop,
        }
    }

    /// Signal the reader thread to stop and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Feed one chunk through the parser and forward every decoded message.
/// Returns `false` once the inbox is closed, signalling the caller to stop.
fn deliver(state: &mut ParserState, chunk: &[u8], inbox: &Sender<Msg>) -> bool {
    for msg in parser::feed(state, chunk) {
        if inbox.blocking_send(msg).is_err() {
            return false;
        }
    }
    true
}

#[cfg(unix)]
fn unix_poll_loop(fd: std::os::unix::io::RawFd, stop: Arc<AtomicBool>, inbox: Sender<Msg>) {
    let mut state = ParserState::new();
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&mut pfd as *mut libc::pollfd, 1, POLL_TIMEOUT_MS)
        };

        if ready <= 0 {
            // Timeout, EINTR, or an otherwise-ignorable error: loop back
            // and re-check the stop flag. A lone unterminated escape from
            // the previous read is flushed here once the device goes
            // quiet, matching the parser's own escape-ambiguity timeout
            // (spec.md §4.1, §8 property #4).
            if ready == 0 {
                for msg in parser::flush_lone_escape(&mut state) {
                    if inbox.blocking_send(msg).is_err() {
                        return;
                    }
                }
            }
            continue;
        }

        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            break;
        }
        #[allow(clippy::cast_sign_loss)]
        let chunk = &buf[..n as usize];
        if !deliver(&mut state, chunk, &inbox) {
            break;
        }
    }
}

#[cfg(windows)]
mod windows {
    use super::*;
    use crate::key::{Functional, Key, KeyCode, Modifiers};
    use crate::mouse::{Mouse, MouseButton, MouseEventKind};
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::System::Console::{
        GetStdHandle, ReadConsoleInputW, FOCUS_EVENT, INPUT_RECORD, KEY_EVENT, MOUSE_EVENT,
        STD_INPUT_HANDLE, WINDOW_BUFFER_SIZE_EVENT,
    };

    /// Translate `INPUT_RECORD`s from the Windows console into [`Msg`]s.
    /// Key events carry UTF-16 code units; surrogate pairs are accumulated
    /// across events using [`ParserState`]'s high-surrogate slot, the same
    /// place the byte parser would stash one if it ever saw UTF-16 input.
    pub(super) fn console_loop(stop: Arc<AtomicBool>, inbox: Sender<Msg>) {
        let handle: HANDLE = unsafe { GetStdHandle(STD_INPUT_HANDLE) };
        let mut state = ParserState::new();
        let mut records: [INPUT_RECORD; 32] = unsafe { std::mem::zeroed() };

        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let mut read: u32 = 0;
            let ok = unsafe {
                ReadConsoleInputW(handle, records.as_mut_ptr(), records.len() as u32, &mut read)
            };
            if ok == 0 {
                break;
            }
            for record in &records[..read as usize] {
                if let Some(msg) = translate(record, &mut state) {
                    // spec.md §4.1: a `RepeatCount > 1` key record expands
                    // to that many identical KeyPress messages.
                    let repeats = if record.EventType as u32 == KEY_EVENT {
                        unsafe { record.Event.KeyEvent.wRepeatCount.max(1) }
                    } else {
                        1
                    };
                    match msg {
                        Msg::KeyPress(key) => {
                            for _ in 0..repeats {
                                if inbox.blocking_send(Msg::KeyPress(key.clone())).is_err() {
                                    return;
                                }
                            }
                        }
                        other => {
                            if inbox.blocking_send(other).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    fn translate(record: &INPUT_RECORD, state: &mut ParserState) -> Option<Msg> {
        unsafe {
            match record.EventType as u32 {
                KEY_EVENT => {
                    let ev = &record.Event.KeyEvent;
                    if ev.bKeyDown == 0 {
                        return None;
                    }
                    let unit = ev.uChar.UnicodeChar;
                    let ch = if (0xD800..=0xDBFF).contains(&unit) {
                        state.set_surrogate_high(unit);
                        return None;
                    } else if (0xDC00..=0xDFFF).contains(&unit) {
                        let high = state.take_surrogate_high()?;
                        let c = 0x10000 + ((high as u32 - 0xD800) << 10) + (unit as u32 - 0xDC00);
                        char::from_u32(c)
                    } else if unit == 0 {
                        None
                    } else {
                        char::from_u32(unit as u32)
                    };

                    let mut modifiers = Modifiers::empty();
                    let state_flags = ev.dwControlKeyState;
                    if state_flags & 0x0010 != 0 || state_flags & 0x0008 != 0 {
                        modifiers |= Modifiers::CTRL;
                    }
                    if state_flags & 0x0002 != 0 || state_flags & 0x0001 != 0 {
                        modifiers |= Modifiers::ALT;
                    }
                    if state_flags & 0x0010_0000 != 0 {
                        modifiers |= Modifiers::SHIFT;
                    }

                    let key = match ch {
                        Some(c) if !c.is_control() => Key::new(KeyCode::Char(c))
                            .with_text(c.to_string())
                            .with_modifiers(modifiers),
                        _ => {
                            let functional = virtual_key_to_functional(ev.wVirtualKeyCode)?;
                            Key::new(KeyCode::Functional(functional)).with_modifiers(modifiers)
                        }
                    };
                    Some(Msg::KeyPress(key))
                }
                MOUSE_EVENT => {
                    let ev = &record.Event.MouseEvent;
                    let x = ev.dwMousePosition.X.max(0) as u16;
                    let y = ev.dwMousePosition.Y.max(0) as u16;
                    let button = if ev.dwButtonState & 0x0001 != 0 {
                        MouseButton::Left
                    } else if ev.dwButtonState & 0x0002 != 0 {
                        MouseButton::Right
                    } else {
                        MouseButton::None
                    };
                    let kind = if ev.dwEventFlags & 0x0001 != 0 {
                        MouseEventKind::Motion
                    } else if ev.dwEventFlags & 0x0004 != 0 {
                        MouseEventKind::Wheel
                    } else if button == MouseButton::None {
                        MouseEventKind::Release
                    } else {
                        MouseEventKind::Click
                    };
                    let mouse = Mouse::new(x, y, button, Modifiers::empty());
                    Some(match kind {
                        MouseEventKind::Click => Msg::MouseClick(mouse),
                        MouseEventKind::Release => Msg::MouseRelease(mouse),
                        MouseEventKind::Motion => Msg::MouseMotion(mouse),
                        MouseEventKind::Wheel => Msg::MouseWheel(mouse),
                    })
                }
                WINDOW_BUFFER_SIZE_EVENT => {
                    let size = record.Event.WindowBufferSizeEvent.dwSize;
                    Some(Msg::WindowSize {
                        width: size.X.max(0) as u16,
                        height: size.Y.max(0) as u16,
                    })
                }
                FOCUS_EVENT => {
                    let ev = &record.Event.FocusEvent;
                    Some(if ev.bSetFocus != 0 {
                        Msg::Focus
                    } else {
                        Msg::Blur
                    })
                }
                _ => None,
            }
        }
    }

    fn virtual_key_to_functional(vk: u16) -> Option<Functional> {
        Some(match vk {
            0x08 => Functional::Backspace,
            0x09 => Functional::Tab,
            0x0D => Functional::Enter,
            0x1B => Functional::Escape,
            0x21 => Functional::PageUp,
            0x22 => Functional::PageDown,
            0x23 => Functional::End,
            0x24 => Functional::Home,
            0x25 => Functional::Left,
            0x26 => Functional::Up,
            0x27 => Functional::Right,
            0x28 => Functional::Down,
            0x2D => Functional::Insert,
            0x2E => Functional::Delete,
            0x70 => Functional::F1,
            0x71 => Functional::F2,
            0x72 => Functional::F3,
            0x73 => Functional::F4,
            0x74 => Functional::F5,
            0x75 => Functional::F6,
            0x76 => Functional::F7,
            0x77 => Functional::F8,
            0x78 => Functional::F9,
            0x79 => Functional::F10,
            0x7A => Functional::F11,
            0x7B => Functional::F12,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn custom_reader_delivers_decoded_keys() {
        let (tx, mut rx) = mpsc::channel(32);
        let source = Cursor::new(b"ab".to_vec());
        let mut reader = InputReader::spawn_reader(source, tx);

        let mut seen = Vec::new();
        for _ in 0..2 {
            if let Some(Msg::KeyPress(k)) = rx.recv().await {
                seen.push(k.code);
            }
        }
        reader.stop();
        assert_eq!(
            seen,
            vec![
                crate::key::KeyCode::Char('a'),
                crate::key::KeyCode::Char('b'),
            ]
        );
    }

    #[tokio::test]
    async fn empty_source_closes_channel() {
        let (tx, mut rx) = mpsc::channel::<Msg>(8);
        let mut reader = InputReader::spawn_reader(Cursor::new(Vec::<u8>::new()), tx);
        reader.stop();
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let (tx, _rx) = mpsc::channel(8);
        let mut reader = InputReader::spawn_reader(Cursor::new(Vec::<u8>::new()), tx);
        reader.stop();
        reader.stop();
    }
}
