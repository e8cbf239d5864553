//! The sealed message/effect envelope (spec.md §3, design note in §9).
//!
//! The source framework demultiplexes on `Box<dyn Any + Send>`; this crate
//! uses a closed, tag-dispatched enum instead, with a single escape hatch
//! (`Msg::User`) for application-defined messages, matching the design note
//! that a sealed sum type is cheaper to match on and harder to get wrong.

use crate::color::{Color, ColorProfile};
use crate::key::Key;
use crate::mouse::Mouse;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;

/// Application-defined message payload carried by [`Msg::User`].
pub trait AnyMsg: Any + Send {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send> AnyMsg for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyMsg {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A side-effect thunk: an asynchronous computation that may produce a
/// follow-up message.
pub type Cmd = Pin<Box<dyn Future<Output = Option<Msg>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardKind {
    System,
    Primary,
}

/// A child process to run with full terminal control, and the callback that
/// turns its exit result into a message the Model can react to.
pub struct ExecProcess {
    pub command: tokio::process::Command,
    pub on_exit: Box<dyn FnOnce(std::io::Result<std::process::ExitStatus>) -> Msg + Send>,
}

impl std::fmt::Debug for ExecProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecProcess").finish_non_exhaustive()
    }
}

/// The event/effect envelope the runtime moves through its inbox.
pub enum Msg {
    // --- Input ---
    KeyPress(Key),
    KeyRelease(Key),
    PasteStart,
    Paste(String),
    PasteEnd,
    MouseClick(Mouse),
    MouseRelease(Mouse),
    MouseMotion(Mouse),
    MouseWheel(Mouse),
    Focus,
    Blur,
    WindowSize { width: u16, height: u16 },
    CursorPosition { row: u16, col: u16 },
    ClipboardRead { kind: ClipboardKind, content: String },
    ForegroundColorReport(Color),
    BackgroundColorReport(Color),
    CursorColorReport(Color),
    ColorProfileReport(ColorProfile),
    /// A syntactically complete but semantically unrecognized sequence, or a
    /// malformed sequence that was balanced off so the parser never stalls.
    Unknown(Vec<u8>),

    // --- Control ---
    Quit,
    Suspend,
    Resume,
    Batch(Vec<Cmd>),
    Sequence(Vec<Cmd>),
    PrintLineAbove(String),
    RequestWindowSize,
    RequestCursorPosition,
    RequestKeyboardEnhancements,
    SetClipboard { kind: ClipboardKind, content: String },
    ReadClipboard { kind: ClipboardKind },
    ExecProcess(ExecProcess),

    /// Escape hatch for application-defined messages.
    User(Box<dyn AnyMsg>),
}

impl std::fmt::Debug for Msg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Msg::KeyPress(k) => f.debug_tuple("KeyPress").field(k).finish(),
            Msg::KeyRelease(k) => f.debug_tuple("KeyRelease").field(k).finish(),
            Msg::PasteStart => write!(f, "PasteStart"),
            Msg::Paste(s) => f.debug_tuple("Paste").field(s).finish(),
            Msg::PasteEnd => write!(f, "PasteEnd"),
            Msg::MouseClick(m) => f.debug_tuple("MouseClick").field(m).finish(),
            Msg::MouseRelease(m) => f.debug_tuple("MouseRelease").field(m).finish(),
            Msg::MouseMotion(m) => f.debug_tuple("MouseMotion").field(m).finish(),
            Msg::MouseWheel(m) => f.debug_tuple("MouseWheel").field(m).finish(),
            Msg::Focus => write!(f, "Focus"),
            Msg::Blur => write!(f, "Blur"),
            Msg::WindowSize { width, height } => f
                .debug_struct("WindowSize")
                .field("width", width)
                .field("height", height)
                .finish(),
            Msg::CursorPosition { row, col } => f
                .debug_struct("CursorPosition")
                .field("row", row)
                .field("col", col)
                .finish(),
            Msg::ClipboardRead { kind, content } => f
                .debug_struct("ClipboardRead")
                .field("kind", kind)
                .field("content", content)
                .finish(),
            Msg::ForegroundColorReport(c) => f.debug_tuple("ForegroundColorReport").field(c).finish(),
            Msg::BackgroundColorReport(c) => f.debug_tuple("BackgroundColorReport").field(c).finish(),
            Msg::CursorColorReport(c) => f.debug_tuple("CursorColorReport").field(c).finish(),
            Msg::ColorProfileReport(c) => f.debug_tuple("ColorProfileReport").field(c).finish(),
            Msg::Unknown(bytes) => f.debug_tuple("Unknown").field(bytes).finish(),
            Msg::Quit => write!(f, "Quit"),
            Msg::Suspend => write!(f, "Suspend"),
            Msg::Resume => write!(f, "Resume"),
            Msg::Batch(v) => write!(f, "Batch({} cmds)", v.len()),
            Msg::Sequence(v) => write!(f, "Sequence({} cmds)", v.len()),
            Msg::PrintLineAbove(s) => f.debug_tuple("PrintLineAbove").field(s).finish(),
            Msg::RequestWindowSize => write!(f, "RequestWindowSize"),
            Msg::RequestCursorPosition => write!(f, "RequestCursorPosition"),
            Msg::RequestKeyboardEnhancements => write!(f, "RequestKeyboardEnhancements"),
            Msg::SetClipboard { kind, .. } => f.debug_struct("SetClipboard").field("kind", kind).finish(),
            Msg::ReadClipboard { kind } => f.debug_struct("ReadClipboard").field("kind", kind).finish(),
            Msg::ExecProcess(_) => write!(f, "ExecProcess"),
            Msg::User(_) => write!(f, "User(..)"),
        }
    }
}

impl Msg {
    pub fn user<T: Any + Send>(value: T) -> Self {
        Msg::User(Box::new(value))
    }

    /// Downcast a [`Msg::User`] payload; returns `None` for any other
    /// variant or a type mismatch.
    pub fn downcast_user<T: Any>(&self) -> Option<&T> {
        match self {
            Msg::User(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tick(u32);

    #[test]
    fn user_message_roundtrips() {
        let msg = Msg::user(Tick(7));
        assert_eq!(msg.downcast_user::<Tick>(), Some(&Tick(7)));
    }

    #[test]
    fn wrong_type_downcast_is_none() {
        let msg = Msg::user(Tick(7));
        assert_eq!(msg.downcast_user::<String>(), None);
    }

    #[test]
    fn debug_impl_does_not_panic() {
        let msg = Msg::Quit;
        let _ = format!("{msg:?}");
    }
}
