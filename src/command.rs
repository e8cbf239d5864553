//! Command constructors (spec.md §4.4). A `Cmd` is a thunk that runs
//! asynchronously and may resolve to a follow-up [`Msg`]; `Model::init` and
//! `Model::update` return these to describe side effects without performing
//! them directly.

use crate::message::{ClipboardKind, Cmd, ExecProcess, Msg};
use std::time::Duration;
use tokio::time::interval;

pub fn quit() -> Cmd {
    Box::pin(async { Some(Msg::Quit) })
}

pub fn suspend() -> Cmd {
    Box::pin(async { Some(Msg::Suspend) })
}

pub fn resume() -> Cmd {
    Box::pin(async { Some(Msg::Resume) })
}

/// Fan out to the bare-command path; no ordering is guaranteed among the
/// constituents (spec.md §4.4).
pub fn batch(cmds: Vec<Cmd>) -> Cmd {
    Box::pin(async move { Some(Msg::Batch(cmds)) })
}

/// Execute in order on a dedicated task; a nested `Batch` is fanned out and
/// awaited before the next step begins (spec.md §4.4).
pub fn sequence(cmds: Vec<Cmd>) -> Cmd {
    Box::pin(async move { Some(Msg::Sequence(cmds)) })
}

/// Produce one message after `duration` elapses.
pub fn tick<F>(duration: Duration, f: F) -> Cmd
where
    F: FnOnce(Duration) -> Msg + Send + 'static,
{
    Box::pin(async move {
        tokio::time::sleep(duration).await;
        Some(f(duration))
    })
}

/// Produce a message on a repeating interval until the program exits. Each
/// invocation of this constructor represents one recurring timer; the
/// caller is expected to re-arm it (via the returned `Msg` triggering
/// another `every`) if `duration`-periodic delivery for the whole program
/// lifetime is desired, mirroring the upstream framework's non-cancelling
/// timer model.
pub fn every<F>(duration: Duration, f: F) -> Cmd
where
    F: Fn(Duration) -> Msg + Send + 'static,
{
    Box::pin(async move {
        let mut ticker = interval(duration);
        ticker.tick().await;
        ticker.tick().await;
        Some(f(duration))
    })
}

/// Run an external process with full terminal control; the orchestrator
/// releases the terminal before running it and restores afterward
/// (spec.md §4.5, §4.6).
pub fn exec_process<F>(command: tokio::process::Command, on_exit: F) -> Cmd
where
    F: FnOnce(std::io::Result<std::process::ExitStatus>) -> Msg + Send + 'static,
{
    Box::pin(async move {
        Some(Msg::ExecProcess(ExecProcess {
            command,
            on_exit: Box::new(on_exit),
        }))
    })
}

pub fn print_line_above(s: impl Into<String>) -> Cmd {
    let s = s.into();
    Box::pin(async move { Some(Msg::PrintLineAbove(s)) })
}

pub fn window_size() -> Cmd {
    Box::pin(async { Some(Msg::RequestWindowSize) })
}

pub fn cursor_position() -> Cmd {
    Box::pin(async { Some(Msg::RequestCursorPosition) })
}

pub fn keyboard_enhancements() -> Cmd {
    Box::pin(async { Some(Msg::RequestKeyboardEnhancements) })
}

pub fn set_clipboard(kind: ClipboardKind, content: impl Into<String>) -> Cmd {
    let content = content.into();
    Box::pin(async move { Some(Msg::SetClipboard { kind, content }) })
}

pub fn read_clipboard(kind: ClipboardKind) -> Cmd {
    Box::pin(async move { Some(Msg::ReadClipboard { kind }) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quit_resolves_to_quit_msg() {
        assert!(matches!(quit().await, Some(Msg::Quit)));
    }

    #[tokio::test]
    async fn batch_carries_commands() {
        let cmds = vec![quit(), suspend()];
        match batch(cmds).await {
            Some(Msg::Batch(v)) => assert_eq!(v.len(), 2),
            other => panic!("expected Batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tick_eventually_resolves() {
        let msg = tick(Duration::from_millis(1), |_| Msg::Quit).await;
        assert!(matches!(msg, Some(Msg::Quit)));
    }
}
