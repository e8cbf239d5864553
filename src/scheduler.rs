//! The command scheduler (spec.md §4.4): runs commands concurrently while
//! preserving `Sequence` ordering (including nested `Batch` fan-out) and
//! `Batch` fan-out with no ordering guarantee.
//!
//! Grounded on the teacher's `command.rs` `batch()`/`sequence()` functions
//! (`futures::future::join_all` fan-out), generalized into a standing
//! dispatcher that injects results back into the program's inbox instead of
//! folding them into one synthetic message.

use crate::message::{Cmd, Msg};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Dispatches `Cmd`s to worker tasks. Commands are never cancelled
/// individually; only the inject step checks `cancel` to avoid blocking
/// shutdown on a full inbox (spec.md §4.4, §5).
#[derive(Clone)]
pub struct Scheduler {
    inbox: Sender<Msg>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(inbox: Sender<Msg>, cancel: CancellationToken) -> Self {
        Scheduler { inbox, cancel }
    }

    /// Run a bare command concurrently; its result (if any) is injected
    /// into the inbox.
    pub fn spawn(&self, cmd: Cmd) {
        let inbox = self.inbox.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let result = cmd.await;
            if cancel.is_cancelled() {
                return;
            }
            if let Some(msg) = result {
                let _ = inbox.send(msg).await;
            }
        });
    }

    /// Batch: fan out to the bare-command path, no ordering guarantee.
    pub fn spawn_batch(&self, cmds: Vec<Cmd>) {
        for cmd in cmds {
            self.spawn(cmd);
        }
    }

    /// Sequence: run on a dedicated task, preserving order; a nested
    /// `Batch` is awaited to completion before the next step starts.
    pub fn spawn_sequence(&self, cmds: Vec<Cmd>) {
        let inbox = self.inbox.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(run_sequence(cmds, inbox, cancel));
    }
}

fn run_sequence(
    cmds: Vec<Cmd>,
    inbox: Sender<Msg>,
    cancel: CancellationToken,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        for cmd in cmds {
            if cancel.is_cancelled() {
                return;
            }
            let Some(msg) = cmd.await else { continue };
            if !inject(msg, &inbox, &cancel).await {
                return;
            }
        }
    })
}

/// Deliver one resolved message, recursing into nested `Batch`/`Sequence`
/// payloads. Returns `false` when the caller should stop (cancellation or a
/// closed inbox).
fn inject<'a>(
    msg: Msg,
    inbox: &'a Sender<Msg>,
    cancel: &'a CancellationToken,
) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
    Box::pin(async move {
        match msg {
            Msg::Batch(inner) => {
                let results = futures::future::join_all(inner).await;
                for r in results.into_iter().flatten() {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    if !inject(r, inbox, cancel).await {
                        return false;
                    }
                }
                true
            }
            Msg::Sequence(inner) => {
                for cmd in inner {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    let Some(m) = cmd.await else { continue };
                    if !inject(m, inbox, cancel).await {
                        return false;
                    }
                }
                true
            }
            other => {
                if cancel.is_cancelled() {
                    return false;
                }
                inbox.send(other).await.is_ok()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use tokio::sync::mpsc;

    struct Counter;

    #[tokio::test]
    async fn sequence_preserves_order_with_nested_batch() {
        let (tx, mut rx) = mpsc::channel(32);
        let sched = Scheduler::new(tx, CancellationToken::new());
        let inc = || Box::pin(async { Some(Msg::user(Counter)) }) as Cmd;
        let cmds = vec![
            command::batch(vec![inc(), inc()]),
            inc(),
            command::quit(),
        ];
        sched.spawn_sequence(cmds);

        let mut inc_count = 0;
        let mut saw_quit = false;
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::Quit => {
                    saw_quit = true;
                    break;
                }
                Msg::User(_) => inc_count += 1,
                _ => {}
            }
        }
        assert_eq!(inc_count, 3);
        assert!(saw_quit);
    }

    #[tokio::test]
    async fn batch_delivers_every_member_unordered() {
        let (tx, mut rx) = mpsc::channel(32);
        let sched = Scheduler::new(tx, CancellationToken::new());
        let inc = || Box::pin(async { Some(Msg::user(Counter)) }) as Cmd;
        sched.spawn_batch(vec![inc(), inc()]);
        let mut count = 0;
        while count < 2 {
            if rx.recv().await.is_some() {
                count += 1;
            }
        }
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn cancellation_stops_sequence_injection() {
        let (tx, mut rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let sched = Scheduler::new(tx, cancel.clone());
        cancel.cancel();
        sched.spawn_sequence(vec![command::quit()]);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
