//! Integration tests for `Sequence`/`Batch` command ordering and filter
//! semantics, driven through a running `Program` (spec.md §8 properties 6-9).

use bubbletea_rs::{command, Cmd, Model, Msg, View};
use std::io::Cursor;

#[derive(Debug, Default)]
struct Counter {
    count: i32,
}

#[derive(Debug)]
struct Inc;

impl Model for Counter {
    fn init() -> (Self, Option<Cmd>) {
        (Counter::default(), None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Msg::User(m) = &msg {
            if m.downcast_ref::<Inc>().is_some() {
                self.count += 1;
            }
        }
        None
    }

    fn view(&self) -> View {
        View::new(self.count.to_string())
    }
}

fn inc() -> Cmd {
    Box::pin(async { Some(Msg::user(Inc)) })
}

#[tokio::test]
async fn sequence_delivers_two_incs_before_quit() {
    #[derive(Debug, Default)]
    struct Seeded(Counter);

    impl Model for Seeded {
        fn init() -> (Self, Option<Cmd>) {
            (
                Seeded(Counter::default()),
                Some(command::sequence(vec![inc(), inc(), command::quit()])),
            )
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            self.0.update(msg)
        }

        fn view(&self) -> View {
            self.0.view()
        }
    }

    let program = bubbletea_rs::Program::<Seeded>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    assert_eq!(model.0.count, 2);
}

#[tokio::test]
async fn sequence_with_nested_batch_delivers_three_incs_before_quit() {
    #[derive(Debug, Default)]
    struct Seeded(Counter);

    impl Model for Seeded {
        fn init() -> (Self, Option<Cmd>) {
            (
                Seeded(Counter::default()),
                Some(command::sequence(vec![
                    command::batch(vec![inc(), inc()]),
                    inc(),
                    command::quit(),
                ])),
            )
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            self.0.update(msg)
        }

        fn view(&self) -> View {
            self.0.view()
        }
    }

    let program = bubbletea_rs::Program::<Seeded>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    assert_eq!(model.0.count, 3);
}

#[tokio::test]
async fn batch_increments_counter_in_any_order() {
    #[derive(Debug, Default)]
    struct Seeded(Counter);

    impl Model for Seeded {
        fn init() -> (Self, Option<Cmd>) {
            (Seeded(Counter::default()), Some(command::batch(vec![inc(), inc()])))
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            let cmd = self.0.update(msg);
            if self.0.count >= 2 {
                return Some(command::quit());
            }
            cmd
        }

        fn view(&self) -> View {
            self.0.view()
        }
    }

    let program = bubbletea_rs::Program::<Seeded>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    assert_eq!(model.0.count, 2);
}

#[derive(Debug, Default)]
struct QuitGate {
    allow_quit: bool,
}

impl Model for QuitGate {
    fn init() -> (Self, Option<Cmd>) {
        (QuitGate::default(), None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        // Msg::Quit is handled by the orchestrator directly and never
        // reaches `update` (spec.md §4.5): only the AllowQuit branch
        // observes anything here.
        match msg {
            Msg::User(m) if m.downcast_ref::<AllowQuit>().is_some() => {
                self.allow_quit = true;
                Some(command::quit())
            }
            _ => None,
        }
    }

    fn view(&self) -> View {
        View::new("")
    }
}

#[derive(Debug)]
struct AllowQuit;

#[tokio::test]
async fn filter_nullified_quit_is_ignored_until_allowed() {
    let first_quit_attempt = Box::pin(async { Some(Msg::Quit) }) as Cmd;
    let allow = Box::pin(async {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Some(Msg::user(AllowQuit))
    }) as Cmd;

    struct Seeded(QuitGate);

    impl Model for Seeded {
        fn init() -> (Self, Option<Cmd>) {
            (
                Seeded(QuitGate::default()),
                Some(command::sequence(vec![first_quit_attempt, allow])),
            )
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            self.0.update(msg)
        }

        fn view(&self) -> View {
            self.0.view()
        }
    }

    let seen_first_quit = std::sync::atomic::AtomicBool::new(false);
    let program = bubbletea_rs::Program::<Seeded>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .filter(move |_model, msg| {
            if matches!(msg, Msg::Quit)
                && !seen_first_quit.swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return None;
            }
            Some(msg)
        })
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    // Reaching here at all proves the first (filtered) Quit did not end the
    // program; only the second Quit, issued after `allow_quit` was set,
    // terminated the loop.
    assert!(model.0.allow_quit);
}
