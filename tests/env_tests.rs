//! Integration tests for environment-driven color profile detection as
//! surfaced through a running `Program`.

use bubbletea_rs::{Cmd, ColorProfile, Model, Msg, View};
use std::collections::HashMap;
use std::io::Cursor;

struct ColorSpy {
    reported: Option<ColorProfile>,
}

impl Model for ColorSpy {
    fn init() -> (Self, Option<Cmd>) {
        (ColorSpy { reported: None }, None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Msg::ColorProfileReport(profile) = msg {
            self.reported = Some(profile);
            return Some(bubbletea_rs::quit());
        }
        None
    }

    fn view(&self) -> View {
        View::new("")
    }
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn truecolor_env_is_reported_to_the_model() {
    let profile = ColorProfile::detect(&env(&[("COLORTERM", "truecolor")]), true);
    let program = bubbletea_rs::Program::<ColorSpy>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .with_color_profile(profile)
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    assert_eq!(model.reported, Some(ColorProfile::TrueColor));
}

#[tokio::test]
async fn no_color_env_degrades_to_ascii() {
    let profile = ColorProfile::detect(&env(&[("NO_COLOR", "1")]), true);
    assert_eq!(profile, ColorProfile::Ascii);

    let program = bubbletea_rs::Program::<ColorSpy>::builder()
        .with_input(Cursor::new(Vec::<u8>::new()))
        .without_renderer()
        .without_signal_handler()
        .with_color_profile(profile)
        .build()
        .unwrap();

    let model = tokio::time::timeout(std::time::Duration::from_secs(5), program.run())
        .await
        .expect("program did not exit")
        .expect("program errored");

    assert_eq!(model.reported, Some(ColorProfile::Ascii));
}

#[tokio::test]
async fn non_tty_output_forces_no_tty_profile_regardless_of_env() {
    let profile = ColorProfile::detect(&env(&[("COLORTERM", "truecolor")]), false);
    assert_eq!(profile, ColorProfile::NoTty);
}
