//! The core `Model` trait (spec.md §3), central to the Model-View-Update
//! architecture applications built on this crate follow.

use crate::key::{Functional, KeyCode};
use crate::view::View;
use crate::{Cmd, Msg};

/// Application state and logic, following the Model-View-Update pattern.
///
/// # Trait Bounds
///
/// - `Send`: the model crosses into the orchestrator's async tasks
/// - `Sized`: the model has a known size at compile time
/// - `'static`: the model holds no non-static references
///
/// # Example
///
/// ```rust
/// use bubbletea_rs::{Model, Msg, Cmd, View, key::{KeyCode, Functional}};
///
/// struct Counter {
///     value: i32,
/// }
///
/// impl Model for Counter {
///     fn init() -> (Self, Option<Cmd>) {
///         (Self { value: 0 }, None)
///     }
///
///     fn update(&mut self, msg: Msg) -> Option<Cmd> {
///         if let Msg::KeyPress(key) = msg {
///             match key.code {
///                 KeyCode::Functional(Functional::Up) => self.value += 1,
///                 KeyCode::Functional(Functional::Down) => self.value -= 1,
///                 _ => {}
///             }
///         }
///         None
///     }
///
///     fn view(&self) -> View {
///         View::new(format!("Counter: {} (↑/↓ to change)", self.value))
///     }
/// }
/// ```
pub trait Model: Send + Sized + 'static {
    /// Initialize the model with its initial state and optional command.
    fn init() -> (Self, Option<Cmd>);

    /// Update the model in response to a message.
    fn update(&mut self, msg: Msg) -> Option<Cmd>;

    /// Render the model's declarative terminal state.
    fn view(&self) -> View;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use crate::key::{Key, Modifiers};

    #[derive(Debug, Clone)]
    struct CounterModel {
        count: i32,
        step: i32,
    }

    impl Model for CounterModel {
        fn init() -> (Self, Option<Cmd>) {
            (Self { count: 0, step: 1 }, None)
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            if let Msg::KeyPress(key) = msg {
                match key.code {
                    KeyCode::Functional(Functional::Up) | KeyCode::Char('+') => {
                        self.count += self.step;
                    }
                    KeyCode::Functional(Functional::Down) | KeyCode::Char('-') => {
                        self.count -= self.step;
                    }
                    KeyCode::Char('r') => {
                        self.count = 0;
                    }
                    KeyCode::Char('s') => {
                        self.step = if self.step == 1 { 10 } else { 1 };
                    }
                    KeyCode::Char('q') => {
                        return Some(command::quit());
                    }
                    _ => {}
                }
            }
            None
        }

        fn view(&self) -> View {
            View::new(format!(
                "Counter: {}\nStep: {}\n\nControls:\n↑/+ : Increment\n↓/- : Decrement\nr : Reset\ns : Toggle step (1/10)\nq : Quit",
                self.count, self.step
            ))
        }
    }

    #[derive(Debug, Clone)]
    struct TextInputModel {
        content: String,
        cursor: usize,
        max_length: usize,
    }

    impl Model for TextInputModel {
        fn init() -> (Self, Option<Cmd>) {
            (
                Self {
                    content: String::new(),
                    cursor: 0,
                    max_length: 100,
                },
                None,
            )
        }

        fn update(&mut self, msg: Msg) -> Option<Cmd> {
            if let Msg::KeyPress(key) = msg {
                match key.code {
                    KeyCode::Char(c) if self.content.len() < self.max_length => {
                        self.content.insert(self.cursor, c);
                        self.cursor += 1;
                    }
                    KeyCode::Functional(Functional::Backspace) if self.cursor > 0 => {
                        self.cursor -= 1;
                        self.content.remove(self.cursor);
                    }
                    KeyCode::Functional(Functional::Delete) if self.cursor < self.content.len() => {
                        self.content.remove(self.cursor);
                    }
                    KeyCode::Functional(Functional::Left) if self.cursor > 0 => {
                        self.cursor -= 1;
                    }
                    KeyCode::Functional(Functional::Right) if self.cursor < self.content.len() => {
                        self.cursor += 1;
                    }
                    KeyCode::Functional(Functional::Home) => {
                        self.cursor = 0;
                    }
                    KeyCode::Functional(Functional::End) => {
                        self.cursor = self.content.len();
                    }
                    KeyCode::Functional(Functional::Escape) => {
                        return Some(command::quit());
                    }
                    _ => {}
                }
            }
            None
        }

        fn view(&self) -> View {
            let mut display = self.content.clone();
            display.insert(self.cursor, '|');

            View::new(format!(
                "Text Input ({}/{})\n\n{}\n\nControls:\nType to add text\n← → : Move cursor\nBackspace/Delete : Remove text\nHome/End : Jump to start/end\nEsc : Quit",
                self.content.len(),
                self.max_length,
                display
            ))
        }
    }

    fn key(code: KeyCode) -> Msg {
        Msg::KeyPress(Key::new(code).with_modifiers(Modifiers::empty()))
    }

    #[test]
    fn test_counter_model_init() {
        let (model, cmd) = CounterModel::init();
        assert_eq!(model.count, 0);
        assert_eq!(model.step, 1);
        assert!(cmd.is_none());
    }

    #[test]
    fn test_counter_model_update() {
        let (mut model, _) = CounterModel::init();

        let cmd = model.update(key(KeyCode::Functional(Functional::Up)));
        assert_eq!(model.count, 1);
        assert!(cmd.is_none());

        model.update(key(KeyCode::Functional(Functional::Down)));
        assert_eq!(model.count, 0);

        model.count = 42;
        model.update(key(KeyCode::Char('r')));
        assert_eq!(model.count, 0);
    }

    #[test]
    fn test_counter_model_view() {
        let (model, _) = CounterModel::init();
        let view = model.view();
        assert!(view.content.contains("Counter: 0"));
        assert!(view.content.contains("Step: 1"));
        assert!(view.content.contains("Controls:"));
    }

    #[test]
    fn test_text_input_model_init() {
        let (model, cmd) = TextInputModel::init();
        assert!(model.content.is_empty());
        assert_eq!(model.cursor, 0);
        assert_eq!(model.max_length, 100);
        assert!(cmd.is_none());
    }

    #[test]
    fn test_text_input_model_char_input() {
        let (mut model, _) = TextInputModel::init();

        model.update(key(KeyCode::Char('H')));
        assert_eq!(model.content, "H");
        assert_eq!(model.cursor, 1);

        model.update(key(KeyCode::Char('i')));
        assert_eq!(model.content, "Hi");
        assert_eq!(model.cursor, 2);
    }

    #[test]
    fn test_text_input_model_backspace() {
        let (mut model, _) = TextInputModel::init();
        model.content = "Hello".to_string();
        model.cursor = 5;

        model.update(key(KeyCode::Functional(Functional::Backspace)));
        assert_eq!(model.content, "Hell");
        assert_eq!(model.cursor, 4);
    }

    #[test]
    fn test_text_input_model_cursor_movement() {
        let (mut model, _) = TextInputModel::init();
        model.content = "Hello".to_string();
        model.cursor = 2;

        model.update(key(KeyCode::Functional(Functional::Left)));
        assert_eq!(model.cursor, 1);

        model.update(key(KeyCode::Functional(Functional::Right)));
        assert_eq!(model.cursor, 2);

        model.update(key(KeyCode::Functional(Functional::Home)));
        assert_eq!(model.cursor, 0);

        model.update(key(KeyCode::Functional(Functional::End)));
        assert_eq!(model.cursor, 5);
    }

    #[test]
    fn test_model_trait_bounds() {
        fn assert_send<T: Send>() {}
        fn assert_sized<T: Sized>() {}
        fn assert_static<T: 'static>() {}

        assert_send::<CounterModel>();
        assert_sized::<CounterModel>();
        assert_static::<CounterModel>();

        assert_send::<TextInputModel>();
        assert_sized::<TextInputModel>();
        assert_static::<TextInputModel>();
    }

    #[test]
    fn test_model_send_sync_static() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<CounterModel>();
        assert_send_sync_static::<TextInputModel>();
    }
}
