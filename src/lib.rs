//! # bubbletea-rs
//!
//! A comprehensive Rust implementation of the Bubble Tea TUI framework.
//! This library provides developers with the tools to build interactive terminal
//! applications using the Model-View-Update (MVU) architecture pattern.
//!
//! ## Features
//!
//! - **Model-View-Update Architecture**: Clean separation of state, logic, and rendering
//! - **Async Command System**: Non-blocking operations with command-based side effects
//! - **Terminal Interface Abstraction**: Works with real terminals and test environments
//! - **Comprehensive Event Handling**: Keyboard, mouse, window resize, focus, and paste events
//! - **Memory Monitoring**: Built-in memory usage tracking and leak detection
//! - **Flexible Input Sources**: Support for different input mechanisms and testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bubbletea_rs::{Model, Program, Msg, Cmd, View};
//!
//! struct MyModel {
//!     counter: i32,
//! }
//!
//! impl Model for MyModel {
//!     fn init() -> (Self, Option<Cmd>) {
//!         (Self { counter: 0 }, None)
//!     }
//!
//!     fn update(&mut self, _msg: Msg) -> Option<Cmd> {
//!         None
//!     }
//!
//!     fn view(&self) -> View {
//!         View::new(format!("Counter: {}", self.counter))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let program = Program::<MyModel>::builder().build()?;
//!     program.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture Overview
//!
//! The library follows the Elm Architecture pattern:
//!
//! 1. **Model**: Your application state implementing the `Model` trait
//! 2. **Messages**: Events that trigger state changes (keyboard, mouse, timers, etc.)
//! 3. **Update**: Process messages and optionally issue commands
//! 4. **View**: A declarative description of what the terminal should show
//! 5. **Commands**: Async operations that can produce future messages
//!
//! ## Memory Safety
//!
//! The framework includes built-in memory monitoring to help detect leaks and optimize
//! performance. Use the `MemoryMonitor` to track allocations in your applications.
//!
//! ## Testing
//!
//! Testing is supported through the `DummyTerminal` which allows you to test your
//! applications without requiring an actual terminal interface.

#![warn(missing_docs)]

/// ANSI/VT100 escape sequence construction and terminal capability queries.
pub mod ansi;
/// The in-memory cell grid the renderer diffs against.
pub mod cellbuf;
/// Color profiles and color representations.
pub mod color;
/// Commands for async operations that produce messages.
pub mod command;
/// Error types and handling.
pub mod error;
/// Input handling: TTY reading, byte-stream decoding, and the Windows console path.
pub mod input;
/// Logical keyboard representation.
pub mod key;
/// Logging utilities for debugging and monitoring.
pub mod logging;
/// Message envelope and the effect values commands resolve to.
pub mod message;
/// Memory monitoring and leak detection.
pub mod memory;
/// The core Model trait defining application behavior.
pub mod model;
/// Mouse event representation.
pub mod mouse;
/// Stateful escape-sequence parser turning raw bytes into messages.
pub mod parser;
/// Program runtime and builder for TUI applications.
pub mod program;
/// Diff-based frame renderer.
pub mod renderer;
/// The command scheduler: batch/sequence fan-out and cancellation.
pub mod scheduler;
/// Terminal interface abstraction and implementations.
pub mod terminal;
/// The declarative `View` a model's `view()` method returns.
pub mod view;

pub use color::{Color, ColorProfile};
pub use command::{
    batch, cursor_position, every, exec_process, keyboard_enhancements, print_line_above, quit,
    read_clipboard, resume, sequence, set_clipboard, suspend, tick, window_size,
};
pub use error::Error;
pub use key::{Functional, Key, KeyCode, Modifiers};
pub use message::{AnyMsg, ClipboardKind, Cmd, ExecProcess, Msg};
pub use model::Model;
pub use mouse::{Mouse, MouseButton, MouseEventKind};
pub use program::{Program, ProgramBuilder, ProgramConfig};
pub use renderer::Renderer;
pub use scheduler::Scheduler;
pub use terminal::{DummyTerminal, Terminal, TerminalInterface};
pub use view::{Cursor, CursorShape, KeyboardEnhancements, MouseMode, ProgressBar, ProgressState, View};

#[cfg(feature = "logging")]
pub use logging::log_to_file;

pub mod prelude {
    //! Convenient re-exports of the most commonly used types.

    pub use crate::{Cmd, Error, Key, KeyCode, Model, Msg, Program, View};

    #[cfg(feature = "logging")]
    pub use crate::log_to_file;
}
