//! The `Program` orchestrator (spec.md §4.5): wires the input reader, the
//! command scheduler, and the renderer around a [`Model`], and drives the
//! update/render loop until a `Quit` message ends it.

use crate::color::ColorProfile;
use crate::input::InputReader;
use crate::message::ClipboardKind;
use crate::model::Model;
use crate::renderer::Renderer;
use crate::scheduler::Scheduler;
use crate::terminal::{DummyTerminal, Terminal, TerminalInterface};
use crate::{ansi, Error, Msg};
use std::collections::HashMap;
use std::io::{IsTerminal, Read, Write};
use std::marker::PhantomData;
use std::panic;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type PanicHook = dyn Fn(&panic::PanicHookInfo<'_>) + Send + Sync + 'static;
static ORIGINAL_PANIC_HOOK: OnceLock<Arc<PanicHook>> = OnceLock::new();

/// Alias for a model-aware message filter function, consulted before every
/// message reaches `Model::update` (spec.md §6).
type MessageFilter<M> = Box<dyn Fn(&M, Msg) -> Option<Msg> + Send>;

/// Configuration options for a [`Program`] (spec.md §6's `ProgramConfig`
/// table). Most fields are populated through [`ProgramBuilder`]; the struct
/// itself stays public so callers that build many similarly-configured
/// programs can clone a base config.
pub struct ProgramConfig {
    /// Custom output sink. `None` uses stdout.
    pub output: Option<Box<dyn Write + Send>>,
    /// Custom input source. `None` reads the real terminal device.
    pub input: Option<Box<dyn Read + Send>>,
    /// Environment snapshot used for color-profile detection and passed to
    /// spawned child processes.
    pub environ: HashMap<String, String>,
    /// Skip installing the Ctrl+C handler.
    pub disable_signal_handler: bool,
    /// Skip installing the panic hook that turns panics into `ProgramPanicked`.
    pub disable_panic_catch: bool,
    /// Install the signal handler but swallow the signal instead of
    /// injecting `Msg::Quit`.
    pub ignore_signals: bool,
    /// Target frames per second, clamped to `[1, 120]`.
    pub fps: u32,
    /// Force a specific color profile instead of detecting one.
    pub color_profile: Option<ColorProfile>,
    /// Seed size to use before the first real size query (or when stdout
    /// isn't a TTY at all).
    pub initial_window_size: Option<(u16, u16)>,
    /// Skip constructing a renderer entirely; `Model::view` is still called
    /// but nothing is written anywhere. Useful for headless tests.
    pub disable_renderer: bool,
    /// Inbox buffer size. `None` uses an unbounded channel.
    pub event_channel_buffer: Option<usize>,
    /// Track timer/task/channel-depth counters via `MemoryMonitor`.
    pub memory_monitoring: bool,
    /// External cancellation token; cancelling it ends the run loop as if
    /// `Msg::Quit` had been received.
    pub cancellation_token: Option<CancellationToken>,
}

impl std::fmt::Debug for ProgramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramConfig")
            .field("fps", &self.fps)
            .field("disable_renderer", &self.disable_renderer)
            .field("disable_signal_handler", &self.disable_signal_handler)
            .field("disable_panic_catch", &self.disable_panic_catch)
            .field("ignore_signals", &self.ignore_signals)
            .field("color_profile", &self.color_profile)
            .field("initial_window_size", &self.initial_window_size)
            .field("memory_monitoring", &self.memory_monitoring)
            .field("environ", &self.environ.len())
            .finish_non_exhaustive()
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            output: None,
            input: None,
            environ: std::env::vars().collect(),
            disable_signal_handler: false,
            disable_panic_catch: false,
            ignore_signals: false,
            fps: 60,
            color_profile: None,
            initial_window_size: None,
            disable_renderer: false,
            event_channel_buffer: Some(1000),
            memory_monitoring: false,
            cancellation_token: None,
        }
    }
}

/// A fluent builder for [`Program`].
pub struct ProgramBuilder<M: Model> {
    config: ProgramConfig,
    filter: Option<MessageFilter<M>>,
    _phantom: PhantomData<M>,
}

impl<M: Model> ProgramBuilder<M> {
    pub(crate) fn new() -> Self {
        Self {
            config: ProgramConfig::default(),
            filter: None,
            _phantom: PhantomData,
        }
    }

    /// Use a custom output sink instead of stdout.
    pub fn with_output(mut self, writer: impl Write + Send + 'static) -> Self {
        self.config.output = Some(Box::new(writer));
        self
    }

    /// Use a custom input source instead of the real terminal device.
    pub fn with_input(mut self, reader: impl Read + Send + 'static) -> Self {
        self.config.input = Some(Box::new(reader));
        self
    }

    /// Override the environment snapshot used for color-profile detection
    /// and child-process spawning.
    pub fn with_environment(mut self, env: HashMap<String, String>) -> Self {
        self.config.environ = env;
        self
    }

    /// Skip installing the Ctrl+C signal handler.
    pub fn without_signal_handler(mut self) -> Self {
        self.config.disable_signal_handler = true;
        self
    }

    /// Skip installing the panic hook.
    pub fn without_panic_catch(mut self) -> Self {
        self.config.disable_panic_catch = true;
        self
    }

    /// Install the signal handler but don't let it inject `Msg::Quit`.
    pub fn ignoring_signals(mut self) -> Self {
        self.config.ignore_signals = true;
        self
    }

    /// Set the target frames per second, clamped to `[1, 120]`.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.config.fps = fps.clamp(1, 120);
        self
    }

    /// Force a specific color profile instead of detecting one from the
    /// environment.
    pub fn with_color_profile(mut self, profile: ColorProfile) -> Self {
        self.config.color_profile = Some(profile);
        self
    }

    /// Seed the initial window size, used before the first real size query
    /// (and always, when output isn't a TTY).
    pub fn with_initial_window_size(mut self, width: u16, height: u16) -> Self {
        self.config.initial_window_size = Some((width, height));
        self
    }

    /// Disable the renderer entirely. `Model::view` is still called on every
    /// update but nothing is written anywhere.
    pub fn without_renderer(mut self) -> Self {
        self.config.disable_renderer = true;
        self
    }

    /// Set the inbox buffer size; `None` selects an unbounded channel.
    pub fn event_channel_buffer(mut self, buffer_size: Option<usize>) -> Self {
        self.config.event_channel_buffer = buffer_size;
        self
    }

    /// Track timer/task/channel-depth counters via `MemoryMonitor`.
    pub fn memory_monitoring(mut self, enabled: bool) -> Self {
        self.config.memory_monitoring = enabled;
        self
    }

    /// Provide an external cancellation token; cancelling it ends the run
    /// loop as if `Msg::Quit` had been received.
    pub fn context(mut self, token: CancellationToken) -> Self {
        self.config.cancellation_token = Some(token);
        self
    }

    /// Install a model-aware message filter, consulted before every message
    /// reaches `Model::update`. Returning `None` drops the message.
    pub fn filter(mut self, f: impl Fn(&M, Msg) -> Option<Msg> + Send + 'static) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<Program<M>, Error> {
        Program::new(self.config, self.filter)
    }
}

/// The main orchestrator: owns the terminal, the renderer, the command
/// scheduler, and the inbox that every decoded input event and resolved
/// command funnels through.
pub struct Program<M: Model> {
    pub config: ProgramConfig,
    inbox_tx: mpsc::Sender<Msg>,
    inbox_rx: mpsc::Receiver<Msg>,
    terminal: Option<Box<dyn TerminalInterface + Send>>,
    renderer: Option<Arc<Renderer>>,
    task_set: JoinSet<()>,
    shutdown_token: CancellationToken,
    memory_monitor: Option<crate::memory::MemoryMonitor>,
    filter: Option<MessageFilter<M>>,
    _phantom: PhantomData<M>,
}

impl<M: Model> Program<M> {
    pub fn builder() -> ProgramBuilder<M> {
        ProgramBuilder::new()
    }

    fn new(config: ProgramConfig, filter: Option<MessageFilter<M>>) -> Result<Self, Error> {
        // `event_channel_buffer: None` means "don't apply backpressure"; the
        // bounded channel type is kept uniform by picking a buffer large
        // enough that it never fills under normal event volume.
        const UNBOUNDED_BUFFER: usize = 65_536;
        let (inbox_tx, inbox_rx) = mpsc::channel(config.event_channel_buffer.unwrap_or(UNBOUNDED_BUFFER));

        let memory_monitor = config
            .memory_monitoring
            .then(crate::memory::MemoryMonitor::new);

        Ok(Self {
            config,
            inbox_tx,
            inbox_rx,
            terminal: None,
            renderer: None,
            task_set: JoinSet::new(),
            shutdown_token: config_token(),
            memory_monitor,
            filter,
            _phantom: PhantomData,
        })
    }

    /// Runs the application until `Msg::Quit`, external cancellation, an
    /// unrecovered panic, or the inbox closing unexpectedly.
    pub async fn run(mut self) -> Result<M, Error> {
        if let Some(token) = self.config.cancellation_token.clone() {
            self.shutdown_token = token.child_token();
        }

        let panic_rx = if self.config.disable_panic_catch {
            None
        } else {
            Some(self.install_panic_hook())
        };

        let color_profile = self.config.color_profile.unwrap_or_else(|| {
            let is_tty = self
                .config
                .output
                .is_none()
                .then(|| std::io::stdout().is_terminal())
                .unwrap_or(false);
            ColorProfile::detect(&self.config.environ, is_tty)
        });

        let is_real_tty = self.config.input.is_none()
            && self.config.output.is_none()
            && std::io::stdin().is_terminal();

        let (width, height) = self.resolve_initial_size(is_real_tty);

        if is_real_tty {
            let mut terminal = Terminal::new();
            terminal.enter_raw_mode()?;
            self.terminal = Some(Box::new(terminal));
        } else {
            self.terminal = Some(Box::new(DummyTerminal::new(width, height)));
        }

        if !self.config.disable_renderer {
            let output: Box<dyn Write + Send> = match self.config.output.take() {
                Some(w) => w,
                None => Box::new(std::io::stdout()),
            };
            self.renderer = Some(Arc::new(Renderer::new(output, width, height)));
        }

        let (mut model, init_cmd) = M::init();
        let scheduler = Scheduler::new(self.inbox_tx.clone(), self.shutdown_token.clone());
        if let Some(cmd) = init_cmd {
            scheduler.spawn(cmd);
        }

        let mut input_reader = if let Some(source) = self.config.input.take() {
            Some(InputReader::spawn_reader(source, self.inbox_tx.clone()))
        } else if is_real_tty {
            Some(InputReader::spawn_tty(self.inbox_tx.clone()))
        } else {
            None
        };

        let _ = self
            .inbox_tx
            .try_send(Msg::ColorProfileReport(color_profile));

        if let Some(renderer) = &self.renderer {
            renderer.render(model.view());
            renderer.flush(false)?;
        }

        self.spawn_ticker();
        if is_real_tty {
            self.spawn_resize_watch();
        }
        if !self.config.disable_signal_handler {
            self.spawn_signal_handler();
        }

        let outcome = self.drive(&mut model, &scheduler, panic_rx).await;

        if let Some(reader) = &mut input_reader {
            reader.stop();
        }
        self.shutdown_token.cancel();
        self.task_set.shutdown().await;
        if let Some(renderer) = &self.renderer {
            let _ = renderer.close();
        }
        if let Some(terminal) = &mut self.terminal {
            let _ = terminal.exit_raw_mode();
        }
        if !self.config.disable_panic_catch {
            if let Some(original) = ORIGINAL_PANIC_HOOK.get() {
                let original = original.clone();
                panic::set_hook(Box::new(move |info| original(info)));
            }
        }

        outcome.map(|()| model)
    }

    async fn drive(
        &mut self,
        model: &mut M,
        scheduler: &Scheduler,
        mut panic_rx: Option<mpsc::UnboundedReceiver<String>>,
    ) -> Result<(), Error> {
        loop {
            let msg = tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => return Err(Error::ProgramKilled),
                Some(text) = recv_panic(&mut panic_rx) => return Err(Error::program_panicked(text)),
                received = self.inbox_rx.recv() => match received {
                    Some(m) => m,
                    None => return Ok(()),
                },
            };

            if let Some(monitor) = &self.memory_monitor {
                monitor.message_processed();
                monitor.set_channel_depth(self.inbox_rx.len() as u64);
            }

            let msg = match &self.filter {
                Some(f) => match f(model, msg) {
                    Some(m) => m,
                    None => continue,
                },
                None => msg,
            };

            match msg {
                Msg::Quit => return Ok(()),
                Msg::Suspend => {
                    self.release_terminal()?;
                    self.dispatch(model, Msg::Suspend, scheduler);
                }
                Msg::Resume => {
                    self.restore_terminal()?;
                    self.dispatch(model, Msg::Resume, scheduler);
                }
                Msg::ExecProcess(exec) => {
                    self.release_terminal()?;
                    let crate::message::ExecProcess { mut command, on_exit } = exec;
                    let status = command.status().await;
                    self.restore_terminal()?;
                    let _ = self.inbox_tx.send(on_exit(status)).await;
                }
                Msg::Batch(cmds) => scheduler.spawn_batch(cmds),
                Msg::Sequence(cmds) => scheduler.spawn_sequence(cmds),
                Msg::PrintLineAbove(line) => {
                    if let Some(renderer) = &self.renderer {
                        renderer.print_line_above(line);
                    }
                }
                Msg::RequestWindowSize => self.write_query(ansi::request_window_size),
                Msg::RequestCursorPosition => self.write_query(ansi::request_cursor_position),
                Msg::RequestKeyboardEnhancements => {
                    self.write_query(ansi::request_kitty_keyboard_flags)
                }
                Msg::SetClipboard { kind, content } => {
                    if let Some(renderer) = &self.renderer {
                        let mut out = String::new();
                        ansi::set_clipboard(&mut out, clipboard_selector(kind), &content);
                        let _ = renderer.write_raw(out.as_bytes());
                    }
                }
                Msg::ReadClipboard { kind } => {
                    if let Some(renderer) = &self.renderer {
                        let mut out = String::new();
                        ansi::request_clipboard(&mut out, clipboard_selector(kind));
                        let _ = renderer.write_raw(out.as_bytes());
                    }
                }
                Msg::WindowSize { width, height } => {
                    if let Some(renderer) = &self.renderer {
                        renderer.resize(width, height);
                    }
                    self.dispatch(model, Msg::WindowSize { width, height }, scheduler);
                }
                other => self.dispatch(model, other, scheduler),
            }
        }
    }

    /// Call `Model::update`, spawn its follow-up command if any, and render
    /// the resulting view.
    fn dispatch(&self, model: &mut M, msg: Msg, scheduler: &Scheduler) {
        if let Some(cmd) = model.update(msg) {
            scheduler.spawn(cmd);
        }
        if let Some(renderer) = &self.renderer {
            renderer.render(model.view());
        }
    }

    fn write_query(&self, f: fn(&mut String)) {
        if let Some(renderer) = &self.renderer {
            let mut out = String::new();
            f(&mut out);
            let _ = renderer.write_raw(out.as_bytes());
        }
    }

    /// Release the terminal to an external process: restore cooked mode
    /// and reset every mode the renderer had toggled (spec.md §4.5, §4.6).
    fn release_terminal(&mut self) -> Result<(), Error> {
        if let Some(renderer) = &self.renderer {
            renderer.close()?;
        }
        if let Some(terminal) = &mut self.terminal {
            terminal.exit_raw_mode()?;
        }
        Ok(())
    }

    /// Reclaim the terminal after [`release_terminal`](Self::release_terminal):
    /// re-enter raw mode and force the next frame to re-apply every mode
    /// from scratch, since whatever ran in between may have left the
    /// terminal in an unknown state.
    fn restore_terminal(&mut self) -> Result<(), Error> {
        if let Some(terminal) = &mut self.terminal {
            terminal.enter_raw_mode()?;
        }
        if let Some(renderer) = &self.renderer {
            renderer.reset();
        }
        Ok(())
    }

    fn resolve_initial_size(&self, is_real_tty: bool) -> (u16, u16) {
        if let Some(size) = self.config.initial_window_size {
            return size;
        }
        if is_real_tty {
            if let Ok((w, h)) = crossterm::terminal::size() {
                return (w, h);
            }
        }
        (80, 24)
    }

    fn install_panic_hook(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let original = ORIGINAL_PANIC_HOOK
            .get_or_init(|| Arc::from(panic::take_hook()))
            .clone();
        panic::set_hook(Box::new(move |info| {
            let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            let _ = tx.send(payload);
            original(info);
        }));
        rx
    }

    fn spawn_ticker(&mut self) {
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        let period = std::time::Duration::from_secs_f64(1.0 / self.config.fps as f64);
        let shutdown = self.shutdown_token.clone();
        if let Some(monitor) = &self.memory_monitor {
            monitor.task_spawned();
        }
        self.task_set.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = renderer.flush(false);
                    }
                }
            }
        });
    }

    fn spawn_resize_watch(&mut self) {
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        let inbox = self.inbox_tx.clone();
        let shutdown = self.shutdown_token.clone();
        if let Some(monitor) = &self.memory_monitor {
            monitor.task_spawned();
        }
        self.task_set.spawn(async move {
            let mut last = crossterm::terminal::size().unwrap_or((80, 24));
            let mut ticker = tokio::time::interval(std::time::Duration::from_millis(200));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Ok(size) = crossterm::terminal::size() {
                            if size != last {
                                last = size;
                                renderer.resize(size.0, size.1);
                                let _ = inbox
                                    .send(Msg::WindowSize { width: size.0, height: size.1 })
                                    .await;
                            }
                        }
                    }
                }
            }
        });
    }

    fn spawn_signal_handler(&mut self) {
        let inbox = self.inbox_tx.clone();
        let ignore = self.config.ignore_signals;
        let shutdown = self.shutdown_token.clone();
        if let Some(monitor) = &self.memory_monitor {
            monitor.task_spawned();
        }
        self.task_set.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = tokio::signal::ctrl_c() => {
                        if result.is_err() {
                            break;
                        }
                        if !ignore {
                            let _ = inbox.send(Msg::Quit).await;
                        }
                    }
                }
            }
        });
    }

    /// Write a line directly to stdout, bypassing the renderer. Intended
    /// for debug output; interleaving with an active renderer will corrupt
    /// the frame.
    pub fn println(&self, s: impl AsRef<str>) -> Result<(), Error> {
        println!("{}", s.as_ref());
        std::io::stdout().flush()?;
        Ok(())
    }

    /// Write text directly to stdout with no trailing newline, bypassing
    /// the renderer.
    pub fn printf(&self, s: impl AsRef<str>) -> Result<(), Error> {
        print!("{}", s.as_ref());
        std::io::stdout().flush()?;
        Ok(())
    }
}

fn clipboard_selector(kind: ClipboardKind) -> char {
    match kind {
        ClipboardKind::System => 'c',
        ClipboardKind::Primary => 'p',
    }
}

fn config_token() -> CancellationToken {
    CancellationToken::new()
}

async fn recv_panic(rx: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
