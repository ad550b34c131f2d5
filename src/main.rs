//! Entry point: wires CLI → config → logging → `Engine` → terminal event
//! loop.
//!
//! This is the thin orchestrator that connects the engine to its
//! collaborators. It never touches the gap buffer, block cache, or
//! renderer directly — all of that lives behind `Engine::frame()`.

mod block;
mod cli;
mod config;
mod edits;
mod error;
mod gap;
mod engine;
mod highlight;
mod md;
mod overlays;
mod persist;
mod recognizers;
mod render;
mod sink;
mod term_sink;
mod undo;
mod wrap;

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use ratatui::crossterm::event::{
    self, Event, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::Engine;
use crate::highlight::SyntectHighlighter;
use crate::persist::FsPersistence;
use crate::sink::{
    Capabilities, InputSource, KeyCode, KeyEvent, KeyMods, Persistence, SystemClock, TimeSource,
    UnsupportedImageSink, UnsupportedMathSink,
};

/// Set to `true` immediately after `ratatui::init()` so the panic hook knows
/// whether the terminal has been initialised and needs restoring.
///
/// Calling `ratatui::restore()` before `ratatui::init()` sends spurious
/// escape sequences to the terminal, which can corrupt the calling shell's
/// display on some terminals and multiplexers.
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Input poll timeout: short enough that autosave/idle checks in
/// `Engine::frame` stay responsive even with no key pressed.
const POLL_TIMEOUT: Duration = Duration::from_millis(7);

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("mdink");
    std::fs::create_dir_all(&log_dir).ok()?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "mdink.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    // Logging never writes to stdout/stderr: those belong to the alternate
    // screen the editor draws into.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();
    Some(guard)
}

fn map_key_code(code: CtKeyCode) -> Option<KeyCode> {
    Some(match code {
            CtKeyCode::Char(c) => KeyCode::Char(c),
            CtKeyCode::Enter => KeyCode::Enter,
            CtKeyCode::Backspace => KeyCode::Backspace,
            CtKeyCode::Delete => KeyCode::Delete,
            CtKeyCode::Tab => KeyCode::Tab,
            CtKeyCode::Esc => KeyCode::Esc,
            CtKeyCode::Up => KeyCode::Up,
            CtKeyCode::Down => KeyCode::Down,
            CtKeyCode::Left => KeyCode::Left,
            CtKeyCode::Right => KeyCode::Right,
            CtKeyCode::Home => KeyCode::Home,
            CtKeyCode::End => KeyCode::End,
            CtKeyCode::PageUp => KeyCode::PageUp,
            CtKeyCode::PageDown => KeyCode::PageDown,
            _ => return None,
    })
}

fn map_mods(mods: KeyModifiers) -> KeyMods {
    KeyMods {
        shift: mods.contains(KeyModifiers::SHIFT),
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
    }
}

/// `InputSource` backed by `crossterm`'s event queue. Resize events aren't
/// part of the `KeyEvent` stream; they're buffered here and drained
/// by the host loop between frames.
struct CrosstermInput {
    pending_resize: Option<(u16, u16)>,
}

impl CrosstermInput {
    fn new() -> Self {
        CrosstermInput { pending_resize: None }
    }

    fn take_resize(&mut self) -> Option<(u16, u16)> {
        self.pending_resize.take()
    }
}

impl InputSource for CrosstermInput {
    fn read_key(&mut self) -> io::Result<Option<KeyEvent>> {
        if !event::poll(POLL_TIMEOUT)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(k) => {
                if k.kind == KeyEventKind::Release {
                    return Ok(None);
                }
                Ok(map_key_code(k.code).map(|code| KeyEvent { code, mods: map_mods(k.modifiers) }))
            }
            Event::Resize(cols, rows) => {
                self.pending_resize = Some((cols, rows));
                Ok(None)
            }
            Event::Mouse(m) => {
                let code = match m.kind {
                    MouseEventKind::ScrollUp => Some(KeyCode::MouseScrollUp),
                    MouseEventKind::ScrollDown => Some(KeyCode::MouseScrollDown),
                    MouseEventKind::Down(MouseButton::Left) => {
                        Some(KeyCode::MouseClick { row: m.row, col: m.column })
                    }
                    _ => None,
                };
                Ok(code.map(|code| KeyEvent { code, mods: map_mods(m.modifiers) }))
            }
            _ => Ok(None),
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _log_guard = init_logging();

    // Chain our panic hook to restore the terminal before printing the backtrace.
    // The restore is guarded by TERMINAL_ACTIVE so it only runs after ratatui::init().
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
                if TERMINAL_ACTIVE.load(Ordering::SeqCst) {
                    ratatui::restore();
                }
                original_hook(info);
    }));

    let cli = Cli::parse();

    let config_path = cli
    .config
    .as_ref()
    .map(std::path::PathBuf::from)
    .or_else(Config::default_path);
    let config = config_path.as_deref().map(Config::load).unwrap_or_default();

    let persist = FsPersistence;
    let mut app_engine = Engine::new(cli.theme.into());
    app_engine.config = config;

    if let Some(file) = &cli.file {
        let path = Path::new(file);
        if cli.plain {
            app_engine.preview_document(&persist, path)?;
        } else {
            app_engine.load_document(&persist, path)?;
        }
    }

    let (cols, rows) = term_sink::terminal_size().unwrap_or((80, 24));
    app_engine.update_size(cols, rows);

    // `ratatui::init()` only manages raw mode + the alternate screen here;
    // drawing goes through `TermSink` directly, never through a `Frame`.
    let _terminal = ratatui::init();
    TERMINAL_ACTIVE.store(true, Ordering::SeqCst);

    let result = run_event_loop(&mut app_engine, &persist);

    ratatui::restore();
    result
}

fn run_event_loop(engine: &mut Engine, persist: &dyn Persistence) -> color_eyre::Result<()> {
    let caps = term_sink::detect_capabilities();
    let stdout = io::stdout();
    let mut sink = term_sink::TermSink::new(stdout, caps);
    let mut highlighter = SyntectHighlighter::default();
    let mut images = UnsupportedImageSink;
    let mut math = UnsupportedMathSink;
    let clock = SystemClock;
    let mut input = CrosstermInput::new();

    loop {
        if let Some((cols, rows)) = input.take_resize() {
            engine.update_size(cols, rows);
        }

        let keep_going = engine.frame(&mut input, &clock, persist, &mut sink, &mut highlighter, &mut images, &mut math)?;

        if let Some((cols, rows)) = input.take_resize() {
            engine.update_size(cols, rows);
        }

        if !keep_going {
            break;
        }
    }

    Ok(())
}
