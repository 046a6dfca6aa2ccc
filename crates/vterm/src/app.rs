//! Vterm host loop
//!
//! Owns the hosting terminal, feeds key presses to the session, pumps
//! shell output through the parser and draws the active buffer, once per
//! frame in that order.

use crate::input::{map_key, Action};
use crate::render::Renderer;
use crate::terminal_guard::TerminalGuard;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{event, terminal};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vterm_pty::{
    HostSurface, InputEvent, SessionConfig, SessionError, TerminalSession, UpdateOutcome,
};
use vterm_terminal::{DisplayMode, TerminalEvent};

/// Upper bound on the wait for input each frame
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shell output bytes applied per frame before drawing
const BYTES_PER_FRAME: usize = 4096;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Vterm - a small terminal emulator")]
pub struct Args {
    /// Session config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Shell to run in each buffer
    #[arg(short, long)]
    pub shell: Option<PathBuf>,

    /// TERM value for the shell
    #[arg(long)]
    pub term: Option<String>,

    /// Display mode number of the first buffer
    #[arg(long)]
    pub mode: Option<u8>,

    /// Initial font size in pixels
    #[arg(long)]
    pub font_size: Option<u16>,

    /// Write logs here; without it logging is off while drawing
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Config file contents (or defaults) with command-line flags on top
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => SessionConfig::default(),
        };

        if let Some(shell) = &self.shell {
            config.shell = shell.clone();
        }
        if let Some(term) = &self.term {
            config.term = term.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(font_size) = self.font_size {
            config.font_size = font_size;
        }
        Ok(config)
    }
}

/// The hosting terminal stands in for the window
struct HostTerminal;

impl HostSurface for HostTerminal {
    fn is_ready(&self) -> bool {
        terminal::size().is_ok()
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let level = args.log_level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vterm={level},vterm_pty={level},vterm_terminal={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    let config = args.session_config()?;

    let mut guard = TerminalGuard::acquire()?;
    let mut session =
        TerminalSession::init(&HostTerminal, config).context("Failed to start session")?;
    info!("Session started with {}", session.config().shell.display());

    guard.enter()?;
    let mut renderer = Renderer::new(io::stdout());
    let result = host_loop(&mut session, &mut renderer);
    guard.leave()?;

    result
}

fn host_loop<W: Write>(session: &mut TerminalSession, renderer: &mut Renderer<W>) -> Result<()> {
    loop {
        let input = collect_input(session, renderer)?;

        let mut alive = step(session.send_input(input), session, renderer)?;
        if alive {
            alive = pump_output(session, renderer)?;
        }
        if !alive {
            info!("Last buffer closed");
            return Ok(());
        }

        if let Some(snapshot) = session.snapshot() {
            renderer.draw(&snapshot)?;
        }
    }
}

/// Wait up to one frame for key presses and apply the ones that are
/// not shell input. Returns the shell input in arrival order.
fn collect_input<W: Write>(
    session: &mut TerminalSession,
    renderer: &mut Renderer<W>,
) -> Result<Vec<InputEvent>> {
    let mut input = Vec::new();
    let mut timeout = FRAME_INTERVAL;

    while event::poll(timeout)? {
        timeout = Duration::ZERO;
        match event::read()? {
            event::Event::Key(key) => match map_key(key) {
                Some(Action::Input(ev)) => input.push(ev),
                Some(Action::Font(delta)) => {
                    session.resize_font(delta)?;
                    update_title(session, renderer)?;
                }
                Some(Action::Switch(slot)) => {
                    switch_buffer(session, slot)?;
                    renderer.invalidate();
                    update_title(session, renderer)?;
                }
                None => {}
            },
            event::Event::Resize(..) => renderer.invalidate(),
            _ => {}
        }
    }

    Ok(input)
}

/// Apply shell output to the active buffer until it runs dry or the
/// frame budget is spent. Returns `false` once no buffer is left.
fn pump_output<W: Write>(
    session: &mut TerminalSession,
    renderer: &mut Renderer<W>,
) -> Result<bool> {
    for _ in 0..BYTES_PER_FRAME {
        match session.update() {
            Ok(UpdateOutcome::Idle) => break,
            Ok(UpdateOutcome::Consumed) => {}
            Ok(UpdateOutcome::Event(TerminalEvent::Bell)) => renderer.bell()?,
            Err(e) => return step(Err(e), session, renderer),
        }
    }
    Ok(true)
}

/// Retire the active buffer when its shell has exited; other errors
/// end the session
fn step<W: Write>(
    result: Result<(), SessionError>,
    session: &mut TerminalSession,
    renderer: &mut Renderer<W>,
) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_child_closed() => {
            let dead = session.active_index();
            session.close_buffer(dead)?;
            debug!("Retired buffer {}", dead);

            let next = session.buffer_slots().next();
            match next {
                Some(next) => {
                    session.select_buffer(next)?;
                    renderer.invalidate();
                    update_title(session, renderer)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn switch_buffer(session: &mut TerminalSession, slot: usize) -> Result<(), SessionError> {
    if !session.buffer_slots().any(|s| s == slot) {
        session.init_buffer(slot, DisplayMode::default())?;
    }
    session.select_buffer(slot)
}

fn update_title<W: Write>(session: &TerminalSession, renderer: &mut Renderer<W>) -> Result<()> {
    let (width, height) = session.pixel_size();
    let font_size = session.active_buffer().map_or(0, |b| b.font_size());
    renderer.set_title(&format!(
        "vterm [{}] {}x{} font {}",
        session.active_index() + 1,
        width,
        height,
        font_size
    ))?;
    Ok(())
}
