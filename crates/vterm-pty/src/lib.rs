//! PTY (Pseudo-Terminal) handling for Vterm
//!
//! Owns the shell processes behind each screen buffer and drives the
//! per-tick input/update cycle of a terminal session.

pub mod config;
pub mod pty;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use pty::{PtySession, DEFAULT_SHELL, DEFAULT_TERM};
pub use session::{
    HostSurface, InputEvent, Key, TerminalSession, UpdateOutcome, MAX_BUFFER_COUNT,
};

use thiserror::Error;
use vterm_terminal::TerminalError;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to allocate PTY: {0}")]
    Allocation(String),

    #[error("Failed to spawn shell: {0}")]
    Fork(String),

    #[error("Shell already spawned on this PTY")]
    AlreadySpawned,

    #[error("Child process closed the PTY")]
    ChildClosed,

    #[error("PTY I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Drawing surface is not ready")]
    SurfaceNotReady,

    #[error("Buffer slot {0} is out of range")]
    InvalidSlot(usize),

    #[error("Buffer slot {0} is empty")]
    EmptySlot(usize),

    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    Pty(#[from] PtyError),
}

impl SessionError {
    /// The shell behind the active buffer has exited
    pub fn is_child_closed(&self) -> bool {
        matches!(self, SessionError::Pty(PtyError::ChildClosed))
    }
}
