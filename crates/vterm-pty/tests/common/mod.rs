//! Shared helpers for vterm-pty integration tests

#![allow(dead_code)]

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use vterm_pty::{HostSurface, SessionError, TerminalSession, UpdateOutcome};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("vterm_pty=debug,vterm_terminal=debug")),
            )
            .with_test_writer()
            .init();
    });
}

/// Host surface with a fixed readiness answer
pub struct StubSurface(pub bool);

impl HostSurface for StubSurface {
    fn is_ready(&self) -> bool {
        self.0
    }
}

/// Whole active grid as text, one line per row
pub fn screen_text(session: &TerminalSession) -> String {
    let Some(screen) = session.active_buffer() else {
        return String::new();
    };
    (0..screen.row_count())
        .filter_map(|row| screen.row_text(row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run `update` ticks until `needle` shows on screen, the shell exits, or
/// the timeout passes. Returns the last error seen, if any.
pub fn pump_until(
    session: &mut TerminalSession,
    needle: &str,
    timeout: Duration,
) -> Result<bool, SessionError> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match session.update()? {
            UpdateOutcome::Idle => {
                if screen_text(session).contains(needle) {
                    return Ok(true);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            UpdateOutcome::Consumed | UpdateOutcome::Event(_) => {}
        }
    }
    Ok(screen_text(session).contains(needle))
}

/// Poll `pid` until it has exited or `timeout` passes
pub fn wait_for_exit(pid: Pid, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => std::thread::sleep(Duration::from_millis(10)),
            Ok(_) => return true,
            Err(_) => return false,
        }
    }
    false
}
