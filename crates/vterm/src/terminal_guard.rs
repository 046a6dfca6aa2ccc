//! RAII guard for the hosting terminal while vterm draws into it

use anyhow::Result;
use crossterm::{cursor, execute, terminal};
use std::io;
use tracing::subscriber::NoSubscriber;
use tracing_subscriber::util::SubscriberInitExt;

/// Owns raw mode and the alternate screen of the hosting terminal.
///
/// Acquiring the guard silences tracing unless a file subscriber was
/// installed first, so log lines never land on the drawn frame.
pub struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen: bool,
    // Raw mode is process-wide; keep the guard on one thread
    _marker: std::marker::PhantomData<*const ()>,
}

impl TerminalGuard {
    pub fn acquire() -> Result<Self> {
        // Fails harmlessly when a log-file subscriber is already global
        let _ = NoSubscriber::default().try_init();

        Ok(Self {
            raw_mode_enabled: false,
            alternate_screen: false,
            _marker: std::marker::PhantomData,
        })
    }

    /// Enter raw mode and switch to a clean alternate screen
    pub fn enter(&mut self) -> Result<()> {
        if !self.raw_mode_enabled {
            terminal::enable_raw_mode()?;
            self.raw_mode_enabled = true;
        }
        if !self.alternate_screen {
            execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::MoveTo(0, 0))?;
            self.alternate_screen = true;
        }
        Ok(())
    }

    /// Restore the terminal as it was before [`TerminalGuard::enter`]
    pub fn leave(&mut self) -> Result<()> {
        if self.alternate_screen {
            execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
            self.alternate_screen = false;
        }
        if self.raw_mode_enabled {
            terminal::disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        Ok(())
    }

    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode_enabled
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}
