//! Terminal emulator core implementation
//!
//! Pairs a screen buffer with the parser state that feeds it

use crate::{
    mode::DisplayMode,
    parser::{Parser, TerminalEvent},
    screen::ScreenBuffer,
    state::ScreenSnapshot,
    TerminalError,
};

/// Terminal emulator
#[derive(Debug, Clone)]
pub struct Terminal {
    /// The parser for escape sequences
    parser: Parser,

    /// Primary screen buffer, owning the alternate one when present
    screen: ScreenBuffer,
}

impl Terminal {
    /// Create a terminal for the given display mode
    pub fn new(mode: DisplayMode) -> Result<Self, TerminalError> {
        Ok(Self {
            parser: Parser::new(),
            screen: ScreenBuffer::new(mode)?,
        })
    }

    /// Process a single byte
    pub fn advance(&mut self, byte: u8) -> Option<TerminalEvent> {
        self.parser.advance(&mut self.screen, byte)
    }

    /// Process input bytes, collecting any host notifications
    pub fn process(&mut self, data: &[u8]) -> Vec<TerminalEvent> {
        data.iter().filter_map(|&byte| self.advance(byte)).collect()
    }

    /// Primary screen buffer
    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    /// Mutable primary screen buffer
    pub fn screen_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.screen
    }

    /// The grid currently receiving output
    pub fn active(&self) -> &ScreenBuffer {
        self.screen.active()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Create a snapshot of the active grid
    pub fn snapshot(&self) -> ScreenSnapshot {
        self.screen.snapshot()
    }
}
