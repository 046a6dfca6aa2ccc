//! Terminal emulation for Vterm
//!
//! Provides the byte-level escape sequence parser and the fixed-size screen
//! grid it drives. A practical VT100 subset is understood: cursor
//! positioning, erase in line/display, 8-color SGR and the alternate screen.

pub mod color;
pub mod emulator;
pub mod mode;
pub mod parser;
pub mod screen;
pub mod state;

pub use color::{PackedColor, Rgba, ANSI_PALETTE, DEFAULT_BG, DEFAULT_FG};
pub use emulator::Terminal;
pub use mode::DisplayMode;
pub use parser::{parse_args, EscapeArgs, Parser, ParserState, TerminalEvent};
pub use screen::{LineErase, ResetDirection, ScreenBuffer};
pub use state::ScreenSnapshot;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error("Display mode not implemented: {0:?}")]
    UnsupportedMode(DisplayMode),

    #[error("Unknown display mode: {0}")]
    UnknownMode(u8),

    #[error("Malformed escape sequence: {0}")]
    MalformedEscapeSequence(String),

    #[error("Snapshot encoding error: {0}")]
    Snapshot(String),
}
