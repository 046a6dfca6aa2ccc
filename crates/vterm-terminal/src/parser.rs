//! Terminal escape sequence parser
//!
//! A three-state byte classifier. Plain bytes are applied to the active
//! screen buffer as they arrive; `ESC [` opens a control sequence that is
//! accumulated (at most [`MAX_ESCAPE_LEN`] bytes) until an alphabetic final
//! byte dispatches it. Parser state lives here rather than in the buffer
//! so a sequence split across reads resumes where it left off.

use crate::{
    color::ANSI_PALETTE,
    screen::{LineErase, ResetDirection, ScreenBuffer},
    TerminalError,
};
use tracing::{debug, trace};

/// Longest control sequence body kept before it is discarded
pub const MAX_ESCAPE_LEN: usize = 32;

/// Most arguments decoded from one control sequence
pub const MAX_ARGS: usize = 32;

const ESC: u8 = 0x1b;
const BELL: u8 = 0x07;
const BACKSPACE: u8 = 0x08;
const VERTICAL_TAB: u8 = 0x0b;
const TAB_WIDTH: usize = 4;

/// Notifications the host should act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    /// `\a` was received
    Bell,
}

/// Byte classification state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Normal,
    /// Saw `ESC`
    EscapeSeen,
    /// Saw `ESC [`, accumulating
    InCsi,
}

/// Line-feed suppression after an automatic wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum WrapState {
    #[default]
    Clear,
    /// The last byte wrapped the cursor onto a new row
    Wrapped,
    /// A carriage return followed the wrap
    WrappedThenCr,
}

/// Parser for terminal escape sequences
#[derive(Debug, Clone, Default)]
pub struct Parser {
    state: ParserState,
    accumulator: Vec<u8>,
    wrap: WrapState,
}

impl Parser {
    /// Create a new parser
    pub fn new() -> Self {
        Self {
            state: ParserState::Normal,
            accumulator: Vec::with_capacity(MAX_ESCAPE_LEN),
            wrap: WrapState::Clear,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Bytes of the control sequence accumulated so far
    pub fn pending(&self) -> &[u8] {
        &self.accumulator
    }

    /// Whether the previous printable byte wrapped and no line feed has
    /// consumed the wrap yet
    pub fn wrap_pending(&self) -> bool {
        self.wrap != WrapState::Clear
    }

    /// Process a single byte.
    ///
    /// `screen` is the primary buffer; output goes to whichever grid is
    /// active, and alternate-screen switches are applied to the primary.
    pub fn advance(&mut self, screen: &mut ScreenBuffer, byte: u8) -> Option<TerminalEvent> {
        match self.state {
            ParserState::Normal => self.normal(screen, byte),
            ParserState::EscapeSeen => {
                if byte == b'[' {
                    self.accumulator.clear();
                    self.state = ParserState::InCsi;
                    return None;
                }
                // Not a CSI: the ESC and this byte are ordinary output.
                self.state = ParserState::Normal;
                self.print(screen.active_mut(), ESC);
                self.normal(screen, byte)
            }
            ParserState::InCsi => {
                self.accumulator.push(byte);
                if byte.is_ascii_alphabetic() {
                    self.state = ParserState::Normal;
                    let body = &self.accumulator[..self.accumulator.len() - 1];
                    if let Err(e) = dispatch(screen, body, byte) {
                        debug!("Discarding escape sequence: {}", e);
                    }
                } else if self.accumulator.len() >= MAX_ESCAPE_LEN {
                    let e = TerminalError::MalformedEscapeSequence(format!(
                        "no final byte within {MAX_ESCAPE_LEN} bytes"
                    ));
                    debug!("Discarding escape sequence: {}", e);
                    self.accumulator.clear();
                    self.state = ParserState::Normal;
                }
                None
            }
        }
    }

    fn normal(&mut self, screen: &mut ScreenBuffer, byte: u8) -> Option<TerminalEvent> {
        let active = screen.active_mut();

        match byte {
            ESC => {
                self.wrap = WrapState::Clear;
                self.state = ParserState::EscapeSeen;
            }

            // Carriage return. Right after a wrap the cursor already sits
            // at column 0.
            b'\r' => match self.wrap {
                WrapState::Clear => active.carriage_return(),
                WrapState::Wrapped | WrapState::WrappedThenCr => {
                    self.wrap = WrapState::WrappedThenCr;
                }
            },

            // Line feed. The wrap already advanced the row.
            b'\n' => {
                if self.wrap == WrapState::Clear {
                    active.line_feed();
                } else {
                    trace!("Line feed absorbed by preceding wrap");
                    self.wrap = WrapState::Clear;
                }
            }

            BACKSPACE => {
                self.wrap = WrapState::Clear;
                active.backspace();
            }

            b'\t' => {
                self.wrap = WrapState::Clear;
                for _ in 0..TAB_WIDTH {
                    self.print(active, b' ');
                }
            }

            VERTICAL_TAB => {
                self.wrap = WrapState::Clear;
                active.vertical_tab();
            }

            BELL => {
                self.wrap = WrapState::Clear;
                return Some(TerminalEvent::Bell);
            }

            _ => self.print(active, byte),
        }

        None
    }

    fn print(&mut self, active: &mut ScreenBuffer, byte: u8) {
        self.wrap = if active.write_cell(byte) {
            WrapState::Wrapped
        } else {
            WrapState::Clear
        };
    }
}

/// Decoded control sequence parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscapeArgs {
    /// The sequence began with the `?` private marker
    pub private: bool,

    /// Numeric arguments; an empty field decodes as 0
    pub values: Vec<u32>,
}

impl EscapeArgs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument `index`, or 0 when absent
    pub fn get(&self, index: usize) -> u32 {
        self.values.get(index).copied().unwrap_or(0)
    }
}

/// Split a control sequence body (without its final byte) into arguments.
///
/// `ESC [ 5 ; 3 H` has the body `5;3`. An empty body has no arguments.
pub fn parse_args(body: &[u8]) -> Result<EscapeArgs, TerminalError> {
    let (private, body) = match body.split_first() {
        Some((b'?', rest)) => (true, rest),
        _ => (false, body),
    };

    if body.is_empty() {
        return Ok(EscapeArgs {
            private,
            values: Vec::new(),
        });
    }

    let mut values = Vec::new();
    for field in body.split(|&b| b == b';') {
        if values.len() == MAX_ARGS {
            return Err(TerminalError::MalformedEscapeSequence(format!(
                "more than {MAX_ARGS} arguments"
            )));
        }
        values.push(parse_number(field)?);
    }

    Ok(EscapeArgs { private, values })
}

fn parse_number(field: &[u8]) -> Result<u32, TerminalError> {
    field.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return Err(TerminalError::MalformedEscapeSequence(format!(
                "non-numeric argument byte {b:#04x}"
            )));
        }
        Ok(acc.saturating_mul(10).saturating_add((b - b'0') as u32))
    })
}

/// Apply a complete control sequence
fn dispatch(screen: &mut ScreenBuffer, body: &[u8], command: u8) -> Result<(), TerminalError> {
    let args = parse_args(body)?;
    trace!(command = %(command as char), ?args, "CSI dispatch");

    match command {
        // Cursor position, 1-indexed on the wire
        b'H' => {
            let active = screen.active_mut();
            let (rows, cols) = (active.row_count(), active.column_count());
            let (row, col) = match args.len() {
                0 => (0, 0),
                1 => (wire_coordinate(args.get(0), rows), 0),
                _ => (
                    wire_coordinate(args.get(0), rows),
                    wire_coordinate(args.get(1), cols),
                ),
            };
            active.set_cursor(row, col);
        }

        // Erase in display
        b'J' => {
            let active = screen.active_mut();
            let (row, col) = active.cursor();
            match args.get(0) {
                0 => active.reset_region(row, col, ResetDirection::Forward),
                1 => active.reset_region(row, col, ResetDirection::Backward),
                2 => active.reset_region(row, col, ResetDirection::All),
                _ => {}
            }
        }

        // Erase in line
        b'K' => {
            let active = screen.active_mut();
            let (row, col) = active.cursor();
            match args.get(0) {
                0 => active.erase_line(row, col, LineErase::Forward),
                1 => active.erase_line(row, col, LineErase::Backward),
                2 => active.erase_line(row, col, LineErase::All),
                _ => {}
            }
        }

        // DEC private mode set/reset; only the alternate screen is honored
        b'h' | b'l' => {
            if args.private && args.values.iter().any(|&m| m == 1047 || m == 1049) {
                if command == b'h' {
                    screen.enter_alternate();
                } else {
                    screen.leave_alternate();
                }
            }
        }

        // SGR (Select Graphic Rendition)
        b'm' => {
            let active = screen.active_mut();
            if args.is_empty() {
                active.reset_colors();
            }
            for &code in &args.values {
                handle_sgr(active, code);
            }
        }

        other => {
            return Err(TerminalError::MalformedEscapeSequence(format!(
                "unsupported final byte {:?}",
                other as char
            )));
        }
    }

    Ok(())
}

/// Convert a 1-indexed wire coordinate to a 0-indexed one wrapped into
/// `extent`. The wrap happens before narrowing so large arguments keep
/// their remainder.
fn wire_coordinate(value: u32, extent: u16) -> u16 {
    (value.saturating_sub(1) % u32::from(extent.max(1))) as u16
}

/// Handle SGR (Select Graphic Rendition) codes
fn handle_sgr(screen: &mut ScreenBuffer, code: u32) {
    let color = screen.current_color();
    match code {
        0 => screen.reset_colors(),
        30..=37 => screen.set_current_color(color.with_fg(ANSI_PALETTE[(code - 30) as usize])),
        40..=47 => screen.set_current_color(color.with_bg(ANSI_PALETTE[(code - 40) as usize])),
        _ => {}
    }
}
