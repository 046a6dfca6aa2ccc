//! Terminal session management
//!
//! A session holds up to [`MAX_BUFFER_COUNT`] screen buffers, each with
//! its own parser state and (for text modes) its own shell. Only the
//! active buffer is read from, written to, and rendered. The host calls
//! [`TerminalSession::send_input`] and then [`TerminalSession::update`]
//! once per frame before drawing; neither call blocks.

use crate::{config::SessionConfig, pty::PtySession, PtyError, SessionError};
use std::path::Path;
use tracing::{debug, warn};
use vterm_terminal::{DisplayMode, ScreenBuffer, ScreenSnapshot, Terminal, TerminalEvent};

/// Number of buffer slots in a session
pub const MAX_BUFFER_COUNT: usize = 16;

const BACKSPACE_BYTE: u8 = 0x08;
const ENTER_BYTE: u8 = b'\n';

/// Window-system capability queried before any buffer is created
pub trait HostSurface {
    /// Whether a drawable window exists
    fn is_ready(&self) -> bool;
}

/// Special keys forwarded to the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Enter,
}

impl Key {
    /// The single byte each key sends
    pub fn byte(self) -> u8 {
        match self {
            Key::Backspace => BACKSPACE_BYTE,
            Key::Enter => ENTER_BYTE,
        }
    }
}

/// Keyboard input collected by the host for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A typed character, sent UTF-8 encoded
    Char(char),
    Key(Key),
}

/// Result of one [`TerminalSession::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing was pending
    Idle,
    /// One byte was applied to the active buffer
    Consumed,
    /// One byte was consumed and the host should react
    Event(TerminalEvent),
}

/// One multiplexed virtual terminal
#[derive(Debug)]
struct BufferSlot {
    terminal: Terminal,

    /// Shell backing this buffer, shared by its primary and alternate grids
    pty: Option<PtySession>,
}

/// A set of virtual terminals and the one currently shown
#[derive(Debug)]
pub struct TerminalSession {
    slots: [Option<BufferSlot>; MAX_BUFFER_COUNT],
    active: usize,
    pixel_width: u32,
    pixel_height: u32,
    config: SessionConfig,
}

impl TerminalSession {
    /// Create a session whose slot 0 runs the configured shell.
    ///
    /// Fails with [`SessionError::SurfaceNotReady`] before the host has a
    /// window to draw into.
    pub fn init(surface: &impl HostSurface, config: SessionConfig) -> Result<Self, SessionError> {
        if !surface.is_ready() {
            return Err(SessionError::SurfaceNotReady);
        }

        let mode = DisplayMode::try_from(config.mode)?;
        let mut session = Self {
            slots: std::array::from_fn(|_| None),
            active: 0,
            pixel_width: config.pixel_width,
            pixel_height: config.pixel_height,
            config,
        };

        session.init_buffer(0, mode)?;
        session.active = 0;
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a buffer in `slot`, replacing (and closing) any occupant.
    ///
    /// On failure the slot keeps its previous buffer.
    pub fn init_buffer(&mut self, slot: usize, mode: DisplayMode) -> Result<(), SessionError> {
        check_slot(slot)?;

        let mut terminal = Terminal::new(mode)?;
        terminal.screen_mut().resize_for_font(self.config.font_size);

        let pty = if mode.requires_pty() {
            let screen = terminal.screen();
            Some(open_shell(
                &self.config.shell,
                &self.config.term,
                screen.row_count(),
                screen.column_count(),
            )?)
        } else {
            None
        };

        if self.slots[slot].replace(BufferSlot { terminal, pty }).is_some() {
            debug!("Replaced buffer in slot {}", slot);
        }
        debug!("Initialized buffer {} in {:?}", slot, mode);
        Ok(())
    }

    /// Close the buffer in `slot`, hanging up its shell
    pub fn close_buffer(&mut self, slot: usize) -> Result<(), SessionError> {
        check_slot(slot)?;
        match self.slots[slot].take() {
            Some(_) => {
                debug!("Closed buffer {}", slot);
                Ok(())
            }
            None => Err(SessionError::EmptySlot(slot)),
        }
    }

    /// Make `slot` the active buffer
    pub fn select_buffer(&mut self, slot: usize) -> Result<(), SessionError> {
        check_slot(slot)?;
        if self.slots[slot].is_none() {
            return Err(SessionError::EmptySlot(slot));
        }
        self.active = slot;
        Ok(())
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Occupied slot numbers
    pub fn buffer_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
    }

    /// Terminal in the active slot
    pub fn active_terminal(&self) -> Option<&Terminal> {
        self.slots[self.active].as_ref().map(|slot| &slot.terminal)
    }

    /// Grid the renderer should draw: the active slot's alternate screen
    /// when one is open, its primary otherwise
    pub fn active_buffer(&self) -> Option<&ScreenBuffer> {
        self.active_terminal().map(Terminal::active)
    }

    /// Renderer hand-off copy of the active grid
    pub fn snapshot(&self) -> Option<ScreenSnapshot> {
        self.active_terminal().map(Terminal::snapshot)
    }

    /// Shell behind the active slot
    pub fn active_pty(&self) -> Option<&PtySession> {
        self.slots[self.active].as_ref().and_then(|slot| slot.pty.as_ref())
    }

    fn active_slot_mut(&mut self) -> Result<&mut BufferSlot, SessionError> {
        self.slots[self.active]
            .as_mut()
            .ok_or(SessionError::EmptySlot(self.active))
    }

    /// Move at most one byte from the active shell through the parser.
    ///
    /// An exited shell surfaces as [`PtyError::ChildClosed`]; the host
    /// decides whether to close or reinitialize the buffer.
    pub fn update(&mut self) -> Result<UpdateOutcome, SessionError> {
        let index = self.active;
        let slot = self.active_slot_mut()?;
        let Some(pty) = slot.pty.as_mut() else {
            return Ok(UpdateOutcome::Idle);
        };

        let byte = match pty.try_read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return Ok(UpdateOutcome::Idle),
            Err(e) => {
                if matches!(e, PtyError::ChildClosed) {
                    warn!("Shell for buffer {} exited", index);
                }
                return Err(e.into());
            }
        };

        Ok(match slot.terminal.advance(byte) {
            Some(event) => UpdateOutcome::Event(event),
            None => UpdateOutcome::Consumed,
        })
    }

    /// Forward this frame's keyboard input to the active shell
    pub fn send_input<I>(&mut self, events: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let slot = self.active_slot_mut()?;
        let Some(pty) = slot.pty.as_mut() else {
            return Ok(());
        };

        let mut buf = [0u8; 4];
        for event in events {
            let bytes: &[u8] = match event {
                InputEvent::Char(c) => c.encode_utf8(&mut buf).as_bytes(),
                InputEvent::Key(key) => {
                    buf[0] = key.byte();
                    &buf[..1]
                }
            };
            pty.write_bytes(bytes)?;
        }
        Ok(())
    }

    /// Grow or shrink the active buffer's font and recompute the window
    /// size from the grid
    pub fn resize_font(&mut self, delta: i32) -> Result<(), SessionError> {
        let slot = self.active_slot_mut()?;
        let screen = slot.terminal.screen_mut();

        let font_size = (screen.font_size() as i32 + delta).clamp(1, u16::MAX as i32) as u16;
        screen.resize_for_font(font_size);
        let (width, height) = screen.pixel_size();

        debug!("Font size {} gives {}x{} pixels", font_size, width, height);
        self.pixel_width = width;
        self.pixel_height = height;
        Ok(())
    }

    /// Window size in pixels as `(width, height)`
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }
}

fn check_slot(slot: usize) -> Result<(), SessionError> {
    if slot >= MAX_BUFFER_COUNT {
        return Err(SessionError::InvalidSlot(slot));
    }
    Ok(())
}

fn open_shell(shell: &Path, term: &str, rows: u16, cols: u16) -> Result<PtySession, PtyError> {
    let mut pty = PtySession::open()?;
    pty.set_term(term);
    pty.set_window_size(rows, cols)?;
    pty.spawn(shell)?;
    Ok(pty)
}
