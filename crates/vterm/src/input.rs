//! Keyboard mapping from the hosting terminal to session actions

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use vterm_pty::{InputEvent, Key, MAX_BUFFER_COUNT};

/// Font size step for one zoom keypress
pub const FONT_STEP: i32 = 1;

/// What a single key press asks the host loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forward to the active shell
    Input(InputEvent),
    /// Grow or shrink the font
    Font(i32),
    /// Switch to a buffer slot, creating it if empty
    Switch(usize),
}

/// Map a key event; `None` for keys the terminal does not forward
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let zoom = key.modifiers.contains(KeyModifiers::SHIFT)
        && key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);

    match key.code {
        KeyCode::Char('=' | '+') if zoom => Some(Action::Font(FONT_STEP)),
        KeyCode::Char('-' | '_') if zoom => Some(Action::Font(-FONT_STEP)),
        KeyCode::F(n) if (n as usize) <= MAX_BUFFER_COUNT && n > 0 => {
            Some(Action::Switch(n as usize - 1))
        }
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            control_char(c).map(|c| Action::Input(InputEvent::Char(c)))
        }
        KeyCode::Char(c) => Some(Action::Input(InputEvent::Char(c))),
        KeyCode::Enter => Some(Action::Input(InputEvent::Key(Key::Enter))),
        KeyCode::Backspace => Some(Action::Input(InputEvent::Key(Key::Backspace))),
        KeyCode::Tab => Some(Action::Input(InputEvent::Char('\t'))),
        KeyCode::Esc => Some(Action::Input(InputEvent::Char('\x1b'))),
        _ => None,
    }
}

fn control_char(c: char) -> Option<char> {
    let byte = match c {
        'a'..='z' => c as u8 - b'a' + 1,
        'A'..='Z' => c.to_ascii_lowercase() as u8 - b'a' + 1,
        '[' => 0x1b,
        '\\' => 0x1c,
        ']' => 0x1d,
        '^' => 0x1e,
        '_' => 0x1f,
        _ => return None,
    };
    Some(byte as char)
}
