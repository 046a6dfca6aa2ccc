//! Draws screen snapshots into the hosting terminal

use crossterm::{
    cursor, queue,
    style::{self, Color},
    terminal::{self, ClearType},
};
use std::io::{self, Write};
use vterm_terminal::{Rgba, ScreenSnapshot};

fn to_color(rgba: Rgba) -> Color {
    Color::Rgb {
        r: rgba.r,
        g: rgba.g,
        b: rgba.b,
    }
}

/// Paints the active grid cell by cell with true-color attributes
pub struct Renderer<W: Write> {
    out: W,

    /// Last frame drawn, to skip identical redraws
    last: Option<ScreenSnapshot>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Force the next [`Renderer::draw`] to repaint everything
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Draw `snapshot` unless it matches the previous frame.
    ///
    /// NUL cells render as blanks in their background color.
    pub fn draw(&mut self, snapshot: &ScreenSnapshot) -> io::Result<()> {
        if self.last.as_ref() == Some(snapshot) {
            return Ok(());
        }

        queue!(self.out, cursor::Hide)?;
        if self.last.as_ref().map(|s| (s.column_count, s.row_count))
            != Some((snapshot.column_count, snapshot.row_count))
        {
            queue!(self.out, terminal::Clear(ClearType::All))?;
        }

        let mut current = None;
        for row in 0..snapshot.row_count {
            queue!(self.out, cursor::MoveTo(0, row))?;
            for col in 0..snapshot.column_count {
                let Some((byte, color)) = snapshot.cell(row, col) else {
                    continue;
                };

                if current != Some(color) {
                    queue!(
                        self.out,
                        style::SetForegroundColor(to_color(color.fg())),
                        style::SetBackgroundColor(to_color(color.bg())),
                    )?;
                    current = Some(color);
                }

                let glyph = match byte {
                    0x20..=0x7e => byte as char,
                    _ => ' ',
                };
                queue!(self.out, style::Print(glyph))?;
            }
        }

        queue!(
            self.out,
            style::ResetColor,
            cursor::MoveTo(snapshot.cursor_col, snapshot.cursor_row),
            cursor::Show,
        )?;
        self.out.flush()?;

        self.last = Some(snapshot.clone());
        Ok(())
    }

    /// Ring the hosting terminal's bell
    pub fn bell(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }

    /// Put session details in the window title
    pub fn set_title(&mut self, title: &str) -> io::Result<()> {
        queue!(self.out, terminal::SetTitle(title))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
