//! Screen buffer for terminal content
//!
//! A fixed-size grid stored as two parallel flat arrays, one byte and one
//! packed color per cell, indexed by `row * column_count + col`. A buffer
//! may own one nested alternate buffer used by full-screen programs; while
//! it exists, the alternate is the active grid.

use crate::{
    color::PackedColor,
    mode::DisplayMode,
    state::ScreenSnapshot,
    TerminalError,
};
use tracing::debug;

/// Font size given to freshly created buffers
pub const DEFAULT_FONT_SIZE: u16 = 10;

/// Region selector for [`ScreenBuffer::reset_region`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDirection {
    /// From the given cell to the end of the buffer
    Forward,
    /// From the start of the buffer up to and including the given cell
    Backward,
    /// Every row above the given row
    Up,
    /// Every row below the given row
    Down,
    /// The whole buffer
    All,
}

/// Region selector for [`ScreenBuffer::erase_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineErase {
    /// From the given column to the end of the row
    Forward,
    /// From the start of the row up to and including the given column
    Backward,
    /// The whole row
    All,
}

/// Character grid with cursor and color state
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenBuffer {
    /// Cell bytes in row-major order
    data: Vec<u8>,

    /// Cell colors, parallel to `data`
    colors: Vec<PackedColor>,

    column_count: u16,
    row_count: u16,

    cursor_row: u16,
    cursor_col: u16,

    mode: DisplayMode,
    font_size: u16,

    /// Color stamped onto newly written cells
    current_color: PackedColor,

    /// Color for cleared cells and SGR 0
    default_color: PackedColor,

    /// Alternate screen, at most one level deep
    alt_buffer: Option<Box<ScreenBuffer>>,
}

impl ScreenBuffer {
    /// Create an empty buffer for the given display mode
    pub fn new(mode: DisplayMode) -> Result<Self, TerminalError> {
        let (columns, rows) = mode.text_dimensions()?;
        Ok(Self::blank(mode, columns, rows, PackedColor::default()))
    }

    fn blank(mode: DisplayMode, column_count: u16, row_count: u16, default_color: PackedColor) -> Self {
        let size = column_count as usize * row_count as usize;
        Self {
            data: vec![0; size],
            colors: vec![default_color; size],
            column_count,
            row_count,
            cursor_row: 0,
            cursor_col: 0,
            mode,
            font_size: DEFAULT_FONT_SIZE,
            current_color: default_color,
            default_color,
            alt_buffer: None,
        }
    }

    pub fn column_count(&self) -> u16 {
        self.column_count
    }

    pub fn row_count(&self) -> u16 {
        self.row_count
    }

    /// Number of cells, `column_count * row_count`
    pub fn buffer_size(&self) -> usize {
        self.data.len()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Cursor position as `(row, col)`
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_row, self.cursor_col)
    }

    /// Move the cursor, wrapping each coordinate into the grid
    pub fn set_cursor(&mut self, row: u16, col: u16) {
        self.cursor_row = row % self.row_count;
        self.cursor_col = col % self.column_count;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn colors(&self) -> &[PackedColor] {
        &self.colors
    }

    /// Cell content at `(row, col)`
    pub fn cell(&self, row: u16, col: u16) -> Option<(u8, PackedColor)> {
        let index = self.index_of(row, col)?;
        Some((self.data[index], self.colors[index]))
    }

    /// Row content as text, NUL cells rendered as spaces
    pub fn row_text(&self, row: u16) -> Option<String> {
        if row >= self.row_count {
            return None;
        }
        let start = row as usize * self.column_count as usize;
        let end = start + self.column_count as usize;
        Some(
            self.data[start..end]
                .iter()
                .map(|&b| if b == 0 { ' ' } else { b as char })
                .collect(),
        )
    }

    fn index_of(&self, row: u16, col: u16) -> Option<usize> {
        if row >= self.row_count || col >= self.column_count {
            return None;
        }
        Some(row as usize * self.column_count as usize + col as usize)
    }

    fn cursor_index(&self) -> usize {
        self.cursor_row as usize * self.column_count as usize + self.cursor_col as usize
    }

    pub fn current_color(&self) -> PackedColor {
        self.current_color
    }

    pub fn default_color(&self) -> PackedColor {
        self.default_color
    }

    pub fn set_current_color(&mut self, color: PackedColor) {
        self.current_color = color;
    }

    /// Restore the default foreground and background
    pub fn reset_colors(&mut self) {
        self.current_color = self.default_color;
    }

    /// Write a byte at the cursor with the current color and advance.
    ///
    /// Returns `true` when the write moved the cursor onto the next row.
    pub fn write_cell(&mut self, byte: u8) -> bool {
        let index = self.cursor_index();
        self.data[index] = byte;
        self.colors[index] = self.current_color;

        self.cursor_col += 1;
        if self.cursor_col < self.column_count {
            return false;
        }

        self.cursor_col = 0;
        self.line_feed();
        true
    }

    /// Move to the next row, scrolling at the bottom
    pub fn line_feed(&mut self) {
        self.cursor_row += 1;
        if self.cursor_row >= self.row_count {
            self.scroll_up();
            self.cursor_row = self.row_count - 1;
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor_col = 0;
    }

    /// Step one column left.
    ///
    /// Stops at column 0 instead of moving past the left edge, so the
    /// cursor always addresses a cell in the grid.
    pub fn backspace(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    /// Blank the rest of the row with spaces and move down one row
    pub fn vertical_tab(&mut self) {
        let start = self.cursor_index();
        let end = (self.cursor_row as usize + 1) * self.column_count as usize;
        self.data[start..end].fill(b' ');
        self.colors[start..end].fill(self.current_color);
        self.line_feed();
    }

    /// Discard row 0 and shift every other row up by one.
    ///
    /// History is not retained; the new bottom row is cleared.
    pub fn scroll_up(&mut self) {
        let width = self.column_count as usize;
        let size = self.data.len();

        self.data.copy_within(width.., 0);
        self.colors.copy_within(width.., 0);
        self.clear_cells(size - width, size);
    }

    fn clear_cells(&mut self, start: usize, end: usize) {
        let end = end.min(self.data.len());
        if start >= end {
            return;
        }
        self.data[start..end].fill(0);
        self.colors[start..end].fill(self.default_color);
    }

    /// Clear part of the buffer relative to `(from_row, from_col)`.
    ///
    /// Out-of-range coordinates are clamped to the last row/column.
    pub fn reset_region(&mut self, from_row: u16, from_col: u16, direction: ResetDirection) {
        let row = from_row.min(self.row_count - 1) as usize;
        let col = from_col.min(self.column_count - 1) as usize;
        let width = self.column_count as usize;
        let index = row * width + col;
        let size = self.data.len();

        match direction {
            ResetDirection::Forward => self.clear_cells(index, size),
            ResetDirection::Backward => self.clear_cells(0, index + 1),
            ResetDirection::Up => self.clear_cells(0, row * width),
            ResetDirection::Down => self.clear_cells((row + 1) * width, size),
            ResetDirection::All => {
                self.reset_region(from_row, from_col, ResetDirection::Backward);
                self.reset_region(from_row, from_col, ResetDirection::Forward);
            }
        }
    }

    /// Clear part of one row relative to `(row, col)`
    pub fn erase_line(&mut self, row: u16, col: u16, direction: LineErase) {
        let row = row.min(self.row_count - 1) as usize;
        let col = col.min(self.column_count - 1) as usize;
        let width = self.column_count as usize;
        let row_start = row * width;

        match direction {
            LineErase::Forward => self.clear_cells(row_start + col, row_start + width),
            LineErase::Backward => self.clear_cells(row_start, row_start + col + 1),
            LineErase::All => self.clear_cells(row_start, row_start + width),
        }
    }

    /// Change the font size of this buffer and its alternate
    pub fn resize_for_font(&mut self, font_size: u16) {
        self.font_size = font_size.max(1);
        if let Some(alt) = self.alt_buffer.as_mut() {
            alt.font_size = self.font_size;
        }
    }

    /// Pixel size of the grid as `(width, height)`.
    ///
    /// Glyphs are assumed twice as tall as they are wide.
    pub fn pixel_size(&self) -> (u32, u32) {
        let font = self.font_size as u32;
        (
            self.column_count as u32 * font / 2,
            self.row_count as u32 * font,
        )
    }

    /// Switch to a fresh alternate grid; no-op when already switched
    pub fn enter_alternate(&mut self) {
        if self.alt_buffer.is_some() {
            return;
        }

        let mut alt = Self::blank(
            self.mode,
            self.column_count,
            self.row_count,
            self.default_color,
        );
        alt.font_size = self.font_size;
        alt.current_color = self.current_color;

        debug!("Entering alternate screen");
        self.alt_buffer = Some(Box::new(alt));
    }

    /// Drop the alternate grid and return to this one
    pub fn leave_alternate(&mut self) {
        if self.alt_buffer.take().is_some() {
            debug!("Leaving alternate screen");
        }
    }

    pub fn is_alternate_active(&self) -> bool {
        self.alt_buffer.is_some()
    }

    /// The grid currently receiving output
    pub fn active(&self) -> &ScreenBuffer {
        self.alt_buffer.as_deref().unwrap_or(self)
    }

    /// Mutable access to the grid currently receiving output
    pub fn active_mut(&mut self) -> &mut ScreenBuffer {
        match self.alt_buffer {
            Some(ref mut alt) => &mut **alt,
            None => self,
        }
    }

    /// Read-only copy of the active grid for a renderer
    pub fn snapshot(&self) -> ScreenSnapshot {
        let active = self.active();
        ScreenSnapshot {
            column_count: active.column_count,
            row_count: active.row_count,
            data: active.data.clone(),
            colors: active.colors.iter().map(|c| c.as_u64()).collect(),
            cursor_row: active.cursor_row,
            cursor_col: active.cursor_col,
            font_size: active.font_size,
            alternate: self.is_alternate_active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ANSI_PALETTE, DEFAULT_BG};

    fn buffer() -> ScreenBuffer {
        ScreenBuffer::new(DisplayMode::MonochromeText40x25).unwrap()
    }

    #[test]
    fn test_new_buffer_is_blank() {
        let buf = buffer();
        assert_eq!(buf.column_count(), 40);
        assert_eq!(buf.row_count(), 25);
        assert_eq!(buf.buffer_size(), 1000);
        assert_eq!(buf.cursor(), (0, 0));
        assert!(buf.data().iter().all(|&b| b == 0));
        assert!(buf.colors().iter().all(|&c| c == buf.default_color()));
    }

    #[test]
    fn test_unsupported_mode_is_rejected() {
        let err = ScreenBuffer::new(DisplayMode::ColorText80x25).unwrap_err();
        assert_eq!(err, TerminalError::UnsupportedMode(DisplayMode::ColorText80x25));
    }

    #[test]
    fn test_write_cell_wraps_at_row_end() {
        let mut buf = buffer();
        for _ in 0..39 {
            assert!(!buf.write_cell(b'x'));
        }
        assert!(buf.write_cell(b'y'));
        assert_eq!(buf.cursor(), (1, 0));
        assert_eq!(buf.cell(0, 39).map(|(b, _)| b), Some(b'y'));
    }

    #[test]
    fn test_scroll_up_discards_first_row() {
        let mut buf = buffer();
        buf.write_cell(b'a');
        buf.set_cursor(1, 0);
        buf.write_cell(b'b');
        buf.set_cursor(24, 0);
        buf.write_cell(b'z');

        buf.scroll_up();

        assert_eq!(buf.cell(0, 0).map(|(b, _)| b), Some(b'b'));
        assert_eq!(buf.cell(23, 0).map(|(b, _)| b), Some(b'z'));
        assert_eq!(buf.cell(24, 0), Some((0, buf.default_color())));
    }

    #[test]
    fn test_backspace_stops_at_column_zero() {
        let mut buf = buffer();
        buf.backspace();
        assert_eq!(buf.cursor(), (0, 0));

        buf.set_cursor(3, 5);
        buf.backspace();
        assert_eq!(buf.cursor(), (3, 4));
    }

    #[test]
    fn test_vertical_tab_fills_rest_of_row() {
        let mut buf = buffer();
        buf.set_cursor(2, 30);
        buf.vertical_tab();

        assert_eq!(buf.cursor(), (3, 30));
        let row = buf.row_text(2).unwrap();
        assert_eq!(&row[30..], "          ");
        assert_eq!(buf.cell(2, 29).map(|(b, _)| b), Some(0));
    }

    #[test]
    fn test_reset_region_directions() {
        let mut buf = buffer();
        buf.data.fill(b'#');

        buf.reset_region(1, 10, ResetDirection::Forward);
        assert_eq!(buf.cell(1, 9).map(|(b, _)| b), Some(b'#'));
        assert_eq!(buf.cell(1, 10).map(|(b, _)| b), Some(0));
        assert_eq!(buf.cell(24, 39).map(|(b, _)| b), Some(0));

        buf.data.fill(b'#');
        buf.reset_region(1, 10, ResetDirection::Backward);
        assert_eq!(buf.cell(0, 0).map(|(b, _)| b), Some(0));
        assert_eq!(buf.cell(1, 10).map(|(b, _)| b), Some(0));
        assert_eq!(buf.cell(1, 11).map(|(b, _)| b), Some(b'#'));

        buf.data.fill(b'#');
        buf.reset_region(2, 10, ResetDirection::Up);
        assert_eq!(buf.cell(1, 39).map(|(b, _)| b), Some(0));
        assert_eq!(buf.cell(2, 0).map(|(b, _)| b), Some(b'#'));

        buf.data.fill(b'#');
        buf.reset_region(2, 10, ResetDirection::Down);
        assert_eq!(buf.cell(2, 39).map(|(b, _)| b), Some(b'#'));
        assert_eq!(buf.cell(3, 0).map(|(b, _)| b), Some(0));

        buf.data.fill(b'#');
        buf.reset_region(12, 20, ResetDirection::All);
        assert!(buf.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_erase_line_stays_on_row() {
        let mut buf = buffer();
        buf.data.fill(b'#');

        buf.erase_line(5, 3, LineErase::Backward);
        assert_eq!(buf.row_text(5).unwrap()[..5].to_string(), "    #");
        assert_eq!(buf.cell(4, 39).map(|(b, _)| b), Some(b'#'));

        buf.erase_line(5, 20, LineErase::Forward);
        assert_eq!(buf.cell(5, 19).map(|(b, _)| b), Some(b'#'));
        assert_eq!(buf.cell(5, 20).map(|(b, _)| b), Some(0));
        assert_eq!(buf.cell(6, 0).map(|(b, _)| b), Some(b'#'));

        buf.erase_line(6, 0, LineErase::All);
        assert_eq!(buf.row_text(6).unwrap().trim(), "");
    }

    #[test]
    fn test_alternate_screen_is_isolated() {
        let mut buf = buffer();
        buf.write_cell(b'P');
        buf.enter_alternate();

        assert!(buf.is_alternate_active());
        assert_eq!(buf.active().cursor(), (0, 0));
        buf.active_mut().write_cell(b'A');
        assert_eq!(buf.cell(0, 0).map(|(b, _)| b), Some(b'P'));

        buf.leave_alternate();
        assert!(!buf.is_alternate_active());
        assert_eq!(buf.cursor(), (0, 1));
        assert_eq!(buf.active().cell(0, 0).map(|(b, _)| b), Some(b'P'));
    }

    #[test]
    fn test_alternate_is_one_level_deep() {
        let mut buf = buffer();
        buf.enter_alternate();
        buf.active_mut().write_cell(b'1');
        buf.enter_alternate();
        assert_eq!(buf.active().cell(0, 0).map(|(b, _)| b), Some(b'1'));
        assert!(!buf.active().is_alternate_active());
    }

    #[test]
    fn test_resize_for_font_updates_pixels() {
        let mut buf = buffer();
        assert_eq!(buf.pixel_size(), (200, 250));
        buf.enter_alternate();
        buf.resize_for_font(16);
        assert_eq!(buf.pixel_size(), (320, 400));
        assert_eq!(buf.active().font_size(), 16);
        buf.resize_for_font(0);
        assert_eq!(buf.font_size(), 1);
    }

    #[test]
    fn test_cleared_cells_use_default_color() {
        let mut buf = buffer();
        buf.set_current_color(buf.current_color().with_bg(ANSI_PALETTE[2]));
        buf.write_cell(b'q');
        buf.reset_region(0, 0, ResetDirection::All);
        assert_eq!(buf.cell(0, 0).map(|(_, c)| c.bg()), Some(DEFAULT_BG));
    }
}
