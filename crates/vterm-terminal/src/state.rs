//! Screen state handed to a renderer

use crate::{color::PackedColor, TerminalError};
use rkyv::{AlignedVec, Archive, Deserialize, Serialize};

/// Read-only copy of the active grid
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct ScreenSnapshot {
    /// Grid dimensions
    pub column_count: u16,
    pub row_count: u16,

    /// Cell bytes (flattened 2D array)
    pub data: Vec<u8>,

    /// Packed `(fg << 32) | bg` colors, parallel to `data`
    pub colors: Vec<u64>,

    /// Cursor position
    pub cursor_row: u16,
    pub cursor_col: u16,

    pub font_size: u16,

    /// Whether the snapshot was taken from the alternate screen
    pub alternate: bool,
}

impl ScreenSnapshot {
    /// Cell at `(row, col)`
    pub fn cell(&self, row: u16, col: u16) -> Option<(u8, PackedColor)> {
        if row >= self.row_count || col >= self.column_count {
            return None;
        }
        let index = row as usize * self.column_count as usize + col as usize;
        Some((self.data[index], PackedColor::from_u64(self.colors[index])))
    }

    /// Iterate rows as byte slices
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks(self.column_count.max(1) as usize)
    }

    /// Serialize state to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, TerminalError> {
        rkyv::to_bytes::<_, 1024>(self)
            .map(|b| b.to_vec())
            .map_err(|e| TerminalError::Snapshot(e.to_string()))
    }

    /// Deserialize state from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TerminalError> {
        // Archived data must be aligned; a plain Vec<u8> gives no guarantee.
        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let archived = rkyv::check_archived_root::<Self>(&aligned)
            .map_err(|e| TerminalError::Snapshot(e.to_string()))?;

        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|e| TerminalError::Snapshot(e.to_string()))
    }
}
