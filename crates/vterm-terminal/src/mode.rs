//! Display modes
//!
//! Numbering follows the classic VGA BIOS modes, plus one custom mode.
//! Only 40x25 monochrome text is functional; every other mode is rejected
//! when a buffer is created.

use crate::TerminalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DisplayMode {
    #[default]
    MonochromeText40x25 = 0,
    ColorText40x25 = 1,
    MonochromeText80x25 = 2,
    ColorText80x25 = 3,
    FourColorGraphics300x200 = 4,
    MonochromeGraphics300x200 = 5,
    MonochromeGraphics640x200 = 6,
    ColorGraphics320x200 = 13,
    Color16Graphics640x200 = 14,
    MonochromeGraphics640x350 = 15,
    Color16Graphics640x350 = 16,
    MonochromeGraphics640x480 = 17,
    Color16Graphics640x480 = 18,
    Color256Graphics320x200 = 19,
    FullColorMaxRes = 20,
}

impl DisplayMode {
    /// Grid size as `(columns, rows)`
    pub fn text_dimensions(self) -> Result<(u16, u16), TerminalError> {
        match self {
            DisplayMode::MonochromeText40x25 => Ok((40, 25)),
            other => Err(TerminalError::UnsupportedMode(other)),
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            DisplayMode::MonochromeText40x25
                | DisplayMode::ColorText40x25
                | DisplayMode::MonochromeText80x25
                | DisplayMode::ColorText80x25
        )
    }

    /// Text modes are backed by an interactive shell
    pub fn requires_pty(self) -> bool {
        self.is_text()
    }
}

impl TryFrom<u8> for DisplayMode {
    type Error = TerminalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let mode = match value {
            0 => DisplayMode::MonochromeText40x25,
            1 => DisplayMode::ColorText40x25,
            2 => DisplayMode::MonochromeText80x25,
            3 => DisplayMode::ColorText80x25,
            4 => DisplayMode::FourColorGraphics300x200,
            5 => DisplayMode::MonochromeGraphics300x200,
            6 => DisplayMode::MonochromeGraphics640x200,
            13 => DisplayMode::ColorGraphics320x200,
            14 => DisplayMode::Color16Graphics640x200,
            15 => DisplayMode::MonochromeGraphics640x350,
            16 => DisplayMode::Color16Graphics640x350,
            17 => DisplayMode::MonochromeGraphics640x480,
            18 => DisplayMode::Color16Graphics640x480,
            19 => DisplayMode::Color256Graphics320x200,
            20 => DisplayMode::FullColorMaxRes,
            other => return Err(TerminalError::UnknownMode(other)),
        };
        Ok(mode)
    }
}
