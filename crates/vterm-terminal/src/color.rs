//! Cell color representation
//!
//! Every cell carries one 64-bit value holding both of its colors:
//! `(foreground << 32) | background`, where each half is an RGBA color
//! packed by [`Rgba::to_u32`]. The packing is explicit and never depends
//! on the memory layout of [`Rgba`].

/// 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    /// Pack as `0xRRGGBBAA`
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | self.a as u32
    }

    /// Inverse of [`Rgba::to_u32`]
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: (value >> 24) as u8,
            g: (value >> 16) as u8,
            b: (value >> 8) as u8,
            a: value as u8,
        }
    }
}

/// Default foreground, a near-white
pub const DEFAULT_FG: Rgba = Rgba::rgb(245, 245, 245);

/// Default background, a dark gray
pub const DEFAULT_BG: Rgba = Rgba::rgb(80, 80, 80);

/// The 8-entry ANSI palette addressed by SGR 30-37 / 40-47 (VGA values)
pub const ANSI_PALETTE: [Rgba; 8] = [
    Rgba::rgb(0, 0, 0),       // black
    Rgba::rgb(170, 0, 0),     // red
    Rgba::rgb(0, 170, 0),     // green
    Rgba::rgb(170, 85, 0),    // yellow (brown on VGA)
    Rgba::rgb(0, 0, 170),     // blue
    Rgba::rgb(170, 0, 170),   // magenta
    Rgba::rgb(0, 170, 170),   // cyan
    Rgba::rgb(170, 170, 170), // white
];

/// Foreground and background packed into one cell-sized value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PackedColor(u64);

impl PackedColor {
    pub const fn pack(fg: Rgba, bg: Rgba) -> Self {
        Self(((fg.to_u32() as u64) << 32) | bg.to_u32() as u64)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn fg(self) -> Rgba {
        Rgba::from_u32((self.0 >> 32) as u32)
    }

    pub const fn bg(self) -> Rgba {
        Rgba::from_u32(self.0 as u32)
    }

    /// Replace the foreground half, leaving the background untouched
    pub const fn with_fg(self, fg: Rgba) -> Self {
        Self::pack(fg, self.bg())
    }

    /// Replace the background half, leaving the foreground untouched
    pub const fn with_bg(self, bg: Rgba) -> Self {
        Self::pack(self.fg(), bg)
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::pack(DEFAULT_FG, DEFAULT_BG)
    }
}

impl From<PackedColor> for u64 {
    fn from(color: PackedColor) -> Self {
        color.0
    }
}
