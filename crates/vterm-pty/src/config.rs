//! Session configuration

use crate::pty::{DEFAULT_SHELL, DEFAULT_TERM};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vterm_terminal::screen::DEFAULT_FONT_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a [`TerminalSession`](crate::TerminalSession)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Shell spawned for each text buffer
    pub shell: PathBuf,

    /// `TERM` given to the shell
    pub term: String,

    /// Display mode number for the first buffer
    pub mode: u8,

    /// Initial font size in pixels
    pub font_size: u16,

    /// Initial window size in pixels
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            term: DEFAULT_TERM.to_string(),
            mode: 0,
            font_size: DEFAULT_FONT_SIZE,
            pixel_width: 800,
            pixel_height: 450,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }
}
