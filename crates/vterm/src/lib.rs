//! Vterm: a terminal emulator drawn inside the hosting terminal

pub mod app;
pub mod input;
pub mod render;
pub mod terminal_guard;
