//! Singleton services backing the indicator window.

pub mod battery;
pub mod callbacks;
pub mod config_manager;
pub mod glyph;
