//! Error types for the core crate.

use std::path::PathBuf;

/// Result alias used throughout batring-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// The config parsed but contains invalid values.
    /// All problems are collected so the user can fix them in one pass.
    #[error("invalid configuration:\n{}", .0.join("\n"))]
    ConfigValidation(Vec<String>),

    /// TOML syntax or type error.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Filesystem error while reading the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
