//! Error types for chromock
//!
//! The mocked namespaces never fail; only configuration handling does.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving chromock configuration.
#[derive(Debug, Error)]
pub enum ChromockError {
    /// Configuration file is missing
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for chromock operations
pub type ChromockResult<T> = Result<T, ChromockError>;
