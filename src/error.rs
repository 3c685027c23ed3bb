//! Error types for the moodloop host layer.
//!
//! The mapping and learning core never fails; these cover config files,
//! profile persistence and user input at the edges.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure while reading or writing a config/profile file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a config, profile or sample.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config parsed but holds values the engine cannot run with.
    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    /// A CLI line or command that could not be understood.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
