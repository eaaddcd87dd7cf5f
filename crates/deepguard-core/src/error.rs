//! Error types for the DeepGuard simulation.
//!
//! Simulated pipeline operations never fail; invalid input is a silent
//! no-op. This type only covers the real edges: configuration, report
//! export, and snapshot serialization.

use thiserror::Error;

/// Result type alias using DeepGuard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for DeepGuard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
