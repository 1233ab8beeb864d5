//! Error types for jot-core

use thiserror::Error;

/// Result type alias using jot-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jot-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input, caught before any network call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No response received from the server
    #[error("Network error: {0}")]
    Network(String),

    /// Response received with a failure status
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// Malformed or incomplete success response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Session storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True when the error is an HTTP 401 from the server.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status: 401, .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}
