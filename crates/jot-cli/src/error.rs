//! CLI error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jot_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No API URL configured. Pass --api-url or set JOT_API_URL.")]
    MissingApiUrl,
    #[error("Not logged in. Run `jot login <username>`.")]
    NotLoggedIn,
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Could not determine a configuration directory for the session file")]
    NoConfigDir,
}
