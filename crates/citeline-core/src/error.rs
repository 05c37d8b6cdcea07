//! Error types for Citeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed identifier: {0:?}")]
    MalformedIdentifier(String),

    #[error("Unresolved date: {0:?}")]
    UnresolvedDate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("A resolution batch is already in flight")]
    BatchInFlight,

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
