//! Common error types for the lingua backend

use thiserror::Error;

/// Common result type for lingua operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the lingua workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to access the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Upstream service failure (LLM, speech)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
