//! Common error types for the URY schedule backend

use thiserror::Error;

/// Common result type for schedule operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the schedule backend
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (unknown metadata key, missing show, ...)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller-supplied argument (e.g. non-positive listing quantity)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Metadata parent chain loops back on itself or exceeds the depth limit
    #[error("Metadata inheritance cycle: {0}")]
    InheritanceCycle(String),

    /// Internal error (corrupt stored values and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}
