//! Common error types for seqbox

use thiserror::Error;

/// Common result type for seqbox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across seqbox crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schedule source unusable
    #[error("Schedule error: {0}")]
    Schedule(#[from] crate::schedule::LoadError),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
