//! Error types for seqbox-sp
//!
//! Module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for seqbox-sp
#[derive(Error, Debug)]
pub enum Error {
    /// Schedule source unusable (missing file or malformed row)
    #[error("Schedule error: {0}")]
    Load(#[from] seqbox_common::schedule::LoadError),

    /// Serial channel errors (open, write, closed)
    #[error("Channel error: {0}")]
    Channel(#[from] crate::channel::ChannelError),

    /// Operation not valid in the current player state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using seqbox-sp Error
pub type Result<T> = std::result::Result<T, Error>;
