//! Serial channel boundary
//!
//! The player only sees the [`Channel`] trait; the real serial port lives in
//! [`crate::serial`]. Tests substitute a recording mock.

use thiserror::Error;

/// Baud rate of the device link. Protocol constant, not configurable.
pub const BAUD_RATE: u32 = 9600;

/// Out-of-band "disable" instruction sent to the device when a run is
/// stopped. The device firmware keys on this exact byte value.
pub const DISABLE_COMMAND: u8 = b'D';

/// Serial channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Port unavailable or busy; surfaced at start, before any run begins
    #[error("failed to open serial port {port}: {details}")]
    OpenFailed { port: String, details: String },

    /// A write to the open port failed; terminal for the run
    #[error("serial write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// The port closed underneath us; terminal for the run
    #[error("serial port is closed")]
    Closed,
}

/// Abstraction over the physical serial connection
///
/// Exclusively owned by the active run from `start` until a terminal state
/// closes it. `close` is idempotent.
pub trait Channel: Send {
    /// Write raw bytes to the device
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;

    /// Whether the underlying connection is still usable
    fn is_open(&self) -> bool;

    /// Release the connection
    fn close(&mut self);
}
