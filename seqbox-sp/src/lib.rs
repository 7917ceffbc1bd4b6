//! # Seqbox Sequence Player (seqbox-sp)
//!
//! Replays a time-stamped command schedule to an Arduino-class device over a
//! serial link.
//!
//! **Purpose:** Load a CSV schedule, emit each command at its scheduled
//! offset, stay responsive to pause/resume/stop, and report progress through
//! an event bus.
//!
//! **Architecture:** controlling context and timing loop run as independent
//! tokio tasks, communicating through a control watch channel and the shared
//! event bus from `seqbox-common`.

pub mod channel;
pub mod error;
pub mod player;
pub mod serial;

pub use channel::{Channel, ChannelError, BAUD_RATE, DISABLE_COMMAND};
pub use error::{Error, Result};
pub use player::{PlayerState, SequencePlayer};
