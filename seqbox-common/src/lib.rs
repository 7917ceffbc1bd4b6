//! # Seqbox Common Library
//!
//! Shared code for the seqbox sequence player:
//! - Schedule model and CSV loading
//! - Event types (PlayerEvent enum) and EventBus
//! - Configuration loading
//! - Time utilities

pub mod config;
pub mod error;
pub mod events;
pub mod schedule;
pub mod time;

pub use error::{Error, Result};
pub use schedule::{LoadError, Schedule, ScheduleEntry};
