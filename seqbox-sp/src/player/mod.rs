//! Sequence player: state machine and timed-emission loop
//!
//! - `state.rs`: `PlayerState` and the shared state handle
//! - `engine.rs`: `SequencePlayer` control surface and the run task

mod engine;
mod state;

pub use engine::SequencePlayer;
pub use state::{PlayerState, SharedPlayerState};
