//! HMI state domain types for the CarLink head-unit core.
//!
//! Pure domain logic - no I/O, no platform dependencies. Everything the rest
//! of the workspace knows about an application's visible and audible role is
//! expressed through the types in this crate.

mod capabilities;
mod compose;
mod level;
mod state;

pub use capabilities::{AppCapabilities, AudioClass};
pub use compose::{apply_interruption, compose, ComposeEnv, StateId, TEMPORARY_ORDER};
pub use level::{AudioStreamingState, HmiLevel, SystemContext, VideoStreamingState};
pub use state::HmiState;
