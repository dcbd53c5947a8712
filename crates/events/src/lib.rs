//! Shared event contracts between the state controller and its collaborators.
//!
//! This crate defines the formal contracts (DTOs) for everything that crosses
//! the core's boundary: the system events it consumes and the notifications
//! it emits. Using shared types here keeps the transport adapters and the
//! core from drifting apart.
//!
//! Also provides the `HmiBridge` trait for decoupled notification emission.

mod bridge;
mod event;

pub use bridge::{
    ActivateAppRequest, HmiBridge, HmiBridgeRef, HmiLevelChange, HmiStatusNotification,
    InMemoryBridge, NullBridge, ResumeAudioSource,
};
pub use event::{ActivationResult, InterruptionKind, SystemEvent};
