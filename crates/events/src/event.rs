//! Inbound system events the state controller dispatches on.

use carlink_state::StateId;
use serde::{Deserialize, Serialize};

/// A system-wide interruption reported by the head unit through the
/// `OnEventChanged` notification.
///
/// Producers: head-unit RPC adapter
/// Consumers: state controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterruptionKind {
    PhoneCall,
    EmergencyEvent,
    AudioSource,
    EmbeddedNavi,
    DeactivateHmi,
}

impl InterruptionKind {
    /// The temporary layer this interruption pushes onto every stack.
    pub fn state_id(self) -> StateId {
        match self {
            InterruptionKind::PhoneCall => StateId::PhoneCall,
            InterruptionKind::EmergencyEvent => StateId::SafetyMode,
            InterruptionKind::AudioSource => StateId::AudioSource,
            InterruptionKind::EmbeddedNavi => StateId::EmbeddedNavi,
            InterruptionKind::DeactivateHmi => StateId::DeactivateHmi,
        }
    }
}

/// Head-unit verdict on an application activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationResult {
    Success,
    Rejected,
    Aborted,
    Disallowed,
    InvalidId,
    TimedOut,
    GenericError,
}

impl ActivationResult {
    pub fn is_success(self) -> bool {
        matches!(self, ActivationResult::Success)
    }
}

/// Everything the state controller observes from the outside world.
///
/// Producers: head-unit RPC adapter, session layer
/// Consumers: state controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemEvent {
    VrStarted,
    VrStopped,
    TtsStarted,
    TtsStopped,

    /// A named interruption toggled on or off.
    InterruptionChanged {
        kind: InterruptionKind,
        active: bool,
    },

    /// One application started projecting video.
    VideoStreamingStarted { app_id: u32 },
    VideoStreamingStopped { app_id: u32 },

    /// Asynchronous acknowledgement of an `ActivateAppRequest`.
    ActivateAppResponse {
        correlation_id: u32,
        result: ActivationResult,
    },

    /// The driver brought an application to the foreground on the head unit.
    AppActivated { hmi_app_id: u32 },

    /// The head unit took the foreground away from an application.
    AppDeactivated { hmi_app_id: u32 },
}
