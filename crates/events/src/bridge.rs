//! Outbound bridge abstraction for decoupled notification emission.
//!
//! Provides a trait-based abstraction over the notifications the controller
//! sends to the mobile endpoint and the head unit, allowing the core logic to
//! be tested without any transport attached.

use std::sync::{Arc, Mutex};

use carlink_state::{AudioStreamingState, HmiLevel, HmiState, SystemContext, VideoStreamingState};
use serde::{Deserialize, Serialize};

/// Tells the mobile endpoint that an application's Current state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiStatusNotification {
    pub app_id: u32,
    pub level: HmiLevel,
    pub audio: AudioStreamingState,
    pub video: VideoStreamingState,
    pub context: SystemContext,
    /// Milliseconds since epoch when the change was observed.
    pub timestamp_ms: i64,
}

impl HmiStatusNotification {
    pub fn new(app_id: u32, state: &HmiState) -> Self {
        Self {
            app_id,
            level: state.level,
            audio: state.audio,
            video: state.video,
            context: state.context,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn state(&self) -> HmiState {
        HmiState::new(self.level, self.audio, self.video, self.context)
    }
}

/// Platform-wide level-change callback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiLevelChange {
    pub app_id: u32,
    pub old_level: HmiLevel,
    pub new_level: HmiLevel,
}

/// Asks the head unit to grant FULL to an application. Answered
/// asynchronously through `SystemEvent::ActivateAppResponse` with the same
/// correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateAppRequest {
    pub app_id: u32,
    pub hmi_app_id: u32,
    pub level: HmiLevel,
    pub correlation_id: u32,
}

/// Tells the head unit that a resumed audio application is taking its
/// channel back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAudioSource {
    pub app_id: u32,
    pub correlation_id: u32,
}

/// Trait for the controller's outbound side.
///
/// This abstraction decouples the core from the RPC transport, enabling:
/// - unit testing without a head unit attached
/// - headless/replay tooling
pub trait HmiBridge: Send + Sync {
    fn send_hmi_status(&self, notification: HmiStatusNotification);

    fn on_hmi_level_changed(&self, change: HmiLevelChange);

    fn send_activate_app(&self, request: ActivateAppRequest);

    fn send_resume_audio_source(&self, notice: ResumeAudioSource);
}

/// Type alias for shared bridge reference.
pub type HmiBridgeRef = Arc<dyn HmiBridge>;

/// In-memory bridge for testing.
///
/// Captures everything the controller emits for later inspection.
#[derive(Default)]
pub struct InMemoryBridge {
    statuses: Mutex<Vec<HmiStatusNotification>>,
    level_changes: Mutex<Vec<HmiLevelChange>>,
    activate_requests: Mutex<Vec<ActivateAppRequest>>,
    resume_notices: Mutex<Vec<ResumeAudioSource>>,
}

impl InMemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<HmiStatusNotification> {
        self.statuses.lock().unwrap().clone()
    }

    /// Status notifications emitted for one application, in emission order.
    pub fn statuses_for(&self, app_id: u32) -> Vec<HmiStatusNotification> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.app_id == app_id)
            .copied()
            .collect()
    }

    pub fn level_changes(&self) -> Vec<HmiLevelChange> {
        self.level_changes.lock().unwrap().clone()
    }

    pub fn activate_requests(&self) -> Vec<ActivateAppRequest> {
        self.activate_requests.lock().unwrap().clone()
    }

    pub fn resume_notices(&self) -> Vec<ResumeAudioSource> {
        self.resume_notices.lock().unwrap().clone()
    }

    /// Drop everything captured so far.
    pub fn clear(&self) {
        self.statuses.lock().unwrap().clear();
        self.level_changes.lock().unwrap().clear();
        self.activate_requests.lock().unwrap().clear();
        self.resume_notices.lock().unwrap().clear();
    }

    pub fn status_count(&self) -> usize {
        self.statuses.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.lock().unwrap().is_empty()
            && self.level_changes.lock().unwrap().is_empty()
            && self.activate_requests.lock().unwrap().is_empty()
            && self.resume_notices.lock().unwrap().is_empty()
    }
}

impl HmiBridge for InMemoryBridge {
    fn send_hmi_status(&self, notification: HmiStatusNotification) {
        self.statuses.lock().unwrap().push(notification);
    }

    fn on_hmi_level_changed(&self, change: HmiLevelChange) {
        self.level_changes.lock().unwrap().push(change);
    }

    fn send_activate_app(&self, request: ActivateAppRequest) {
        self.activate_requests.lock().unwrap().push(request);
    }

    fn send_resume_audio_source(&self, notice: ResumeAudioSource) {
        self.resume_notices.lock().unwrap().push(notice);
    }
}

/// No-op bridge that discards all notifications.
pub struct NullBridge;

impl HmiBridge for NullBridge {
    fn send_hmi_status(&self, _notification: HmiStatusNotification) {}

    fn on_hmi_level_changed(&self, _change: HmiLevelChange) {}

    fn send_activate_app(&self, _request: ActivateAppRequest) {}

    fn send_resume_audio_source(&self, _notice: ResumeAudioSource) {}
}
