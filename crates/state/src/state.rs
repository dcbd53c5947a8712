//! The composed HMI state value and its validity rules.

use serde::{Deserialize, Serialize};

use crate::capabilities::AppCapabilities;
use crate::level::{AudioStreamingState, HmiLevel, SystemContext, VideoStreamingState};

/// An application's observable role on the head unit: visibility level,
/// audio channel, video projection and the surrounding screen context.
///
/// Plain value semantics; equality covers all four fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HmiState {
    pub level: HmiLevel,
    pub audio: AudioStreamingState,
    pub video: VideoStreamingState,
    pub context: SystemContext,
}

impl HmiState {
    pub fn new(
        level: HmiLevel,
        audio: AudioStreamingState,
        video: VideoStreamingState,
        context: SystemContext,
    ) -> Self {
        Self {
            level,
            audio,
            video,
            context,
        }
    }

    /// NONE / NOT_AUDIBLE / NOT_STREAMABLE / MAIN.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn background() -> Self {
        Self::new(
            HmiLevel::Background,
            AudioStreamingState::NotAudible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }

    pub fn full() -> Self {
        Self::new(
            HmiLevel::Full,
            AudioStreamingState::NotAudible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }

    pub fn full_audible() -> Self {
        Self::new(
            HmiLevel::Full,
            AudioStreamingState::Audible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }

    pub fn limited_audible() -> Self {
        Self::new(
            HmiLevel::Limited,
            AudioStreamingState::Audible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }

    pub fn with_level(mut self, level: HmiLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_audio(mut self, audio: AudioStreamingState) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_video(mut self, video: VideoStreamingState) -> Self {
        self.video = video;
        self
    }

    pub fn with_context(mut self, context: SystemContext) -> Self {
        self.context = context;
        self
    }

    /// No field carries the `Invalid` sentinel.
    pub fn is_valid(&self) -> bool {
        self.level != HmiLevel::Invalid
            && self.audio != AudioStreamingState::Invalid
            && self.video != VideoStreamingState::Invalid
            && self.context != SystemContext::Invalid
    }

    /// Whether this state is admissible for an application with the given
    /// capabilities:
    ///
    /// - no `Invalid` field,
    /// - non-audio applications are never audible and never LIMITED,
    /// - non-video applications are never streamable,
    /// - audible audio only at FULL or LIMITED.
    pub fn is_allowed_for(&self, caps: &AppCapabilities) -> bool {
        if !self.is_valid() {
            return false;
        }
        if !caps.is_audio()
            && (self.audio != AudioStreamingState::NotAudible || self.level == HmiLevel::Limited)
        {
            return false;
        }
        if !caps.is_video() && self.video != VideoStreamingState::NotStreamable {
            return false;
        }
        if self.audio.is_audible() && !self.level.is_foreground() {
            return false;
        }
        true
    }
}

impl std::fmt::Display for HmiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.level, self.audio, self.video, self.context
        )
    }
}
