//! The four wire-level enums that make up an HMI state.
//!
//! Each carries an `Invalid` sentinel because malformed upstream messages can
//! reach the core; requests containing one are dropped at the controller
//! boundary, never stored.

use serde::{Deserialize, Serialize};

/// Visibility level of an application on the head unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HmiLevel {
    /// Exclusive visual foreground.
    Full,

    /// Audio-only foreground, no visual focus.
    Limited,

    /// Alive but out of focus.
    Background,

    /// Registered, no UI rights.
    #[default]
    None,

    /// Sentinel for malformed upstream data.
    Invalid,
}

impl HmiLevel {
    /// Foreground levels are the ones that can carry audio.
    pub fn is_foreground(self) -> bool {
        matches!(self, HmiLevel::Full | HmiLevel::Limited)
    }

    pub fn label(self) -> &'static str {
        match self {
            HmiLevel::Full => "FULL",
            HmiLevel::Limited => "LIMITED",
            HmiLevel::Background => "BACKGROUND",
            HmiLevel::None => "NONE",
            HmiLevel::Invalid => "INVALID",
        }
    }
}

impl std::fmt::Display for HmiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether the application's audio stream reaches the speakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioStreamingState {
    Audible,

    /// Ducked while another source temporarily shares the channel.
    Attenuated,

    #[default]
    NotAudible,

    Invalid,
}

impl AudioStreamingState {
    /// Audible or ducked - the stream still occupies the channel.
    pub fn is_audible(self) -> bool {
        matches!(
            self,
            AudioStreamingState::Audible | AudioStreamingState::Attenuated
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            AudioStreamingState::Audible => "AUDIBLE",
            AudioStreamingState::Attenuated => "ATTENUATED",
            AudioStreamingState::NotAudible => "NOT_AUDIBLE",
            AudioStreamingState::Invalid => "INVALID",
        }
    }
}

impl std::fmt::Display for AudioStreamingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether the application may project video to the head unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStreamingState {
    Streamable,

    #[default]
    NotStreamable,

    Invalid,
}

impl VideoStreamingState {
    pub fn label(self) -> &'static str {
        match self {
            VideoStreamingState::Streamable => "STREAMABLE",
            VideoStreamingState::NotStreamable => "NOT_STREAMABLE",
            VideoStreamingState::Invalid => "INVALID",
        }
    }
}

impl std::fmt::Display for VideoStreamingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What the head unit screen is currently showing around the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemContext {
    #[default]
    Main,

    /// A voice-recognition session owns the screen.
    #[serde(rename = "VRSESSION")]
    VrSession,

    Menu,

    HmiObscured,

    Alert,

    Invalid,
}

impl SystemContext {
    pub fn label(self) -> &'static str {
        match self {
            SystemContext::Main => "MAIN",
            SystemContext::VrSession => "VRSESSION",
            SystemContext::Menu => "MENU",
            SystemContext::HmiObscured => "HMI_OBSCURED",
            SystemContext::Alert => "ALERT",
            SystemContext::Invalid => "INVALID",
        }
    }
}

impl std::fmt::Display for SystemContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
