//! Application capability flags and the derived audio exclusivity classes.

use serde::{Deserialize, Serialize};

/// Capability flags an application declares at registration.
///
/// The derived groupings matter more than the raw flags: audio applications
/// compete for the audio channel, video applications for the projection
/// surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppCapabilities {
    #[serde(default)]
    pub is_media: bool,

    #[serde(default)]
    pub is_navi: bool,

    #[serde(default)]
    pub is_projection: bool,

    #[serde(default)]
    pub is_voice_comm: bool,
}

/// Audio exclusivity class. At most one application per class may hold an
/// audible foreground state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioClass {
    Media,
    Navi,
    VoiceComm,
}

impl AppCapabilities {
    pub const MEDIA: AppCapabilities = AppCapabilities {
        is_media: true,
        is_navi: false,
        is_projection: false,
        is_voice_comm: false,
    };

    pub const NAVI: AppCapabilities = AppCapabilities {
        is_media: false,
        is_navi: true,
        is_projection: false,
        is_voice_comm: false,
    };

    pub const PROJECTION: AppCapabilities = AppCapabilities {
        is_media: false,
        is_navi: false,
        is_projection: true,
        is_voice_comm: false,
    };

    pub const VOICE_COMM: AppCapabilities = AppCapabilities {
        is_media: false,
        is_navi: false,
        is_projection: false,
        is_voice_comm: true,
    };

    /// Competes for the audio channel.
    pub fn is_audio(&self) -> bool {
        self.is_media || self.is_navi || self.is_voice_comm
    }

    /// Competes for the projection surface.
    pub fn is_video(&self) -> bool {
        self.is_navi || self.is_projection
    }

    /// The exclusivity classes this application belongs to.
    pub fn classes(&self) -> Vec<AudioClass> {
        let mut classes = Vec::with_capacity(3);
        if self.is_media {
            classes.push(AudioClass::Media);
        }
        if self.is_navi {
            classes.push(AudioClass::Navi);
        }
        if self.is_voice_comm {
            classes.push(AudioClass::VoiceComm);
        }
        classes
    }

    /// True when the two applications compete in at least one audio class.
    pub fn shares_class(&self, other: &AppCapabilities) -> bool {
        (self.is_media && other.is_media)
            || (self.is_navi && other.is_navi)
            || (self.is_voice_comm && other.is_voice_comm)
    }
}
