//! Layer identities, interruption projections and the composition fold.
//!
//! A layer is just a `StateId`; what it does to the state below is a pure
//! projection function, and the observable Current state is a left-fold of
//! the active projections over the Regular base in a fixed canonical order,
//! so composition does not depend on event arrival order.

use serde::{Deserialize, Serialize};

use crate::capabilities::AppCapabilities;
use crate::level::{AudioStreamingState, HmiLevel, SystemContext, VideoStreamingState};
use crate::state::HmiState;

/// Identity of a state layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateId {
    Regular,
    Current,
    Postponed,
    VrSession,
    TtsSession,
    PhoneCall,
    SafetyMode,
    VideoStreaming,
    NaviStreaming,
    AudioSource,
    EmbeddedNavi,
    DeactivateHmi,
}

/// Canonical composition order, bottom to top. The fold always applies active
/// layers in this order regardless of when they were pushed.
pub const TEMPORARY_ORDER: [StateId; 9] = [
    StateId::PhoneCall,
    StateId::SafetyMode,
    StateId::VrSession,
    StateId::TtsSession,
    StateId::AudioSource,
    StateId::EmbeddedNavi,
    StateId::NaviStreaming,
    StateId::VideoStreaming,
    StateId::DeactivateHmi,
];

impl StateId {
    /// Layer kinds that can sit above Regular in a stack.
    pub fn is_temporary(self) -> bool {
        TEMPORARY_ORDER.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            StateId::Regular => "REGULAR",
            StateId::Current => "CURRENT",
            StateId::Postponed => "POSTPONED",
            StateId::VrSession => "VR_SESSION",
            StateId::TtsSession => "TTS_SESSION",
            StateId::PhoneCall => "PHONE_CALL",
            StateId::SafetyMode => "SAFETY_MODE",
            StateId::VideoStreaming => "VIDEO_STREAMING",
            StateId::NaviStreaming => "NAVI_STREAMING",
            StateId::AudioSource => "AUDIO_SOURCE",
            StateId::EmbeddedNavi => "EMBEDDED_NAVI",
            StateId::DeactivateHmi => "DEACTIVATE_HMI",
        }
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Head-unit facts the projections depend on. Passed explicitly so nothing
/// here reads global configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeEnv {
    /// The head unit can duck mobile audio instead of muting it.
    pub attenuation_supported: bool,
}

/// Apply one interruption layer on top of the state composed below it.
pub fn apply_interruption(
    id: StateId,
    below: &HmiState,
    caps: &AppCapabilities,
    env: &ComposeEnv,
) -> HmiState {
    let mut next = *below;
    match id {
        StateId::VrSession => {
            next.audio = AudioStreamingState::NotAudible;
            next.context = SystemContext::VrSession;
        }
        StateId::TtsSession => {
            next.audio = if env.attenuation_supported {
                ducked_audio(below, caps)
            } else {
                AudioStreamingState::NotAudible
            };
        }
        StateId::SafetyMode | StateId::AudioSource => {
            next.audio = AudioStreamingState::NotAudible;
        }
        StateId::PhoneCall => {
            // Navi guidance survives a call at LIMITED; plain media loses the
            // foreground entirely. Anything else keeps its state.
            if caps.is_navi {
                if below.level.is_foreground() {
                    next.level = HmiLevel::Limited;
                }
                next.audio = AudioStreamingState::NotAudible;
            } else if caps.is_media {
                if below.level.is_foreground() {
                    next.level = HmiLevel::Background;
                }
                next.audio = AudioStreamingState::NotAudible;
            }
        }
        StateId::EmbeddedNavi => {
            // The head unit's own navigation owns the guidance channel.
            if caps.is_navi {
                next.audio = AudioStreamingState::NotAudible;
            }
        }
        StateId::NaviStreaming | StateId::VideoStreaming => {
            if !caps.is_navi {
                if below.level.is_foreground() {
                    next.level = HmiLevel::Background;
                }
                next.audio = AudioStreamingState::NotAudible;
                next.video = VideoStreamingState::NotStreamable;
            }
        }
        StateId::DeactivateHmi => {
            next.level = HmiLevel::None;
            next.audio = AudioStreamingState::NotAudible;
            next.video = VideoStreamingState::NotStreamable;
        }
        StateId::Regular | StateId::Current | StateId::Postponed => {}
    }
    next
}

/// Compose the observable Current state: fold every active temporary layer
/// over the Regular base in canonical order.
pub fn compose(
    regular: &HmiState,
    active: &[StateId],
    caps: &AppCapabilities,
    env: &ComposeEnv,
) -> HmiState {
    let mut current = *regular;
    for id in TEMPORARY_ORDER {
        if active.contains(&id) {
            current = apply_interruption(id, &current, caps, env);
        }
    }
    current
}

/// Ducking applies only to a stream that is actually occupying the channel;
/// silence is never promoted to ATTENUATED.
fn ducked_audio(below: &HmiState, caps: &AppCapabilities) -> AudioStreamingState {
    if caps.is_audio() && below.level.is_foreground() && below.audio.is_audible() {
        AudioStreamingState::Attenuated
    } else {
        AudioStreamingState::NotAudible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTENUATED: ComposeEnv = ComposeEnv {
        attenuation_supported: true,
    };
    const MUTED: ComposeEnv = ComposeEnv {
        attenuation_supported: false,
    };

    fn state(
        level: HmiLevel,
        audio: AudioStreamingState,
        video: VideoStreamingState,
        context: SystemContext,
    ) -> HmiState {
        HmiState::new(level, audio, video, context)
    }

    /// Base states every registered application can legitimately hold.
    fn base_states_for_audio_app() -> Vec<HmiState> {
        use AudioStreamingState::*;
        use HmiLevel::*;
        use VideoStreamingState::NotStreamable;
        vec![
            state(None, NotAudible, NotStreamable, SystemContext::Main),
            state(None, NotAudible, NotStreamable, SystemContext::Menu),
            state(Background, NotAudible, NotStreamable, SystemContext::Main),
            state(Limited, Audible, NotStreamable, SystemContext::Main),
            state(Limited, Attenuated, NotStreamable, SystemContext::Main),
            state(Full, NotAudible, NotStreamable, SystemContext::Main),
            state(Full, Audible, NotStreamable, SystemContext::Main),
        ]
    }

    fn base_states_for_simple_app() -> Vec<HmiState> {
        use AudioStreamingState::NotAudible;
        use HmiLevel::*;
        use VideoStreamingState::NotStreamable;
        vec![
            state(None, NotAudible, NotStreamable, SystemContext::Main),
            state(Background, NotAudible, NotStreamable, SystemContext::Main),
            state(Full, NotAudible, NotStreamable, SystemContext::Main),
        ]
    }

    #[test]
    fn test_vr_session_mutes_and_owns_context() {
        for base in base_states_for_audio_app() {
            let composed =
                apply_interruption(StateId::VrSession, &base, &AppCapabilities::MEDIA, &MUTED);
            assert_eq!(composed.audio, AudioStreamingState::NotAudible);
            assert_eq!(composed.context, SystemContext::VrSession);
            assert_eq!(composed.level, base.level);
            assert_eq!(composed.video, base.video);
        }
    }

    #[test]
    fn test_tts_without_attenuation_mutes() {
        for base in base_states_for_audio_app() {
            let composed =
                apply_interruption(StateId::TtsSession, &base, &AppCapabilities::MEDIA, &MUTED);
            assert_eq!(composed.audio, AudioStreamingState::NotAudible);
            assert_eq!(composed.level, base.level);
            assert_eq!(composed.context, base.context);
        }
    }

    #[test]
    fn test_tts_with_attenuation_ducks_audible_streams() {
        use AudioStreamingState::*;
        let cases = [
            (HmiState::full_audible(), Attenuated),
            (HmiState::limited_audible(), Attenuated),
            (HmiState::limited_audible().with_audio(Attenuated), Attenuated),
            (HmiState::full(), NotAudible),
            (HmiState::background(), NotAudible),
            (HmiState::none(), NotAudible),
        ];
        for (base, expected) in cases {
            let composed = apply_interruption(
                StateId::TtsSession,
                &base,
                &AppCapabilities::MEDIA,
                &ATTENUATED,
            );
            assert_eq!(composed.audio, expected, "base {base}");
            assert_eq!(composed.level, base.level);
        }
    }

    #[test]
    fn test_tts_with_attenuation_still_mutes_non_audio_apps() {
        let base = HmiState::full();
        let composed = apply_interruption(
            StateId::TtsSession,
            &base,
            &AppCapabilities::default(),
            &ATTENUATED,
        );
        assert_eq!(composed.audio, AudioStreamingState::NotAudible);
    }

    #[test]
    fn test_phone_call_backgrounds_media() {
        let caps = AppCapabilities::MEDIA;
        let full = apply_interruption(StateId::PhoneCall, &HmiState::full_audible(), &caps, &MUTED);
        assert_eq!(full, HmiState::background());

        let limited =
            apply_interruption(StateId::PhoneCall, &HmiState::limited_audible(), &caps, &MUTED);
        assert_eq!(limited, HmiState::background());

        // Already out of the foreground: untouched.
        let none = apply_interruption(StateId::PhoneCall, &HmiState::none(), &caps, &MUTED);
        assert_eq!(none, HmiState::none());
    }

    #[test]
    fn test_phone_call_limits_navi() {
        let caps = AppCapabilities::NAVI;
        let full = apply_interruption(StateId::PhoneCall, &HmiState::full_audible(), &caps, &MUTED);
        assert_eq!(full.level, HmiLevel::Limited);
        assert_eq!(full.audio, AudioStreamingState::NotAudible);

        // Navi wins over media for a mixed application.
        let mixed = AppCapabilities {
            is_media: true,
            is_navi: true,
            ..Default::default()
        };
        let composed =
            apply_interruption(StateId::PhoneCall, &HmiState::full_audible(), &mixed, &MUTED);
        assert_eq!(composed.level, HmiLevel::Limited);
    }

    #[test]
    fn test_phone_call_leaves_simple_apps_alone() {
        for base in base_states_for_simple_app() {
            let composed = apply_interruption(
                StateId::PhoneCall,
                &base,
                &AppCapabilities::default(),
                &MUTED,
            );
            assert_eq!(composed, base);
        }
        let vc = apply_interruption(
            StateId::PhoneCall,
            &HmiState::limited_audible(),
            &AppCapabilities::VOICE_COMM,
            &MUTED,
        );
        assert_eq!(vc, HmiState::limited_audible());
    }

    #[test]
    fn test_safety_mode_and_audio_source_mute() {
        for id in [StateId::SafetyMode, StateId::AudioSource] {
            let composed =
                apply_interruption(id, &HmiState::full_audible(), &AppCapabilities::MEDIA, &MUTED);
            assert_eq!(composed.audio, AudioStreamingState::NotAudible);
            assert_eq!(composed.level, HmiLevel::Full);

            // Attenuation support makes no difference for these layers.
            let ducked = apply_interruption(
                id,
                &HmiState::full_audible(),
                &AppCapabilities::MEDIA,
                &ATTENUATED,
            );
            assert_eq!(ducked.audio, AudioStreamingState::NotAudible);
        }
    }

    #[test]
    fn test_embedded_navi_mutes_navi_apps_only() {
        let navi = apply_interruption(
            StateId::EmbeddedNavi,
            &HmiState::limited_audible(),
            &AppCapabilities::NAVI,
            &MUTED,
        );
        assert_eq!(navi.audio, AudioStreamingState::NotAudible);
        assert_eq!(navi.level, HmiLevel::Limited);

        let media = apply_interruption(
            StateId::EmbeddedNavi,
            &HmiState::limited_audible(),
            &AppCapabilities::MEDIA,
            &MUTED,
        );
        assert_eq!(media, HmiState::limited_audible());
    }

    #[test]
    fn test_video_streaming_clamps_non_navi_carriers() {
        let base = HmiState::full()
            .with_video(VideoStreamingState::Streamable);
        let composed = apply_interruption(
            StateId::VideoStreaming,
            &base,
            &AppCapabilities::PROJECTION,
            &MUTED,
        );
        assert_eq!(composed.level, HmiLevel::Background);
        assert_eq!(composed.audio, AudioStreamingState::NotAudible);
        assert_eq!(composed.video, VideoStreamingState::NotStreamable);

        // A backgrounded carrier is not promoted.
        let background = apply_interruption(
            StateId::VideoStreaming,
            &HmiState::background(),
            &AppCapabilities::PROJECTION,
            &MUTED,
        );
        assert_eq!(background.level, HmiLevel::Background);
    }

    #[test]
    fn test_navi_streaming_leaves_navi_untouched() {
        let base = HmiState::full_audible().with_video(VideoStreamingState::Streamable);
        let composed =
            apply_interruption(StateId::NaviStreaming, &base, &AppCapabilities::NAVI, &MUTED);
        assert_eq!(composed, base);
    }

    #[test]
    fn test_deactivate_hmi_sends_everything_to_none() {
        for base in base_states_for_audio_app() {
            let composed = apply_interruption(
                StateId::DeactivateHmi,
                &base,
                &AppCapabilities::MEDIA,
                &MUTED,
            );
            assert_eq!(composed.level, HmiLevel::None);
            assert_eq!(composed.audio, AudioStreamingState::NotAudible);
            assert_eq!(composed.video, VideoStreamingState::NotStreamable);
        }
    }

    #[test]
    fn test_compose_is_push_order_insensitive() {
        let caps = AppCapabilities::MEDIA;
        let regular = HmiState::full_audible();

        let a = compose(
            &regular,
            &[StateId::TtsSession, StateId::PhoneCall],
            &caps,
            &ATTENUATED,
        );
        let b = compose(
            &regular,
            &[StateId::PhoneCall, StateId::TtsSession],
            &caps,
            &ATTENUATED,
        );
        assert_eq!(a, b);
        // The call backgrounds the app before TTS looks at it, so there is
        // nothing left to duck.
        assert_eq!(a, HmiState::background());
    }

    #[test]
    fn test_compose_phone_call_then_vr() {
        let caps = AppCapabilities::NAVI;
        let regular = HmiState::full_audible().with_video(VideoStreamingState::Streamable);
        let composed = compose(
            &regular,
            &[StateId::VrSession, StateId::PhoneCall],
            &caps,
            &MUTED,
        );
        assert_eq!(composed.level, HmiLevel::Limited);
        assert_eq!(composed.audio, AudioStreamingState::NotAudible);
        assert_eq!(composed.context, SystemContext::VrSession);
        assert_eq!(composed.video, VideoStreamingState::Streamable);
    }

    #[test]
    fn test_compose_without_layers_is_identity() {
        for base in base_states_for_audio_app() {
            assert_eq!(compose(&base, &[], &AppCapabilities::MEDIA, &MUTED), base);
        }
    }

    #[test]
    fn test_composed_states_stay_valid() {
        let layer_sets: &[&[StateId]] = &[
            &[StateId::PhoneCall],
            &[StateId::VrSession, StateId::TtsSession],
            &[StateId::PhoneCall, StateId::SafetyMode, StateId::VrSession],
            &[StateId::DeactivateHmi, StateId::PhoneCall],
            &[StateId::NaviStreaming],
        ];
        let all_caps = [
            AppCapabilities::default(),
            AppCapabilities::MEDIA,
            AppCapabilities::NAVI,
            AppCapabilities::PROJECTION,
            AppCapabilities::VOICE_COMM,
        ];
        for caps in all_caps {
            let bases = if caps.is_audio() {
                base_states_for_audio_app()
            } else {
                base_states_for_simple_app()
            };
            for base in bases {
                for layers in layer_sets {
                    for env in [MUTED, ATTENUATED] {
                        let composed = compose(&base, layers, &caps, &env);
                        assert!(composed.is_valid());
                        assert!(
                            !composed.audio.is_audible() || composed.level.is_foreground(),
                            "audible outside foreground: {composed} from {base} via {layers:?}"
                        );
                    }
                }
            }
        }
    }
}
