//! Pure conflict resolution - no IO, no mutation, fully testable.
//!
//! Given a target application about to take a new Regular state, compute
//! which other applications must be demoted to preserve the exclusivity
//! invariants:
//!
//! - at most one application holds FULL,
//! - per audio class (media, navi, voice-comm), at most one application
//!   holds an audible foreground state.
//!
//! The resolver only reads; the controller applies the returned demotions.

use carlink_application::ApplicationRegistry;
use carlink_state::{
    AppCapabilities, AudioStreamingState, HmiLevel, HmiState, VideoStreamingState,
};

/// One resolver-mandated Regular change for a non-target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demotion {
    pub app_id: u32,
    pub new_regular: HmiState,
}

/// Compute the demotion set for `target_id` taking `candidate` as its new
/// Regular state. Demotions are returned in registry insertion order; running
/// the resolver twice over the same world yields the same set.
pub fn resolve_conflicts(
    registry: &ApplicationRegistry,
    target_id: u32,
    candidate: &HmiState,
) -> Vec<Demotion> {
    let Some(target) = registry.get(target_id) else {
        return Vec::new();
    };
    if !candidate.level.is_foreground() {
        return Vec::new();
    }

    let target_caps = *target.capabilities();
    let grabs_full = candidate.level == HmiLevel::Full;
    // An audible grant occupies the target's audio classes.
    let audible_grant = target_caps.is_audio() && candidate.audio.is_audible();

    let mut demotions = Vec::new();
    for other in registry.iter().filter(|a| a.app_id() != target_id) {
        let caps = *other.capabilities();
        let regular = *other.regular_state();
        if !regular.level.is_foreground() {
            continue;
        }

        let shares = caps.shares_class(&target_caps);
        let audible = regular.audio.is_audible();

        let new_regular = if grabs_full && regular.level == HmiLevel::Full {
            if !caps.is_audio() {
                Some(to_background(&regular))
            } else if shares && audible_grant {
                // Same class as the audible grant: the channel is taken.
                Some(to_background(&regular))
            } else if audible {
                // Vacate the visual foreground but keep the audio channel,
                // unless a class-mate already holds the LIMITED slot.
                if limited_classmate_exists(registry, target_id, other.app_id(), &caps) {
                    Some(to_background(&regular))
                } else {
                    Some(HmiState {
                        level: HmiLevel::Limited,
                        ..regular
                    })
                }
            } else {
                Some(to_background(&regular))
            }
        } else if audible_grant && shares && audible {
            // Audible grant against an audible class-mate in LIMITED (or in
            // FULL while the target only takes LIMITED).
            Some(to_background(&regular))
        } else {
            None
        };

        if let Some(new_regular) = new_regular {
            if new_regular != regular {
                demotions.push(Demotion {
                    app_id: other.app_id(),
                    new_regular,
                });
            }
        }
    }
    demotions
}

/// Another audio application (excluding the two given) already holds an
/// audible LIMITED state in one of `caps`' classes.
fn limited_classmate_exists(
    registry: &ApplicationRegistry,
    skip_a: u32,
    skip_b: u32,
    caps: &AppCapabilities,
) -> bool {
    registry.iter().any(|a| {
        a.app_id() != skip_a
            && a.app_id() != skip_b
            && a.capabilities().shares_class(caps)
            && a.regular_state().level == HmiLevel::Limited
            && a.regular_state().audio.is_audible()
    })
}

/// The head unit stops projecting a backgrounded stream, so the demotion
/// clears video along with audio.
fn to_background(regular: &HmiState) -> HmiState {
    HmiState {
        level: HmiLevel::Background,
        audio: AudioStreamingState::NotAudible,
        video: VideoStreamingState::NotStreamable,
        context: regular.context,
    }
}
