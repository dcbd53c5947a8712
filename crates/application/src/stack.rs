//! The per-application layer stack.
//!
//! A stack is a Regular base, the set of temporary layers currently active
//! for the application, and an out-of-band postponed slot. The temporary set
//! is kept in canonical composition order; at most one layer per `StateId`
//! exists at a time.

use carlink_state::{compose, AppCapabilities, ComposeEnv, HmiState, StateId, TEMPORARY_ORDER};

/// A Regular transition parked while an interruption is active, together
/// with the activation flag of the original request so replay uses the same
/// head-unit hand-off logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostponedState {
    pub state: HmiState,
    pub request_activation: bool,
}

/// Layer stack for one application.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    regular: HmiState,
    temporaries: Vec<StateId>,
    postponed: Option<PostponedState>,
}

impl StateStack {
    pub fn new(regular: HmiState) -> Self {
        Self {
            regular,
            temporaries: Vec::new(),
            postponed: None,
        }
    }

    pub fn regular(&self) -> &HmiState {
        &self.regular
    }

    pub fn set_regular(&mut self, state: HmiState) {
        self.regular = state;
    }

    /// Push a temporary layer. Pushing a layer that is already present or a
    /// non-temporary id is ignored.
    pub fn push_temporary(&mut self, id: StateId) {
        if !id.is_temporary() {
            tracing::warn!(layer = %id, "refusing to push non-temporary layer");
            return;
        }
        if self.temporaries.contains(&id) {
            return;
        }
        self.temporaries.push(id);
        // Keep canonical order so iteration below equals composition order.
        self.temporaries
            .sort_by_key(|id| TEMPORARY_ORDER.iter().position(|o| o == id));
    }

    /// Remove a temporary layer. Returns whether it was present.
    pub fn pop_temporary(&mut self, id: StateId) -> bool {
        let before = self.temporaries.len();
        self.temporaries.retain(|t| *t != id);
        before != self.temporaries.len()
    }

    pub fn has_temporary(&self, id: StateId) -> bool {
        self.temporaries.contains(&id)
    }

    pub fn has_any_temporary(&self) -> bool {
        !self.temporaries.is_empty()
    }

    pub fn temporaries(&self) -> &[StateId] {
        &self.temporaries
    }

    /// Fold the active layers over Regular into the observable Current state.
    pub fn current(&self, caps: &AppCapabilities, env: &ComposeEnv) -> HmiState {
        compose(&self.regular, &self.temporaries, caps, env)
    }

    /// Park a Regular transition. A second postponement overwrites the first.
    pub fn set_postponed(&mut self, state: HmiState, request_activation: bool) {
        self.postponed = Some(PostponedState {
            state,
            request_activation,
        });
    }

    pub fn postponed(&self) -> Option<&PostponedState> {
        self.postponed.as_ref()
    }

    /// Consume the postponed slot.
    pub fn take_postponed(&mut self) -> Option<PostponedState> {
        self.postponed.take()
    }

    pub fn remove_postponed(&mut self) {
        self.postponed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carlink_state::{AudioStreamingState, HmiLevel, SystemContext};

    fn stack() -> StateStack {
        StateStack::new(HmiState::full_audible())
    }

    const ENV: ComposeEnv = ComposeEnv {
        attenuation_supported: false,
    };

    #[test]
    fn test_push_is_idempotent_per_id() {
        let mut stack = stack();
        stack.push_temporary(StateId::VrSession);
        stack.push_temporary(StateId::VrSession);
        assert_eq!(stack.temporaries(), &[StateId::VrSession]);
    }

    #[test]
    fn test_push_keeps_canonical_order() {
        let mut stack = stack();
        stack.push_temporary(StateId::TtsSession);
        stack.push_temporary(StateId::PhoneCall);
        stack.push_temporary(StateId::VrSession);
        assert_eq!(
            stack.temporaries(),
            &[StateId::PhoneCall, StateId::VrSession, StateId::TtsSession]
        );
    }

    #[test]
    fn test_non_temporary_layers_are_refused() {
        let mut stack = stack();
        stack.push_temporary(StateId::Regular);
        stack.push_temporary(StateId::Postponed);
        assert!(!stack.has_any_temporary());
    }

    #[test]
    fn test_pop_restores_previous_current() {
        let caps = AppCapabilities::MEDIA;
        let mut stack = stack();
        let before = stack.current(&caps, &ENV);

        stack.push_temporary(StateId::VrSession);
        let during = stack.current(&caps, &ENV);
        assert_eq!(during.audio, AudioStreamingState::NotAudible);
        assert_eq!(during.context, SystemContext::VrSession);

        assert!(stack.pop_temporary(StateId::VrSession));
        assert_eq!(stack.current(&caps, &ENV), before);
        assert!(!stack.pop_temporary(StateId::VrSession));
    }

    #[test]
    fn test_current_with_phone_call() {
        let caps = AppCapabilities::MEDIA;
        let mut stack = stack();
        stack.push_temporary(StateId::PhoneCall);
        assert_eq!(stack.current(&caps, &ENV), HmiState::background());
    }

    #[test]
    fn test_postponed_overwrite_and_take() {
        let mut stack = stack();
        assert!(stack.postponed().is_none());

        stack.set_postponed(HmiState::limited_audible(), false);
        stack.set_postponed(HmiState::full_audible(), true);

        let parked = stack.take_postponed().unwrap();
        assert_eq!(parked.state, HmiState::full_audible());
        assert!(parked.request_activation);
        assert!(stack.take_postponed().is_none());
    }

    #[test]
    fn test_remove_postponed() {
        let mut stack = stack();
        stack.set_postponed(HmiState::background(), false);
        stack.remove_postponed();
        assert!(stack.postponed().is_none());
    }

    #[test]
    fn test_regular_swap_keeps_layers() {
        let caps = AppCapabilities::MEDIA;
        let mut stack = stack();
        stack.push_temporary(StateId::TtsSession);

        stack.set_regular(HmiState::new(
            HmiLevel::Limited,
            AudioStreamingState::Audible,
            carlink_state::VideoStreamingState::NotStreamable,
            SystemContext::Main,
        ));
        let current = stack.current(&caps, &ENV);
        assert_eq!(current.level, HmiLevel::Limited);
        assert_eq!(current.audio, AudioStreamingState::NotAudible);
    }
}
