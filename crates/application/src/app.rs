//! The application descriptor owned by the registry.

use carlink_state::{AppCapabilities, ComposeEnv, HmiState, StateId};

use crate::stack::{PostponedState, StateStack};

/// One registered mobile application and its layer stack.
///
/// The controller is the single writer; collaborators only ever see copies of
/// the composed states.
#[derive(Debug, Clone)]
pub struct Application {
    app_id: u32,
    hmi_app_id: u32,
    device_handle: u32,
    capabilities: AppCapabilities,
    /// Set by the resumption layer while this app's state is being restored
    /// after a reconnect.
    resuming: bool,
    stack: StateStack,
    data_resets: u32,
}

impl Application {
    pub fn new(
        app_id: u32,
        hmi_app_id: u32,
        device_handle: u32,
        capabilities: AppCapabilities,
    ) -> Self {
        Self {
            app_id,
            hmi_app_id,
            device_handle,
            capabilities,
            resuming: false,
            stack: StateStack::default(),
            data_resets: 0,
        }
    }

    pub fn app_id(&self) -> u32 {
        self.app_id
    }

    pub fn hmi_app_id(&self) -> u32 {
        self.hmi_app_id
    }

    pub fn device_handle(&self) -> u32 {
        self.device_handle
    }

    pub fn capabilities(&self) -> &AppCapabilities {
        &self.capabilities
    }

    pub fn is_audio(&self) -> bool {
        self.capabilities.is_audio()
    }

    pub fn is_video(&self) -> bool {
        self.capabilities.is_video()
    }

    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    pub fn set_resuming(&mut self, resuming: bool) {
        self.resuming = resuming;
    }

    // --- Stack operations (controller-only call sites) ---

    pub fn regular_state(&self) -> &HmiState {
        self.stack.regular()
    }

    pub fn set_regular_state(&mut self, state: HmiState) {
        self.stack.set_regular(state);
    }

    pub fn add_hmi_state(&mut self, id: StateId) {
        self.stack.push_temporary(id);
    }

    /// Returns whether the layer was present.
    pub fn remove_hmi_state(&mut self, id: StateId) -> bool {
        self.stack.pop_temporary(id)
    }

    pub fn has_hmi_state(&self, id: StateId) -> bool {
        self.stack.has_temporary(id)
    }

    pub fn has_temporary_states(&self) -> bool {
        self.stack.has_any_temporary()
    }

    pub fn current_state(&self, env: &ComposeEnv) -> HmiState {
        self.stack.current(&self.capabilities, env)
    }

    pub fn set_postponed_state(&mut self, state: HmiState, request_activation: bool) {
        self.stack.set_postponed(state, request_activation);
    }

    pub fn postponed_state(&self) -> Option<&PostponedState> {
        self.stack.postponed()
    }

    pub fn take_postponed_state(&mut self) -> Option<PostponedState> {
        self.stack.take_postponed()
    }

    pub fn remove_postponed_state(&mut self) {
        self.stack.remove_postponed();
    }

    /// Drop cached interaction data when the application loses all UI rights.
    /// Invoked by the controller exactly once per transition into NONE.
    pub fn reset_data_in_none(&mut self) {
        self.data_resets += 1;
        tracing::debug!(app_id = self.app_id, "application data reset in NONE");
    }

    /// How many times this application entered NONE from a non-NONE level.
    pub fn data_resets(&self) -> u32 {
        self.data_resets
    }
}
