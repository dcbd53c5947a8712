//! Pending head-unit activations.
//!
//! A `SetRegularState` with activation requested does not block: it sends an
//! `ActivateAppRequest` tagged with a fresh correlation id and parks the
//! transition here until the matching response (or the application's
//! unregistration) arrives.

use std::collections::HashMap;

use carlink_state::HmiState;

/// A deferred Regular transition awaiting head-unit acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActivation {
    pub app_id: u32,
    pub state: HmiState,
}

/// Correlation-id keyed table of deferred transitions. Ids are monotonically
/// unique for the lifetime of the controller.
#[derive(Debug, Default)]
pub struct PendingActivations {
    next_correlation_id: u32,
    pending: HashMap<u32, PendingActivation>,
}

impl PendingActivations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a correlation id without parking anything. Used for one-way
    /// notifications that still need a unique tag.
    pub fn fresh_correlation_id(&mut self) -> u32 {
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1);
        self.next_correlation_id
    }

    /// Park a transition and return the correlation id to send with the
    /// activation request.
    pub fn register(&mut self, app_id: u32, state: HmiState) -> u32 {
        let correlation_id = self.fresh_correlation_id();
        self.pending
            .insert(correlation_id, PendingActivation { app_id, state });
        correlation_id
    }

    /// Claim the transition for a response. None for stale correlation ids.
    pub fn take(&mut self, correlation_id: u32) -> Option<PendingActivation> {
        self.pending.remove(&correlation_id)
    }

    /// Drop every pending transition for an application (unregistration).
    pub fn cancel_for_app(&mut self, app_id: u32) {
        self.pending.retain(|_, p| p.app_id != app_id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
