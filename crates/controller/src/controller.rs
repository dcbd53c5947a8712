//! The state controller façade and event sink.
//!
//! Single writer for the registry and every layer stack. Classifies incoming
//! requests and system events, runs the conflict resolver for Regular
//! transitions, and emits notifications through the bridge only when an
//! application's composed Current state actually changed.

use carlink_application::{Application, ApplicationRegistry};
use carlink_events::{
    ActivateAppRequest, ActivationResult, HmiBridgeRef, HmiLevelChange, HmiStatusNotification,
    ResumeAudioSource, SystemEvent,
};
use carlink_state::{
    AppCapabilities, AudioStreamingState, ComposeEnv, HmiLevel, HmiState, StateId, SystemContext,
    VideoStreamingState,
};

use crate::error::{ControllerError, ControllerResult};
use crate::pending::PendingActivations;
use crate::resolver::resolve_conflicts;

/// Head-unit policy knobs the controller is constructed with.
#[derive(Debug, Clone)]
pub struct StateControllerConfig {
    /// Level granted to a freshly registered application.
    pub default_level: HmiLevel,
    /// The head unit can duck mobile audio instead of muting it.
    pub attenuation_supported: bool,
    /// Promote a resuming audio application's audio to AUDIBLE on foreground
    /// grants even when the request said otherwise. Off by default.
    pub audio_resume_promotion: bool,
}

impl Default for StateControllerConfig {
    fn default() -> Self {
        Self {
            default_level: HmiLevel::None,
            attenuation_supported: false,
            audio_resume_promotion: false,
        }
    }
}

/// The HMI state controller core.
pub struct StateController {
    config: StateControllerConfig,
    bridge: HmiBridgeRef,
    registry: ApplicationRegistry,
    /// System-wide interruptions currently layered on every stack.
    active_interruptions: Vec<StateId>,
    pending: PendingActivations,
}

impl StateController {
    pub fn new(config: StateControllerConfig, bridge: HmiBridgeRef) -> Self {
        Self {
            config,
            bridge,
            registry: ApplicationRegistry::new(),
            active_interruptions: Vec::new(),
            pending: PendingActivations::new(),
        }
    }

    pub fn config(&self) -> &StateControllerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ApplicationRegistry {
        &self.registry
    }

    pub fn application(&self, app_id: u32) -> Option<&Application> {
        self.registry.get(app_id)
    }

    /// The application currently holding the visual foreground, if any.
    pub fn active_application(&self) -> Option<&Application> {
        self.registry
            .iter()
            .find(|a| a.regular_state().level == HmiLevel::Full)
    }

    /// Composed Current state of one application.
    pub fn current_state(&self, app_id: u32) -> Option<HmiState> {
        let env = self.env();
        self.registry.get(app_id).map(|a| a.current_state(&env))
    }

    pub fn regular_state(&self, app_id: u32) -> Option<HmiState> {
        self.registry.get(app_id).map(|a| *a.regular_state())
    }

    pub fn pending_activation_count(&self) -> usize {
        self.pending.len()
    }

    /// True for the always-present layer kinds, otherwise true iff the layer
    /// is currently active somewhere.
    pub fn is_state_active(&self, id: StateId) -> bool {
        match id {
            StateId::Regular | StateId::Current => true,
            _ => {
                self.active_interruptions.contains(&id)
                    || self.registry.iter().any(|a| a.has_hmi_state(id))
            }
        }
    }

    /// Marks an application as being restored by the resumption layer;
    /// Regular requests arriving during an interruption are parked for it.
    pub fn set_app_resuming(&mut self, app_id: u32, resuming: bool) {
        if let Some(app) = self.registry.get_mut(app_id) {
            app.set_resuming(resuming);
        }
    }

    /// Drop a parked Regular transition without applying it.
    pub fn remove_postponed_state(&mut self, app_id: u32) {
        if let Some(app) = self.registry.get_mut(app_id) {
            app.remove_postponed_state();
        }
    }

    // --- Registration lifecycle ---

    /// Install a Regular layer at the platform default and replay every
    /// ongoing interruption onto the fresh stack, so the application
    /// immediately observes an active phone call, VR session and so on.
    pub fn on_application_registered(
        &mut self,
        app_id: u32,
        hmi_app_id: u32,
        device_handle: u32,
        capabilities: AppCapabilities,
    ) {
        if self.registry.get(app_id).is_some() {
            tracing::debug!(app_id, "application already registered");
            return;
        }
        let env = self.env();
        let default_regular = HmiState::new(
            self.config.default_level,
            AudioStreamingState::NotAudible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        );
        let mut app = Application::new(app_id, hmi_app_id, device_handle, capabilities);
        app.set_regular_state(default_regular);
        for id in &self.active_interruptions {
            app.add_hmi_state(*id);
        }
        let current = app.current_state(&env);
        self.registry.insert(app);
        tracing::info!(app_id, hmi_app_id, "application registered");

        // The HMI already believes the provisional default; only a difference
        // caused by ongoing interruptions needs announcing.
        self.emit_state_change(app_id, default_regular, current);
    }

    /// Cancels any pending activation and removes the application. Emits
    /// nothing.
    pub fn on_app_unregistered(&mut self, app_id: u32) {
        self.pending.cancel_for_app(app_id);
        if self.registry.remove(app_id).is_some() {
            tracing::info!(app_id, "application unregistered");
        }
    }

    // --- Regular state requests ---

    /// Request a new Regular state for an application. Inadmissible requests
    /// and unknown applications are dropped with a log line.
    pub fn set_regular_state(&mut self, app_id: u32, state: HmiState, request_activation: bool) {
        if let Err(error) = self.try_set_regular_state(app_id, state, request_activation) {
            tracing::warn!(app_id, %error, "regular state request dropped");
        }
    }

    /// Level-only convenience: keep the prior Current's audio, video and
    /// context, clamping audio when the new level cannot carry it. FULL goes
    /// through the head-unit activation hand-off.
    pub fn set_regular_level(&mut self, app_id: u32, level: HmiLevel) {
        let env = self.env();
        let Some(app) = self.registry.get(app_id) else {
            tracing::warn!(app_id, "level request for unknown application");
            return;
        };
        let current = app.current_state(&env);
        let audio = if level.is_foreground() {
            current.audio
        } else {
            AudioStreamingState::NotAudible
        };
        let candidate = HmiState::new(level, audio, current.video, current.context);
        self.set_regular_state(app_id, candidate, true);
    }

    fn try_set_regular_state(
        &mut self,
        app_id: u32,
        state: HmiState,
        request_activation: bool,
    ) -> ControllerResult<()> {
        let hmi_app_id = {
            let Some(app) = self.registry.get_mut(app_id) else {
                return Err(ControllerError::UnknownApplication { app_id });
            };
            if !state.is_allowed_for(app.capabilities()) {
                return Err(ControllerError::InvalidState { app_id });
            }
            if app.has_temporary_states() && app.is_resuming() {
                app.set_postponed_state(state, request_activation);
                tracing::debug!(app_id, %state, "regular state postponed during interruption");
                return Ok(());
            }
            app.hmi_app_id()
        };

        if request_activation && state.level == HmiLevel::Full {
            let correlation_id = self.pending.register(app_id, state);
            tracing::debug!(app_id, correlation_id, "requesting activation from head unit");
            self.bridge.send_activate_app(ActivateAppRequest {
                app_id,
                hmi_app_id,
                level: state.level,
                correlation_id,
            });
            return Ok(());
        }

        self.apply_regular(app_id, state, None);
        Ok(())
    }

    /// Apply a validated Regular transition: resolve conflicts, swap the
    /// Regular layers, notify whoever actually changed. Demoted applications
    /// are notified in registry order, the target last. `target_old_current`
    /// overrides the before-state used for the target's notification when the
    /// transition replaces a just-popped layer in one observable step.
    fn apply_regular(&mut self, target_id: u32, state: HmiState, target_old_current: Option<HmiState>) {
        let Some(target) = self.registry.get(target_id) else {
            return;
        };
        let caps = *target.capabilities();
        let resuming = target.is_resuming();

        let mut state = state;
        if self.config.audio_resume_promotion
            && resuming
            && caps.is_audio()
            && state.level.is_foreground()
        {
            state.audio = AudioStreamingState::Audible;
        }

        let env = self.env();
        let demotions = resolve_conflicts(&self.registry, target_id, &state);
        let changes = demotions
            .iter()
            .map(|d| (d.app_id, d.new_regular, None))
            .chain(std::iter::once((target_id, state, target_old_current)));

        for (app_id, new_regular, old_override) in changes.collect::<Vec<_>>() {
            let Some((old_current, new_current)) = ({
                self.registry.get_mut(app_id).map(|app| {
                    let old = app.current_state(&env);
                    app.set_regular_state(new_regular);
                    (old_override.unwrap_or(old), app.current_state(&env))
                })
            }) else {
                continue;
            };
            self.emit_state_change(app_id, old_current, new_current);
        }

        if resuming && caps.is_audio() && state.level.is_foreground() && state.audio.is_audible() {
            let correlation_id = self.pending.fresh_correlation_id();
            self.bridge.send_resume_audio_source(ResumeAudioSource {
                app_id: target_id,
                correlation_id,
            });
        }

        #[cfg(debug_assertions)]
        self.assert_exclusivity();
    }

    /// A resolver bug would surface here. Loud in test builds only; release
    /// builds degrade to last-writer-wins without announcing anything.
    #[cfg(debug_assertions)]
    fn assert_exclusivity(&self) {
        let full_holders = self
            .registry
            .iter()
            .filter(|a| a.regular_state().level == HmiLevel::Full)
            .count();
        debug_assert!(full_holders <= 1, "multiple FULL holders after resolution");

        for other in self.registry.iter() {
            let regular = other.regular_state();
            if !(regular.level.is_foreground() && regular.audio.is_audible()) {
                continue;
            }
            let conflicts = self
                .registry
                .iter()
                .filter(|b| b.app_id() != other.app_id())
                .filter(|b| b.capabilities().shares_class(other.capabilities()))
                .filter(|b| {
                    b.regular_state().level.is_foreground()
                        && b.regular_state().audio.is_audible()
                })
                .count();
            debug_assert!(
                conflicts == 0,
                "audible class conflict after resolution for {}",
                other.app_id()
            );
        }
    }

    // --- Event sink ---

    pub fn on_event(&mut self, event: SystemEvent) {
        match event {
            SystemEvent::VrStarted => self.apply_interruption(StateId::VrSession),
            SystemEvent::VrStopped => self.release_interruption(StateId::VrSession),
            SystemEvent::TtsStarted => self.apply_interruption(StateId::TtsSession),
            SystemEvent::TtsStopped => self.release_interruption(StateId::TtsSession),
            SystemEvent::InterruptionChanged { kind, active } => {
                let id = kind.state_id();
                if active {
                    self.apply_interruption(id);
                } else {
                    self.release_interruption(id);
                }
            }
            SystemEvent::VideoStreamingStarted { app_id } => self.start_video_streaming(app_id),
            SystemEvent::VideoStreamingStopped { app_id } => self.stop_video_streaming(app_id),
            SystemEvent::ActivateAppResponse {
                correlation_id,
                result,
            } => self.on_activate_app_response(correlation_id, result),
            SystemEvent::AppActivated { hmi_app_id } => self.on_app_activated(hmi_app_id),
            SystemEvent::AppDeactivated { hmi_app_id } => self.on_app_deactivated(hmi_app_id),
        }
    }

    /// Push a system-wide temporary layer onto every stack.
    fn apply_interruption(&mut self, id: StateId) {
        if self.active_interruptions.contains(&id) {
            return;
        }
        tracing::info!(layer = %id, "interruption started");
        self.active_interruptions.push(id);

        let env = self.env();
        for app_id in self.registry.app_ids() {
            let Some((old, new)) = ({
                self.registry.get_mut(app_id).map(|app| {
                    let old = app.current_state(&env);
                    app.add_hmi_state(id);
                    (old, app.current_state(&env))
                })
            }) else {
                continue;
            };
            self.emit_state_change(app_id, old, new);
        }
    }

    /// Pop a system-wide temporary layer from every stack, then consume any
    /// parked Regular transitions.
    fn release_interruption(&mut self, id: StateId) {
        if !self.active_interruptions.contains(&id) {
            tracing::debug!(layer = %id, "release for inactive interruption");
            return;
        }
        self.active_interruptions.retain(|a| *a != id);
        tracing::info!(layer = %id, "interruption ended");

        let env = self.env();
        let app_ids = self.registry.app_ids();
        let mut popped = Vec::with_capacity(app_ids.len());
        for app_id in app_ids {
            let Some(old) = ({
                self.registry.get_mut(app_id).map(|app| {
                    let old = app.current_state(&env);
                    app.remove_hmi_state(id);
                    old
                })
            }) else {
                continue;
            };
            popped.push((app_id, old));
        }
        for (app_id, old_current) in popped {
            self.finish_layer_removal(app_id, old_current);
        }
    }

    fn start_video_streaming(&mut self, app_id: u32) {
        let env = self.env();
        let Some((old, new)) = ({
            self.registry.get_mut(app_id).map(|app| {
                let id = if app.capabilities().is_navi {
                    StateId::NaviStreaming
                } else {
                    StateId::VideoStreaming
                };
                let old = app.current_state(&env);
                app.add_hmi_state(id);
                (old, app.current_state(&env))
            })
        }) else {
            tracing::warn!(app_id, "video streaming start for unknown application");
            return;
        };
        self.emit_state_change(app_id, old, new);
    }

    fn stop_video_streaming(&mut self, app_id: u32) {
        let env = self.env();
        let Some(old) = ({
            self.registry.get_mut(app_id).map(|app| {
                let old = app.current_state(&env);
                app.remove_hmi_state(StateId::NaviStreaming);
                app.remove_hmi_state(StateId::VideoStreaming);
                old
            })
        }) else {
            tracing::warn!(app_id, "video streaming stop for unknown application");
            return;
        };
        self.finish_layer_removal(app_id, old);
    }

    /// After a layer pop: replay the parked Regular transition if there is
    /// one and the interruption window is really over, so the mobile side
    /// observes a single transition out of the interrupted state.
    fn finish_layer_removal(&mut self, app_id: u32, old_current: HmiState) {
        let parked = self.registry.get_mut(app_id).and_then(|app| {
            if app.has_temporary_states() && app.is_resuming() {
                // Another interruption still covers the app; keep it parked.
                None
            } else {
                app.take_postponed_state()
            }
        });

        let Some(parked) = parked else {
            self.emit_change_from(app_id, old_current);
            return;
        };

        tracing::debug!(app_id, state = %parked.state, "consuming postponed state");
        let admissible = self
            .registry
            .get(app_id)
            .map(|a| parked.state.is_allowed_for(a.capabilities()))
            .unwrap_or(false);
        if !admissible {
            tracing::warn!(app_id, "postponed state no longer admissible, dropped");
            self.emit_change_from(app_id, old_current);
            return;
        }

        if parked.request_activation && parked.state.level == HmiLevel::Full {
            // Same hand-off as a live request: ask the head unit first.
            let hmi_app_id = self
                .registry
                .get(app_id)
                .map(|a| a.hmi_app_id())
                .unwrap_or_default();
            let correlation_id = self.pending.register(app_id, parked.state);
            self.bridge.send_activate_app(ActivateAppRequest {
                app_id,
                hmi_app_id,
                level: parked.state.level,
                correlation_id,
            });
            self.emit_change_from(app_id, old_current);
            return;
        }

        self.apply_regular(app_id, parked.state, Some(old_current));
    }

    fn on_activate_app_response(&mut self, correlation_id: u32, result: ActivationResult) {
        let Some(pending) = self.pending.take(correlation_id) else {
            tracing::debug!(correlation_id, "activation response with stale correlation id");
            return;
        };
        if !result.is_success() {
            tracing::info!(
                app_id = pending.app_id,
                correlation_id,
                ?result,
                "activation denied by head unit"
            );
            return;
        }
        if let Err(error) = self.try_set_regular_state(pending.app_id, pending.state, false) {
            tracing::warn!(app_id = pending.app_id, %error, "deferred activation dropped");
        }
    }

    /// The driver brought the application forward on the head unit.
    fn on_app_activated(&mut self, hmi_app_id: u32) {
        let Some(app) = self.registry.by_hmi_app(hmi_app_id) else {
            tracing::debug!(hmi_app_id, "activation for unknown HMI application");
            return;
        };
        let app_id = app.app_id();
        let caps = *app.capabilities();
        if app.regular_state().level == HmiLevel::Full {
            return;
        }
        let state = HmiState::new(
            HmiLevel::Full,
            if caps.is_audio() {
                AudioStreamingState::Audible
            } else {
                AudioStreamingState::NotAudible
            },
            if caps.is_video() {
                VideoStreamingState::Streamable
            } else {
                VideoStreamingState::NotStreamable
            },
            SystemContext::Main,
        );
        self.set_regular_state(app_id, state, true);
    }

    /// The head unit took the foreground away. Audio applications fall back
    /// to LIMITED and keep their channel unless a class-mate already holds an
    /// audible foreground state.
    fn on_app_deactivated(&mut self, hmi_app_id: u32) {
        let env = self.env();
        let Some(app) = self.registry.by_hmi_app(hmi_app_id) else {
            tracing::debug!(hmi_app_id, "deactivation for unknown HMI application");
            return;
        };
        let app_id = app.app_id();
        let caps = *app.capabilities();
        let current = app.current_state(&env);
        if !current.level.is_foreground() {
            return;
        }
        let regular = *app.regular_state();

        let channel_free = !self.registry.iter().any(|other| {
            other.app_id() != app_id
                && other.capabilities().shares_class(&caps)
                && other.regular_state().level.is_foreground()
                && other.regular_state().audio.is_audible()
        });
        let new_regular = if caps.is_audio() && channel_free {
            HmiState::new(
                HmiLevel::Limited,
                AudioStreamingState::Audible,
                regular.video,
                regular.context,
            )
        } else {
            HmiState::new(
                HmiLevel::Background,
                AudioStreamingState::NotAudible,
                VideoStreamingState::NotStreamable,
                regular.context,
            )
        };
        self.set_regular_state(app_id, new_regular, false);
    }

    // --- Notification plumbing ---

    fn emit_change_from(&mut self, app_id: u32, old_current: HmiState) {
        let env = self.env();
        let Some(app) = self.registry.get(app_id) else {
            return;
        };
        let new_current = app.current_state(&env);
        self.emit_state_change(app_id, old_current, new_current);
    }

    /// Notify collaborators iff the observable state changed. The data reset
    /// fires exactly once per transition into NONE.
    fn emit_state_change(&mut self, app_id: u32, old: HmiState, new: HmiState) {
        if old == new {
            return;
        }
        if new.level == HmiLevel::None && old.level != HmiLevel::None {
            if let Some(app) = self.registry.get_mut(app_id) {
                app.reset_data_in_none();
            }
        }
        tracing::debug!(app_id, from = %old, to = %new, "HMI state changed");
        self.bridge
            .send_hmi_status(HmiStatusNotification::new(app_id, &new));
        self.bridge.on_hmi_level_changed(HmiLevelChange {
            app_id,
            old_level: old.level,
            new_level: new.level,
        });
    }

    fn env(&self) -> ComposeEnv {
        ComposeEnv {
            attenuation_supported: self.config.attenuation_supported,
        }
    }
}
