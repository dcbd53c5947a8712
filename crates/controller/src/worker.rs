//! Channel-based worker that serializes every controller entry point.
//!
//! All mutations and reads run on one dedicated thread draining a command
//! queue, so the core never executes two of its own operations in parallel
//! and events are applied strictly in arrival order.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use carlink_events::{HmiBridgeRef, SystemEvent};
use carlink_state::{AppCapabilities, HmiLevel, HmiState, StateId};

use crate::controller::{StateController, StateControllerConfig};

/// Command sent to the controller worker.
pub enum ControllerCommand {
    SetRegularState {
        app_id: u32,
        state: HmiState,
        request_activation: bool,
    },
    SetRegularLevel {
        app_id: u32,
        level: HmiLevel,
    },
    Event(SystemEvent),
    RegisterApplication {
        app_id: u32,
        hmi_app_id: u32,
        device_handle: u32,
        capabilities: AppCapabilities,
    },
    UnregisterApplication {
        app_id: u32,
    },
    SetResuming {
        app_id: u32,
        resuming: bool,
    },
    /// Serialized read: answered through the reply channel.
    QueryStateActive {
        state_id: StateId,
        reply: mpsc::Sender<bool>,
    },
    /// Stop the worker.
    Shutdown,
}

/// Owns the `StateController` on a dedicated thread.
pub struct ControllerWorker {
    command_tx: mpsc::Sender<ControllerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl ControllerWorker {
    pub fn spawn(config: StateControllerConfig, bridge: HmiBridgeRef) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<ControllerCommand>();

        let handle = thread::spawn(move || {
            let controller = StateController::new(config, bridge);
            serve_loop(controller, command_rx);
        });

        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    /// Enqueue a command (non-blocking).
    ///
    /// Returns an error if the worker thread has shut down.
    pub fn send(
        &self,
        command: ControllerCommand,
    ) -> Result<(), mpsc::SendError<ControllerCommand>> {
        self.command_tx.send(command)
    }

    /// Serialized `IsStateActive` query. False if the worker is gone.
    pub fn is_state_active(&self, state_id: StateId) -> bool {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self
            .command_tx
            .send(ControllerCommand::QueryStateActive {
                state_id,
                reply: reply_tx,
            })
            .is_err()
        {
            return false;
        }
        reply_rx.recv().unwrap_or(false)
    }
}

impl Drop for ControllerWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ControllerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_loop(mut controller: StateController, command_rx: mpsc::Receiver<ControllerCommand>) {
    tracing::debug!("state controller worker started");
    while let Ok(command) = command_rx.recv() {
        match command {
            ControllerCommand::SetRegularState {
                app_id,
                state,
                request_activation,
            } => controller.set_regular_state(app_id, state, request_activation),
            ControllerCommand::SetRegularLevel { app_id, level } => {
                controller.set_regular_level(app_id, level)
            }
            ControllerCommand::Event(event) => controller.on_event(event),
            ControllerCommand::RegisterApplication {
                app_id,
                hmi_app_id,
                device_handle,
                capabilities,
            } => controller.on_application_registered(app_id, hmi_app_id, device_handle, capabilities),
            ControllerCommand::UnregisterApplication { app_id } => {
                controller.on_app_unregistered(app_id)
            }
            ControllerCommand::SetResuming { app_id, resuming } => {
                controller.set_app_resuming(app_id, resuming)
            }
            ControllerCommand::QueryStateActive { state_id, reply } => {
                // Ignore a dropped caller; the queue keeps moving.
                let _ = reply.send(controller.is_state_active(state_id));
            }
            ControllerCommand::Shutdown => break,
        }
    }
    tracing::debug!("state controller worker stopped");
}
