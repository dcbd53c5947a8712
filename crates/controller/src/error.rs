//! Error types for state transition requests.
//!
//! The public entry points drop bad requests with a log line; these errors
//! exist so the internal apply path stays testable.

use thiserror::Error;

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Why a state transition request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The requested state carries an INVALID field or is not admissible for
    /// the application's capabilities.
    #[error("inadmissible state requested for application {app_id}")]
    InvalidState { app_id: u32 },

    /// The target application is not registered.
    #[error("application {app_id} is not registered")]
    UnknownApplication { app_id: u32 },
}
