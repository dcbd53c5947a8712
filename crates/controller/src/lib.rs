//! The CarLink HMI state controller.
//!
//! Decides, for every registered mobile application, what its visible and
//! audible role on the head unit currently is: applications request Regular
//! states, system interruptions layer temporary projections over them, and
//! cross-application exclusivity (one visual foreground, one audible stream
//! per audio class) is enforced by the conflict resolver.

mod controller;
mod error;
mod pending;
mod resolver;
mod worker;

pub use controller::{StateController, StateControllerConfig};
pub use error::{ControllerError, ControllerResult};
pub use pending::{PendingActivation, PendingActivations};
pub use resolver::{resolve_conflicts, Demotion};
pub use worker::{ControllerCommand, ControllerWorker};
