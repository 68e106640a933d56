// Scan workflow: scan a ticket, verify it, review the client, serve.
//
// `state_machine` is pure and synchronous; `driver` runs its effects against
// the reservation server and publishes notifications.

pub mod driver;
pub mod errors;
pub mod state_machine;
pub mod types;

pub use driver::{ScanOutcome, ScanWorkflow};
pub use errors::{TransitionError, WorkflowError};
pub use state_machine::{Outcome, ScanStateMachine, TransitionRecord};
pub use types::{
    Effect, ErrorKind, Notification, ScanCode, StateKind, WorkflowEvent, WorkflowState,
};
