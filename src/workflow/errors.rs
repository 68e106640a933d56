use thiserror::Error;

use crate::workflow::types::StateKind;

/// Raised by the state machine when an event is not allowed in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {event} not allowed while {state}")]
    InvalidTransition { event: &'static str, state: StateKind },
}

/// Errors surfaced to callers of the scan workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Bad code, server rejection or transport error during verify.
    /// The workflow is back to scanning.
    #[error("{message}")]
    VerificationFailed { message: String },

    /// Server rejection or transport error during serve.
    /// The client record is kept so the operator can retry.
    #[error("{message}")]
    ServeFailed { message: String },

    #[error("Cannot {operation} while {state}")]
    Precondition {
        operation: &'static str,
        state: StateKind,
    },
}

impl WorkflowError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { event, state } => WorkflowError::Precondition {
                operation: match event {
                    "serve_requested" => "serve",
                    "dismissed" => "dismiss",
                    other => other,
                },
                state,
            },
        }
    }
}
