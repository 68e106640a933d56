// Core types for the scan/verify/serve workflow

use serde::Serialize;
use std::fmt;

use crate::reservations::types::{ClientRecord, ReservationId};

/// Opaque payload decoded from a camera frame. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanCode(String);

impl ScanCode {
    /// Returns `None` for an empty payload; anything else is accepted as is.
    pub fn new(payload: impl Into<String>) -> Option<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            None
        } else {
            Some(Self(payload))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow states. Exactly one is active at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Camera is live, waiting for a code
    Scanning,
    /// A verify request for `code` is in flight
    AwaitingVerification { code: ScanCode },
    /// A verified client is displayed to the operator
    ReviewingClient { record: ClientRecord },
    /// A serve request for `record` is in flight
    AwaitingServeConfirmation { record: ClientRecord },
}

impl WorkflowState {
    pub fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Scanning => StateKind::Scanning,
            WorkflowState::AwaitingVerification { .. } => StateKind::AwaitingVerification,
            WorkflowState::ReviewingClient { .. } => StateKind::ReviewingClient,
            WorkflowState::AwaitingServeConfirmation { .. } => {
                StateKind::AwaitingServeConfirmation
            }
        }
    }

    /// The client record held by the state, if any.
    pub fn record(&self) -> Option<&ClientRecord> {
        match self {
            WorkflowState::ReviewingClient { record }
            | WorkflowState::AwaitingServeConfirmation { record } => Some(record),
            _ => None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, WorkflowState::Scanning)
    }

    pub fn has_request_in_flight(&self) -> bool {
        matches!(
            self,
            WorkflowState::AwaitingVerification { .. }
                | WorkflowState::AwaitingServeConfirmation { .. }
        )
    }
}

/// Data-free discriminant of `WorkflowState`, used in logs, errors and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateKind {
    Scanning,
    AwaitingVerification,
    ReviewingClient,
    AwaitingServeConfirmation,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Scanning => "scanning",
            StateKind::AwaitingVerification => "awaiting verification",
            StateKind::ReviewingClient => "reviewing client",
            StateKind::AwaitingServeConfirmation => "awaiting serve confirmation",
        };
        f.write_str(name)
    }
}

/// Events consumed by the state machine, delivered one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    CodeDecoded { payload: String },
    VerificationSucceeded { record: ClientRecord },
    VerificationFailed { message: String },
    ServeRequested,
    ServeSucceeded { message: String },
    ServeFailed { message: String },
    Dismissed,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::CodeDecoded { .. } => "code_decoded",
            WorkflowEvent::VerificationSucceeded { .. } => "verification_succeeded",
            WorkflowEvent::VerificationFailed { .. } => "verification_failed",
            WorkflowEvent::ServeRequested => "serve_requested",
            WorkflowEvent::ServeSucceeded { .. } => "serve_succeeded",
            WorkflowEvent::ServeFailed { .. } => "serve_failed",
            WorkflowEvent::Dismissed => "dismissed",
        }
    }
}

/// Which remote operation a surfaced error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    VerificationFailed,
    ServeFailed,
}

/// Side effects for UI layers (alert, vibration, toast). The workflow only
/// emits them; subscribers decide how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A code was verified; the client is now on screen
    ClientArrived { record: ClientRecord },
    /// The reservation was marked as served
    Served {
        reservation_id: ReservationId,
        message: String,
    },
    /// The operator discarded the displayed client
    Dismissed { reservation_id: ReservationId },
    Error { kind: ErrorKind, message: String },
}

/// Work the state machine asks its driver to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Verify(ScanCode),
    Serve(ReservationId),
    Notify(Notification),
}
