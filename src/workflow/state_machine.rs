use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::workflow::errors::TransitionError;
use crate::workflow::types::{
    Effect, ErrorKind, Notification, ScanCode, StateKind, WorkflowEvent, WorkflowState,
};

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The state changed; the driver must perform `effects` in order
    Transitioned { effects: Vec<Effect> },
    /// The event was a no-op (duplicate or empty decode)
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: StateKind,
    pub to: StateKind,
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Pure scan/verify/serve state machine. Performs no I/O: remote calls and
/// notifications come back as `Effect`s for the driver to execute.
#[derive(Debug)]
pub struct ScanStateMachine {
    state: WorkflowState,
    history: Vec<TransitionRecord>,
    ignored_decodes: u64,
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStateMachine {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Scanning,
            history: Vec::new(),
            ignored_decodes: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn ignored_decodes(&self) -> u64 {
        self.ignored_decodes
    }

    /// Main transition logic. On `Err` the state is left untouched.
    pub fn handle(&mut self, event: WorkflowEvent) -> Result<Outcome, TransitionError> {
        let event_name = event.name();
        let current = std::mem::replace(&mut self.state, WorkflowState::Scanning);
        let from = current.kind();

        let (next, effects) = match (current, event) {
            (WorkflowState::Scanning, WorkflowEvent::CodeDecoded { payload }) => {
                match ScanCode::new(payload) {
                    Some(code) => (
                        WorkflowState::AwaitingVerification { code: code.clone() },
                        vec![Effect::Verify(code)],
                    ),
                    None => return Ok(self.ignore(WorkflowState::Scanning)),
                }
            }

            // Duplicate-scan suppression: decodes only count while scanning
            (current, WorkflowEvent::CodeDecoded { .. }) => return Ok(self.ignore(current)),

            (
                WorkflowState::AwaitingVerification { .. },
                WorkflowEvent::VerificationSucceeded { record },
            ) => (
                WorkflowState::ReviewingClient {
                    record: record.clone(),
                },
                vec![Effect::Notify(Notification::ClientArrived { record })],
            ),

            (
                WorkflowState::AwaitingVerification { .. },
                WorkflowEvent::VerificationFailed { message },
            ) => (
                WorkflowState::Scanning,
                vec![Effect::Notify(Notification::Error {
                    kind: ErrorKind::VerificationFailed,
                    message,
                })],
            ),

            (WorkflowState::ReviewingClient { record }, WorkflowEvent::ServeRequested) => {
                let reservation_id = record.reservation_id;
                (
                    WorkflowState::AwaitingServeConfirmation { record },
                    vec![Effect::Serve(reservation_id)],
                )
            }

            (
                WorkflowState::AwaitingServeConfirmation { record },
                WorkflowEvent::ServeSucceeded { message },
            ) => (
                WorkflowState::Scanning,
                vec![Effect::Notify(Notification::Served {
                    reservation_id: record.reservation_id,
                    message,
                })],
            ),

            (
                WorkflowState::AwaitingServeConfirmation { record },
                WorkflowEvent::ServeFailed { message },
            ) => (
                WorkflowState::ReviewingClient { record },
                vec![Effect::Notify(Notification::Error {
                    kind: ErrorKind::ServeFailed,
                    message,
                })],
            ),

            (WorkflowState::ReviewingClient { record }, WorkflowEvent::Dismissed) => (
                WorkflowState::Scanning,
                vec![Effect::Notify(Notification::Dismissed {
                    reservation_id: record.reservation_id,
                })],
            ),

            (current, _) => {
                let state = current.kind();
                self.state = current;
                return Err(TransitionError::InvalidTransition {
                    event: event_name,
                    state,
                });
            }
        };

        self.record_transition(from, next.kind(), event_name);
        self.state = next;
        Ok(Outcome::Transitioned { effects })
    }

    fn ignore(&mut self, current: WorkflowState) -> Outcome {
        debug!(state = %current.kind(), "Ignoring decode event");
        self.state = current;
        self.ignored_decodes += 1;
        Outcome::Ignored
    }

    fn record_transition(&mut self, from: StateKind, to: StateKind, event: &'static str) {
        let record = TransitionRecord {
            from,
            to,
            event,
            timestamp: Utc::now(),
        };

        info!(
            from_state = %record.from,
            to_state = %record.to,
            event = record.event,
            "Scan workflow state transition"
        );

        self.history.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::types::{ClientInfo, ClientRecord};

    fn record(reservation_id: u64) -> ClientRecord {
        ClientRecord {
            reservation_id,
            client: ClientInfo {
                name: "Ana".to_string(),
                email: None,
                phone: None,
            },
            status: None,
            items: vec![],
            total: 0.0,
        }
    }

    fn decoded(payload: &str) -> WorkflowEvent {
        WorkflowEvent::CodeDecoded {
            payload: payload.to_string(),
        }
    }

    fn reviewing(reservation_id: u64) -> ScanStateMachine {
        let mut sm = ScanStateMachine::new();
        sm.handle(decoded("QR123")).unwrap();
        sm.handle(WorkflowEvent::VerificationSucceeded {
            record: record(reservation_id),
        })
        .unwrap();
        sm
    }

    #[test]
    fn test_decode_while_scanning_requests_verification() {
        let mut sm = ScanStateMachine::new();

        let outcome = sm.handle(decoded("QR123")).unwrap();

        assert_eq!(
            outcome,
            Outcome::Transitioned {
                effects: vec![Effect::Verify(ScanCode::new("QR123").unwrap())]
            }
        );
        assert_eq!(sm.state().kind(), StateKind::AwaitingVerification);
    }

    #[test]
    fn test_empty_decode_is_ignored() {
        let mut sm = ScanStateMachine::new();

        assert_eq!(sm.handle(decoded("")).unwrap(), Outcome::Ignored);
        assert!(sm.state().is_scanning());
        assert!(sm.history().is_empty());
        assert_eq!(sm.ignored_decodes(), 1);
    }

    #[test]
    fn test_decode_ignored_outside_scanning() {
        let mut sm = ScanStateMachine::new();
        sm.handle(decoded("QR123")).unwrap();
        assert_eq!(sm.handle(decoded("QR999")).unwrap(), Outcome::Ignored);
        assert_eq!(
            sm.state(),
            &WorkflowState::AwaitingVerification {
                code: ScanCode::new("QR123").unwrap()
            }
        );

        let mut sm = reviewing(7);
        assert_eq!(sm.handle(decoded("QR999")).unwrap(), Outcome::Ignored);
        assert_eq!(sm.state().record().unwrap().reservation_id, 7);

        sm.handle(WorkflowEvent::ServeRequested).unwrap();
        assert_eq!(sm.handle(decoded("QR999")).unwrap(), Outcome::Ignored);
        assert_eq!(sm.state().kind(), StateKind::AwaitingServeConfirmation);
        assert_eq!(sm.ignored_decodes(), 2);
    }

    #[test]
    fn test_verification_success_stores_record_and_notifies() {
        let mut sm = ScanStateMachine::new();
        sm.handle(decoded("QR123")).unwrap();

        let outcome = sm
            .handle(WorkflowEvent::VerificationSucceeded { record: record(7) })
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Transitioned {
                effects: vec![Effect::Notify(Notification::ClientArrived { record: record(7) })]
            }
        );
        assert_eq!(
            sm.state(),
            &WorkflowState::ReviewingClient { record: record(7) }
        );
    }

    #[test]
    fn test_verification_failure_returns_to_scanning() {
        let mut sm = ScanStateMachine::new();
        sm.handle(decoded("QR123")).unwrap();

        let outcome = sm
            .handle(WorkflowEvent::VerificationFailed {
                message: "invalid".to_string(),
            })
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Transitioned {
                effects: vec![Effect::Notify(Notification::Error {
                    kind: ErrorKind::VerificationFailed,
                    message: "invalid".to_string()
                })]
            }
        );
        assert!(sm.state().is_scanning());
        assert!(sm.state().record().is_none());
    }

    #[test]
    fn test_serve_cycle() {
        let mut sm = reviewing(7);

        let outcome = sm.handle(WorkflowEvent::ServeRequested).unwrap();
        assert_eq!(
            outcome,
            Outcome::Transitioned {
                effects: vec![Effect::Serve(7)]
            }
        );
        assert_eq!(sm.state().kind(), StateKind::AwaitingServeConfirmation);

        sm.handle(WorkflowEvent::ServeSucceeded {
            message: "Client servi avec succès.".to_string(),
        })
        .unwrap();
        assert!(sm.state().is_scanning());
        assert!(sm.state().record().is_none());
    }

    #[test]
    fn test_serve_failure_keeps_record_for_retry() {
        let mut sm = reviewing(7);
        sm.handle(WorkflowEvent::ServeRequested).unwrap();

        sm.handle(WorkflowEvent::ServeFailed {
            message: "Ce client a déjà été servi.".to_string(),
        })
        .unwrap();

        assert_eq!(
            sm.state(),
            &WorkflowState::ReviewingClient { record: record(7) }
        );
        // Retry is allowed straight away
        assert!(sm.handle(WorkflowEvent::ServeRequested).is_ok());
    }

    #[test]
    fn test_serve_outside_reviewing_is_rejected_without_state_change() {
        let mut sm = ScanStateMachine::new();
        assert_eq!(
            sm.handle(WorkflowEvent::ServeRequested),
            Err(TransitionError::InvalidTransition {
                event: "serve_requested",
                state: StateKind::Scanning
            })
        );
        assert!(sm.state().is_scanning());

        let mut sm = reviewing(7);
        sm.handle(WorkflowEvent::ServeRequested).unwrap();
        // A second serve while one is in flight
        assert!(sm.handle(WorkflowEvent::ServeRequested).is_err());
        assert_eq!(sm.state().kind(), StateKind::AwaitingServeConfirmation);
    }

    #[test]
    fn test_results_without_request_in_flight_are_rejected() {
        let mut sm = ScanStateMachine::new();
        assert!(sm
            .handle(WorkflowEvent::VerificationSucceeded { record: record(1) })
            .is_err());
        assert!(sm
            .handle(WorkflowEvent::ServeSucceeded {
                message: String::new()
            })
            .is_err());
        assert!(sm.state().is_scanning());
        assert!(sm.history().is_empty());
    }

    #[test]
    fn test_dismiss_clears_record() {
        let mut sm = reviewing(7);

        let outcome = sm.handle(WorkflowEvent::Dismissed).unwrap();

        assert_eq!(
            outcome,
            Outcome::Transitioned {
                effects: vec![Effect::Notify(Notification::Dismissed { reservation_id: 7 })]
            }
        );
        assert!(sm.state().is_scanning());
        assert!(sm.handle(WorkflowEvent::Dismissed).is_err());
    }

    #[test]
    fn test_history_records_accepted_transitions_in_order() {
        let mut sm = reviewing(7);
        sm.handle(decoded("ignored")).unwrap();
        sm.handle(WorkflowEvent::ServeRequested).unwrap();
        sm.handle(WorkflowEvent::ServeSucceeded {
            message: "ok".to_string(),
        })
        .unwrap();

        let steps: Vec<(StateKind, StateKind, &str)> = sm
            .history()
            .iter()
            .map(|r| (r.from, r.to, r.event))
            .collect();

        assert_eq!(
            steps,
            vec![
                (StateKind::Scanning, StateKind::AwaitingVerification, "code_decoded"),
                (
                    StateKind::AwaitingVerification,
                    StateKind::ReviewingClient,
                    "verification_succeeded"
                ),
                (
                    StateKind::ReviewingClient,
                    StateKind::AwaitingServeConfirmation,
                    "serve_requested"
                ),
                (
                    StateKind::AwaitingServeConfirmation,
                    StateKind::Scanning,
                    "serve_succeeded"
                ),
            ]
        );
    }
}
