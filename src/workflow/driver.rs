use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Instrument};

use crate::observability::{OperationTimer, WorkflowMetrics};
use crate::reservations::{ApiError, ClientRecord, ReservationApi};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::errors::{TransitionError, WorkflowError};
use crate::workflow::state_machine::{Outcome, ScanStateMachine, TransitionRecord};
use crate::workflow::types::{Effect, ErrorKind, Notification, WorkflowEvent, WorkflowState};

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 16;

pub const VERIFY_FAILED_MESSAGE: &str = "Unable to verify the scanned code.";
pub const SERVE_FAILED_MESSAGE: &str = "Unable to mark the reservation as served.";
pub const SERVED_MESSAGE: &str = "Client served.";

/// What a decode event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Not scanning, or empty payload: nothing happened
    Ignored,
    /// The code was verified and the client is now under review
    Verified(ClientRecord),
}

/// Drives a `ScanStateMachine` against an injected `ReservationApi`.
///
/// Every operation takes `&mut self` for the whole remote call, so a single
/// instance never has two requests in flight.
pub struct ScanWorkflow<A: ReservationApi> {
    api: A,
    machine: ScanStateMachine,
    notifications: broadcast::Sender<Notification>,
    metrics: Arc<WorkflowMetrics>,
    correlation_id: String,
}

impl<A: ReservationApi> std::fmt::Debug for ScanWorkflow<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanWorkflow")
            .field("state", self.machine.state())
            .field("correlation_id", &self.correlation_id)
            .field("subscribers", &self.notifications.receiver_count())
            .finish()
    }
}

impl<A: ReservationApi> ScanWorkflow<A> {
    pub fn new(api: A) -> Self {
        Self::with_capacity(api, DEFAULT_NOTIFICATION_CAPACITY)
    }

    pub fn with_capacity(api: A, notification_capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(notification_capacity.max(1));
        Self {
            api,
            machine: ScanStateMachine::new(),
            notifications,
            metrics: Arc::new(WorkflowMetrics::new()),
            correlation_id: generate_correlation_id(),
        }
    }

    /// Subscribe to notifications emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn state(&self) -> &WorkflowState {
        self.machine.state()
    }

    pub fn record(&self) -> Option<&ClientRecord> {
        self.machine.state().record()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        self.machine.history()
    }

    pub fn metrics(&self) -> &Arc<WorkflowMetrics> {
        &self.metrics
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Feed a decoded payload. Verifies it when scanning, ignores it otherwise.
    ///
    /// Dropping the returned future before it completes abandons the request:
    /// the workflow goes back to scanning as if verification had failed.
    pub async fn on_code_decoded(&mut self, payload: &str) -> Result<ScanOutcome, WorkflowError> {
        let outcome = self.machine.handle(WorkflowEvent::CodeDecoded {
            payload: payload.to_string(),
        })?;

        let effects = match outcome {
            Outcome::Ignored => {
                self.metrics.record_scan_ignored();
                return Ok(ScanOutcome::Ignored);
            }
            Outcome::Transitioned { effects } => effects,
        };
        self.metrics.record_scan_accepted();

        match self.run_effects(effects).await?.pop() {
            Some(Notification::ClientArrived { record }) => Ok(ScanOutcome::Verified(record)),
            Some(Notification::Error { message, .. }) => {
                Err(WorkflowError::VerificationFailed { message })
            }
            other => {
                error!(notification = ?other, "Verification ended without a verdict");
                Err(WorkflowError::VerificationFailed {
                    message: VERIFY_FAILED_MESSAGE.to_string(),
                })
            }
        }
    }

    /// Mark the reviewed client as served. Only valid while reviewing a client.
    /// Returns the success message on success.
    ///
    /// Dropping the returned future before it completes abandons the request:
    /// the client stays under review as if serving had failed.
    pub async fn serve(&mut self) -> Result<String, WorkflowError> {
        let effects = follow_up(self.machine.handle(WorkflowEvent::ServeRequested)?);

        match self.run_effects(effects).await?.pop() {
            Some(Notification::Served { message, .. }) => Ok(message),
            Some(Notification::Error { message, .. }) => Err(WorkflowError::ServeFailed { message }),
            other => {
                error!(notification = ?other, "Serve ended without a verdict");
                Err(WorkflowError::ServeFailed {
                    message: SERVE_FAILED_MESSAGE.to_string(),
                })
            }
        }
    }

    /// Discard the reviewed client without serving it.
    pub fn dismiss(&mut self) -> Result<(), WorkflowError> {
        if let Outcome::Transitioned { effects } = self.machine.handle(WorkflowEvent::Dismissed)? {
            for effect in effects {
                if let Effect::Notify(notification) = effect {
                    self.publish(notification);
                }
            }
        }
        Ok(())
    }

    /// Execute effects until the machine reaches a stable state. Returns the
    /// notifications published on the way, in order.
    async fn run_effects(&mut self, effects: Vec<Effect>) -> Result<Vec<Notification>, WorkflowError> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut published = Vec::new();

        while let Some(effect) = queue.pop_front() {
            let next_effects: Vec<Effect> = match effect {
                Effect::Verify(code) => {
                    let span = create_workflow_span("verify", &self.correlation_id);
                    let timer = OperationTimer::new("verify");
                    let guard = InFlight::new(
                        &mut self.machine,
                        &self.notifications,
                        WorkflowEvent::VerificationFailed {
                            message: VERIFY_FAILED_MESSAGE.to_string(),
                        },
                    );
                    let result = self.api.verify(&code).instrument(span).await;
                    timer.finish(result.is_ok());
                    self.metrics.record_verification(result.is_ok());

                    let event = match result {
                        Ok(record) => WorkflowEvent::VerificationSucceeded { record },
                        Err(err) => {
                            if err.is_server_answer() {
                                info!(code = %code, error = %err, "Code rejected by server");
                            } else {
                                warn!(code = %code, error = %err, "Verification failed");
                            }
                            WorkflowEvent::VerificationFailed {
                                message: surfaced_message(&err, ErrorKind::VerificationFailed),
                            }
                        }
                    };
                    follow_up(guard.settle(event)?)
                }
                Effect::Serve(reservation_id) => {
                    let span = create_workflow_span("serve", &self.correlation_id);
                    let timer = OperationTimer::new("serve");
                    let guard = InFlight::new(
                        &mut self.machine,
                        &self.notifications,
                        WorkflowEvent::ServeFailed {
                            message: SERVE_FAILED_MESSAGE.to_string(),
                        },
                    );
                    let result = self.api.serve(reservation_id).instrument(span).await;
                    timer.finish(result.is_ok());
                    self.metrics.record_serve(result.is_ok());

                    let event = match result {
                        Ok(outcome) => WorkflowEvent::ServeSucceeded {
                            message: outcome
                                .message
                                .filter(|m| !m.is_empty())
                                .unwrap_or_else(|| SERVED_MESSAGE.to_string()),
                        },
                        Err(err) => {
                            if err.is_server_answer() {
                                info!(reservation_id, error = %err, "Serve refused by server");
                            } else {
                                warn!(reservation_id, error = %err, "Serve failed");
                            }
                            WorkflowEvent::ServeFailed {
                                message: surfaced_message(&err, ErrorKind::ServeFailed),
                            }
                        }
                    };
                    follow_up(guard.settle(event)?)
                }
                Effect::Notify(notification) => {
                    self.publish(notification.clone());
                    published.push(notification);
                    Vec::new()
                }
            };

            queue.extend(next_effects);
        }

        Ok(published)
    }

    fn publish(&self, notification: Notification) {
        publish(&self.notifications, notification);
    }
}

fn publish(notifications: &broadcast::Sender<Notification>, notification: Notification) {
    // No subscribers is fine: notifications are fire-and-forget
    if notifications.send(notification).is_err() {
        debug!("Notification dropped, no subscribers");
    }
}

/// A remote call awaiting its result. If the call is dropped before
/// `settle`, the fallback event is fed to the machine so it never stays
/// stuck waiting for an answer that will not come.
struct InFlight<'a> {
    machine: &'a mut ScanStateMachine,
    notifications: &'a broadcast::Sender<Notification>,
    fallback: Option<WorkflowEvent>,
}

impl<'a> InFlight<'a> {
    fn new(
        machine: &'a mut ScanStateMachine,
        notifications: &'a broadcast::Sender<Notification>,
        fallback: WorkflowEvent,
    ) -> Self {
        Self {
            machine,
            notifications,
            fallback: Some(fallback),
        }
    }

    fn settle(mut self, event: WorkflowEvent) -> Result<Outcome, TransitionError> {
        self.fallback = None;
        self.machine.handle(event)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(fallback) = self.fallback.take() else {
            return;
        };
        if !self.machine.state().has_request_in_flight() {
            return;
        }

        warn!(
            state = %self.machine.state().kind(),
            event = fallback.name(),
            "Request abandoned before completion"
        );
        match self.machine.handle(fallback) {
            Ok(outcome) => {
                for effect in follow_up(outcome) {
                    if let Effect::Notify(notification) = effect {
                        publish(self.notifications, notification);
                    }
                }
            }
            Err(e) => error!(error = %e, "Could not settle abandoned request"),
        }
    }
}

fn follow_up(outcome: Outcome) -> Vec<Effect> {
    match outcome {
        Outcome::Transitioned { effects } => effects,
        Outcome::Ignored => Vec::new(),
    }
}

/// Server-supplied message when present, generic message otherwise.
fn surfaced_message(err: &ApiError, kind: ErrorKind) -> String {
    match err.server_message() {
        Some(message) => message.to_string(),
        None => match kind {
            ErrorKind::VerificationFailed => VERIFY_FAILED_MESSAGE.to_string(),
            ErrorKind::ServeFailed => SERVE_FAILED_MESSAGE.to_string(),
        },
    }
}
