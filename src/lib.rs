// Reservation Scanner Library - scan, verify and serve reservation tickets
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod observability;
pub mod reservations;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use crate::config::{ObservabilityConfig, ScannerConfig, ServerConfig, WorkflowConfig};
pub use crate::observability::{OperationTimer, WorkflowMetrics, WorkflowStats};
pub use crate::reservations::{
    ApiError, ClientInfo, ClientRecord, HttpReservationClient, OrderItem, ReservationApi,
    ReservationId, ServeOutcome,
};
pub use crate::telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use crate::workflow::{
    Notification, ScanCode, ScanOutcome, ScanStateMachine, ScanWorkflow, StateKind,
    WorkflowError, WorkflowEvent, WorkflowState,
};
