//! Reservation server mocking tests
//!
//! These tests use wiremock to stand in for the reservation server, covering
//! the HTTP client on its own and the full scan workflow on top of it.

use reservation_scanner::config::ServerConfig;
use reservation_scanner::reservations::{ApiError, HttpReservationClient, ReservationApi};
use reservation_scanner::workflow::{
    ErrorKind, Notification, ScanCode, ScanOutcome, ScanWorkflow, StateKind, WorkflowError,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VERIFY_PATH: &str = "/reservation-public/scanner/verify";
const SERVE_PATH: &str = "/reservation-public/scanner/serve";

/// Reservation server mock for deterministic testing
pub struct ReservationServerMock {
    pub server: MockServer,
}

impl ReservationServerMock {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn client(&self) -> HttpReservationClient {
        HttpReservationClient::new(&ServerConfig {
            base_url: self.server.uri(),
            ..ServerConfig::default()
        })
        .unwrap()
    }

    /// Mock a verify call for `qr_data` answered with `body` and `status`
    pub async fn mock_verify(&self, qr_data: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({ "qr_data": qr_data })))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_verify_raw(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mock the serve call of one reservation
    pub async fn mock_serve(&self, reservation_id: u64, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(format!("{SERVE_PATH}/{reservation_id}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

fn verified_body() -> serde_json::Value {
    json!({
        "success": true,
        "message": "QR Code valide.",
        "reservation_id": 7,
        "status": "confirmée",
        "client": {"nom": "Ana", "email": "ana@example.com", "tel": "+221 77 000 00 00"},
        "items": [
            {"plat": "Yassa poulet", "quantite": 2, "prix": "3500.00"},
            {"plat": "Bissap", "quantite": 1, "prix": 500}
        ],
        "total": "7500.00"
    })
}

#[tokio::test]
async fn test_verify_sends_payload_and_parses_record() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify("7_1700000000.123", 200, verified_body()).await;

    let code = ScanCode::new("7_1700000000.123").unwrap();
    let record = mock.client().verify(&code).await.unwrap();

    assert_eq!(record.reservation_id, 7);
    assert_eq!(record.client.name, "Ana");
    assert_eq!(record.client.phone.as_deref(), Some("+221 77 000 00 00"));
    assert_eq!(record.status.as_deref(), Some("confirmée"));
    assert_eq!(record.items.len(), 2);
    assert_eq!(record.items[0].line_total(), 7000.0);
    assert_eq!(record.total, 7500.0);
}

#[tokio::test]
async fn test_verify_rejection_with_error_status_keeps_message() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify(
        "999_1",
        404,
        json!({"success": false, "message": "Réservation introuvable."}),
    )
    .await;

    let err = mock
        .client()
        .verify(&ScanCode::new("999_1").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.server_message(), Some("Réservation introuvable."));
}

#[tokio::test]
async fn test_verify_server_error_without_envelope() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify_raw(500, "Internal Server Error").await;

    let err = mock
        .client()
        .verify(&ScanCode::new("QR123").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500 }));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_verify_garbage_success_body_is_malformed() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify_raw(200, "<html>ok</html>").await;

    let err = mock
        .client()
        .verify(&ScanCode::new("QR123").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_serve_posts_to_reservation_path() {
    let mock = ReservationServerMock::new().await;
    mock.mock_serve(
        7,
        200,
        json!({"success": true, "message": "Client servi avec succès."}),
    )
    .await;

    let outcome = mock.client().serve(7).await.unwrap();

    assert_eq!(outcome.reservation_id, 7);
    assert_eq!(outcome.message.as_deref(), Some("Client servi avec succès."));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let client = HttpReservationClient::new(&ServerConfig {
        // Port 9 (discard) is not listening in test environments
        base_url: "http://127.0.0.1:9".to_string(),
        ..ServerConfig::default()
    })
    .unwrap();

    let err = client.serve(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_full_workflow_verify_then_serve() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify("QR123", 200, verified_body()).await;
    mock.mock_serve(
        7,
        200,
        json!({"success": true, "message": "Client servi avec succès."}),
    )
    .await;

    let mut workflow = ScanWorkflow::new(mock.client());
    let mut notifications = workflow.subscribe();

    let outcome = workflow.on_code_decoded("QR123").await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Verified(ref record) if record.reservation_id == 7));
    assert_eq!(workflow.state().kind(), StateKind::ReviewingClient);

    // Second scan while reviewing never reaches the server (verify expects 1 call)
    assert_eq!(
        workflow.on_code_decoded("QR123").await.unwrap(),
        ScanOutcome::Ignored
    );

    let message = workflow.serve().await.unwrap();
    assert_eq!(message, "Client servi avec succès.");
    assert_eq!(workflow.state().kind(), StateKind::Scanning);
    assert!(workflow.record().is_none());

    assert!(matches!(
        notifications.recv().await.unwrap(),
        Notification::ClientArrived { .. }
    ));
    assert_eq!(
        notifications.recv().await.unwrap(),
        Notification::Served {
            reservation_id: 7,
            message: "Client servi avec succès.".to_string(),
        }
    );

    let stats = workflow.metrics().stats();
    assert_eq!(stats.scans_accepted, 1);
    assert_eq!(stats.scans_ignored, 1);
    assert_eq!(stats.serves_succeeded, 1);
}

#[tokio::test]
async fn test_full_workflow_already_used_ticket() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify(
        "QR123",
        400,
        json!({"success": false, "message": "Ce ticket a déjà été utilisé."}),
    )
    .await;

    let mut workflow = ScanWorkflow::new(mock.client());
    let mut notifications = workflow.subscribe();

    let err = workflow.on_code_decoded("QR123").await.unwrap_err();
    assert_eq!(
        err,
        WorkflowError::VerificationFailed {
            message: "Ce ticket a déjà été utilisé.".to_string()
        }
    );
    assert_eq!(workflow.state().kind(), StateKind::Scanning);
    assert_eq!(
        notifications.recv().await.unwrap(),
        Notification::Error {
            kind: ErrorKind::VerificationFailed,
            message: "Ce ticket a déjà été utilisé.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_full_workflow_serve_failure_keeps_client_for_retry() {
    let mock = ReservationServerMock::new().await;
    mock.mock_verify("QR123", 200, verified_body()).await;
    mock.mock_serve(7, 500, json!({})).await;

    let mut workflow = ScanWorkflow::new(mock.client());
    workflow.on_code_decoded("QR123").await.unwrap();

    let err = workflow.serve().await.unwrap_err();
    assert_eq!(err.message(), "Unable to mark the reservation as served.");
    assert_eq!(workflow.state().kind(), StateKind::ReviewingClient);
    assert_eq!(workflow.record().map(|r| r.reservation_id), Some(7));
}
