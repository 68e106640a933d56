use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::ServerConfig;
use crate::reservations::errors::ApiError;
use crate::reservations::types::{
    ClientRecord, ReservationId, ServeOutcome, ServeResponse, VerifyRequest, VerifyResponse,
};
use crate::workflow::types::ScanCode;

/// The two remote operations the scan workflow depends on.
///
/// Implementations perform exactly one request per call: no retries and no
/// timeout policy beyond what the implementation is configured with.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// Check a scanned code against the server and fetch the reservation it belongs to.
    async fn verify(&self, code: &ScanCode) -> Result<ClientRecord, ApiError>;

    /// Mark a reservation as served.
    async fn serve(&self, reservation_id: ReservationId) -> Result<ServeOutcome, ApiError>;
}

/// `ReservationApi` over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpReservationClient {
    http: reqwest::Client,
    verify_url: String,
    serve_url: String,
}

impl HttpReservationClient {
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("reservation-scanner/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            http: builder.build()?,
            verify_url: join_url(&config.base_url, &config.verify_path),
            serve_url: join_url(&config.base_url, &config.serve_path),
        })
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    pub fn serve_url(&self, reservation_id: ReservationId) -> String {
        format!("{}/{}", self.serve_url, reservation_id)
    }

    /// Decode a response envelope. The server answers some failures with a
    /// non-2xx status but a regular envelope, so the body wins over the status.
    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<T>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(ApiError::MalformedResponse {
                reason: e.to_string(),
            }),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl ReservationApi for HttpReservationClient {
    async fn verify(&self, code: &ScanCode) -> Result<ClientRecord, ApiError> {
        debug!(url = %self.verify_url, "Sending verify request");

        let response = self
            .http
            .post(&self.verify_url)
            .json(&VerifyRequest {
                qr_data: code.as_str(),
            })
            .send()
            .await?;

        Self::read_envelope::<VerifyResponse>(response)
            .await?
            .into_record()
    }

    async fn serve(&self, reservation_id: ReservationId) -> Result<ServeOutcome, ApiError> {
        let url = self.serve_url(reservation_id);
        debug!(url = %url, "Sending serve request");

        let response = self.http.post(&url).send().await?;

        Self::read_envelope::<ServeResponse>(response)
            .await?
            .into_outcome(reservation_id)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
