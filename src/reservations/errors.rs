use thiserror::Error;

/// Failures of a single call to the reservation server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rejected by server: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl ApiError {
    /// Message supplied by the server, if the failure came with one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Whether the server answered at all (as opposed to a network failure).
    pub fn is_server_answer(&self) -> bool {
        matches!(
            self,
            ApiError::Rejected { .. } | ApiError::Status { .. } | ApiError::MalformedResponse { .. }
        )
    }
}
