use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mw_core::transport::TransportError;
use serde_json::json;
use thiserror::Error;

/// Errors of the relay HTTP surface and its client.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Request is missing a required field or carries an empty one.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Hub refused the payload.
    #[error("failed to trigger event: {0}")]
    FanOut(#[from] TransportError),

    /// Prometheus text encoding failed.
    #[error("metrics encoding failed: {0}")]
    Metrics(String),

    /// Relay base url could not be parsed or cannot carry path segments.
    #[error("invalid relay endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    /// Client construction failed.
    #[error("http client: {0}")]
    Client(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) | RelayError::Endpoint { .. } => StatusCode::BAD_REQUEST,
            RelayError::FanOut(_)
            | RelayError::Metrics(_)
            | RelayError::Client(_)
            | RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
