use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("Plausible API key not configured")]
    Configuration,
    #[error("invalid request body")]
    Validation,
    #[error("upstream returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("failed to reach upstream: {0}")]
    Network(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ProxyError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
            }
            ProxyError::Configuration => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Plausible API key not configured",
                None,
            ),
            ProxyError::Validation => (StatusCode::BAD_REQUEST, "Invalid request body", None),
            ProxyError::Upstream { status, body } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "Plausible API error",
                Some(body),
            ),
            ProxyError::Network(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch data from Plausible",
                Some(message),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                details,
            }),
        )
            .into_response()
    }
}
