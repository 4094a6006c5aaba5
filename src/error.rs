//! The bridge's client-facing error contract: `{message, statusCode}` JSON on
//! every non-2xx response (spec §7). Shaped after the teacher's
//! `http/response.rs` helpers (`bad_request`, `internal_error`, ...), but the
//! envelope itself follows the wire contract this spec actually defines
//! rather than the teacher's `{code, message, details}` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_protocol::HttpErrorEnvelope;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = HttpErrorEnvelope {
            message: self.to_string(),
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::BadRequest(message.into())
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    ApiError::Internal(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn bad_request_serializes_spec_error_contract() {
        let response = bad_request("missing to").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: HttpErrorEnvelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.message, "missing to");
        assert_eq!(parsed.status_code, 400);
    }

    #[tokio::test]
    async fn internal_error_sets_500() {
        let response = internal_error("store unavailable").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
