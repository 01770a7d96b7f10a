//! The single place a [`CoreError`] becomes an HTTP status code and body
//! (SPEC_FULL.md §4.12, §7). No handler constructs a raw `StatusCode`.
//!
//! Every 5xx branch logs here with the error detail this crate actually has;
//! the correlation id attached to that event (and to the matching
//! `X-Correlation-Id` header) comes from the enclosing `http_request` span,
//! minted in `middleware::correlation` — this module has no request access
//! of its own to attribute one.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagedesc_core::error::CoreError;
use serde_json::json;
use tracing::error;

pub struct AppError(pub CoreError);

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match &self.0 {
            CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            CoreError::ConsentRequired => (StatusCode::FORBIDDEN, "consent required".to_string(), None),
            CoreError::PaymentRequired => (StatusCode::PAYMENT_REQUIRED, "payment required".to_string(), None),
            CoreError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            CoreError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string(), None),
            CoreError::UnsupportedMediaType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported media type".to_string(), None)
            }
            CoreError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded".to_string(),
                Some(*retry_after_secs),
            ),
            CoreError::Internal { source } => {
                error!(error = %source, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string(), None)
            }
            CoreError::ServiceUnavailable => {
                error!("service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "service unavailable".to_string(), Some(1))
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
