//! Per-request correlation id (SPEC_FULL.md §4.9, §4.13): minted once,
//! threaded through the tracing span, and echoed in `X-Correlation-Id`.
//!
//! This is the only place in the tree that holds both the real id and the
//! final response status, so it's also where the "every 5xx has a matching
//! `error!` event carrying the same id" guarantee is enforced — handler-level
//! error logging (`error_response::AppError`) has the failure detail but not
//! the request-scoped id, so it can't make that guarantee on its own.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use imagedesc_core::identity::new_id;
use tracing::Instrument;

#[derive(Clone)]
pub struct CorrelationId(pub String);

pub async fn correlation_id_mw(mut req: Request, next: Next) -> Response {
    let correlation_id = new_id();
    req.extensions_mut().insert(CorrelationId(correlation_id.clone()));

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = tracing::info_span!("http_request", correlation_id = %correlation_id, %method, %path);

    let mut response = next.run(req).instrument(span).await;

    if response.status().is_server_error() {
        tracing::error!(correlation_id = %correlation_id, status = %response.status(), "request failed with server error");
    }

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}
