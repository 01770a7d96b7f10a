//! Per-request performance metric logging (SPEC_FULL.md §4.9, component C9).
//! Audit rows for specific business events are written at their call sites
//! (participant/consent/submission triggers in the database, rate-limit and
//! reward events in their respective handlers); this middleware only covers
//! the metric half that applies uniformly to every request.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use imagedesc_core::models::PerformanceMetric;

use crate::state::AppState;

pub async fn audit_metric_mw(State(core): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = req.uri().path().to_string();
    let request_size = content_length(req.headers());

    let response = next.run(req).await;

    let metric = PerformanceMetric {
        endpoint,
        response_time_ms: start.elapsed().as_millis() as i64,
        status_code: response.status().as_u16(),
        request_size,
        response_size: content_length(response.headers()),
    };
    let store = core.store().clone();
    tokio::spawn(async move { store.append_metric(&metric).await });

    response
}

fn content_length(headers: &HeaderMap) -> i64 {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
