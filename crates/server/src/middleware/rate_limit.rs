//! Per-endpoint quota enforcement (SPEC_FULL.md §4.3, component C3).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use imagedesc_core::error::CoreError;
use imagedesc_core::identity::hash_ip;
use imagedesc_core::models::AuditEvent;
use imagedesc_core::ratelimit::LimitedEndpoint;

use crate::error_response::AppError;
use crate::state::AppState;

const UNLIMITED_PATH: &str = "/api/health";

pub async fn rate_limit_mw(
    State(core): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if path == UNLIMITED_PATH {
        return next.run(req).await;
    }

    let endpoint = classify(req.method(), &path);
    let client_ip = extract_client_ip(req.headers(), addr);
    let client_key = hash_ip(&client_ip, &core.config().ip_hash_salt);
    let decision = core.rate_limiter().check(&client_key, endpoint);

    if !decision.allowed {
        let store = core.store().clone();
        let method = req.method().to_string();
        let ip_hash = client_key.clone();
        tokio::spawn(async move {
            store
                .append_audit(&AuditEvent {
                    event_type: "rate_limit_exceeded".to_string(),
                    participant_fk: None,
                    endpoint: path,
                    method,
                    status_code: 429,
                    ip_hash,
                    user_agent: String::new(),
                    details: None,
                })
                .await;
        });
        return AppError(CoreError::RateLimited { retry_after_secs: decision.retry_after_secs }).into_response();
    }

    next.run(req).await
}

fn classify(method: &Method, path: &str) -> LimitedEndpoint {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (&Method::POST, ["api", "participants"]) => LimitedEndpoint::CreateParticipant,
        (&Method::POST, ["api", "consent"]) => LimitedEndpoint::Consent,
        (&Method::POST, ["api", "submit"]) => LimitedEndpoint::Submit,
        (&Method::GET, ["api", "images", "random"]) => LimitedEndpoint::RandomImage,
        (&Method::GET, ["api", "images", _]) => LimitedEndpoint::ImageById,
        (&Method::POST, ["api", "reward", "select", _]) => LimitedEndpoint::RewardSelect,
        _ => LimitedEndpoint::Default,
    }
}

fn extract_client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| addr.ip().to_string())
}
