//! Route table & middleware assembly (SPEC_FULL.md §4.10, component C10).

mod consent;
mod health;
mod images;
mod participants;
mod reward;
mod submit;

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{audit_metric, content_type, correlation, rate_limit, security_headers};
use crate::state::AppState;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

pub fn build_router(core: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/security/info", get(health::security_info))
        .route("/api/participants", post(participants::register))
        .route("/api/participants/:id", get(participants::get_public))
        .route("/api/consent", post(consent::record))
        .route("/api/consent/:id", get(consent::get_state))
        .route("/api/images/random", get(images::random))
        .route("/api/images/:image_id", get(images::get_by_id))
        .route("/api/submit", post(submit::submit))
        .route("/api/submissions/:id", get(submit::get_submission))
        .route("/api/reward/:id", get(reward::get_state))
        .route("/api/reward/select/:id", post(reward::select))
        .layer(middleware::from_fn(security_headers::security_headers_mw))
        .layer(middleware::from_fn(content_type::content_type_mw))
        .layer(middleware::from_fn_with_state(core.clone(), rate_limit::rate_limit_mw))
        .layer(middleware::from_fn_with_state(core.clone(), audit_metric::audit_metric_mw))
        .layer(middleware::from_fn(correlation::correlation_id_mw))
        .layer(cors_layer(&core))
        .layer(TraceLayer::new_for_http())
        .with_state(core)
}

fn cors_layer(core: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .max_age(PREFLIGHT_MAX_AGE);

    if core.config().allow_any_origin() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            core.config().cors_origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
        layer.allow_origin(origins)
    }
}
