//! Health and security-info endpoints (SPEC_FULL.md §4.10).

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error_response::{AppError, AppResult};
use crate::state::AppState;

pub async fn health(State(core): State<AppState>) -> AppResult<Json<Value>> {
    core.store().ping().await.map_err(AppError::from)?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn security_info(State(core): State<AppState>) -> Json<Value> {
    Json(json!({
        "cors_origins": core.config().cors_origins,
        "max_body_bytes": core.config().max_body_bytes,
        "payment_required": core.config().payment_required,
    }))
}
