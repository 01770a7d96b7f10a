//! Reward endpoints (SPEC_FULL.md §4.8, §4.10, component C8).

use axum::extract::{Path, State};
use axum::Json;
use imagedesc_core::models::{RewardSelectResponse, RewardStateResponse};
use imagedesc_core::services::reward;

use crate::error_response::AppResult;
use crate::state::AppState;

pub async fn get_state(
    State(core): State<AppState>,
    Path(participant_id): Path<String>,
) -> AppResult<Json<RewardStateResponse>> {
    let response = reward::get_state(&core, &participant_id).await?;
    Ok(Json(response))
}

pub async fn select(
    State(core): State<AppState>,
    Path(participant_id): Path<String>,
) -> AppResult<Json<RewardSelectResponse>> {
    let response = reward::select(&core, &participant_id).await?;
    Ok(Json(response))
}
