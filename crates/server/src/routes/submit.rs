//! Submission endpoints (SPEC_FULL.md §4.7, §4.10, component C7).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use imagedesc_core::error::CoreError;
use imagedesc_core::models::{SubmissionPublic, SubmitRequest, SubmitResponse};
use imagedesc_core::services::submission;

use crate::error_response::AppResult;
use crate::net::{client_ip, user_agent};
use crate::state::AppState;

pub async fn submit(
    State(core): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let ip = client_ip(&headers, addr);
    let ua = user_agent(&headers);
    let response = submission::submit(&core, req, &ip, ua).await?;
    Ok(Json(response))
}

pub async fn get_submission(
    State(core): State<AppState>,
    Path(submission_id): Path<i64>,
) -> AppResult<Json<SubmissionPublic>> {
    let row = core
        .store()
        .get_submission_public(submission_id)
        .await?
        .ok_or(CoreError::NotFound("submission"))?;

    Ok(Json(SubmissionPublic {
        submission_id: row.id,
        survey_index: row.survey_index,
        word_count: row.word_count,
        rating: row.rating,
        attention_passed: row.attention_passed,
        created_at: row.created_at,
    }))
}
