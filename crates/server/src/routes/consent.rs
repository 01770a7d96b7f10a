//! Consent endpoints (SPEC_FULL.md §4.5, §4.10, component C5).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use imagedesc_core::models::{ConsentRequest, ConsentResponse, ConsentStateResponse};
use imagedesc_core::services::participant;

use crate::error_response::AppResult;
use crate::net::{client_ip, user_agent};
use crate::state::AppState;

pub async fn record(
    State(core): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ConsentRequest>,
) -> AppResult<Json<ConsentResponse>> {
    let ip = client_ip(&headers, addr);
    let ua = user_agent(&headers);
    let response = participant::record_consent(&core, req, &ip, ua).await?;
    Ok(Json(response))
}

pub async fn get_state(
    State(core): State<AppState>,
    Path(participant_id): Path<String>,
) -> AppResult<Json<ConsentStateResponse>> {
    let response = participant::get_consent_state(&core, &participant_id).await?;
    Ok(Json(response))
}
