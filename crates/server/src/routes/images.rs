//! Image catalog & static-asset endpoints (SPEC_FULL.md §4.6, §4.10, component C6).

use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagedesc_core::error::CoreError;
use imagedesc_core::models::RandomImageResponse;
use imagedesc_core::services::image;
use serde::Deserialize;

use crate::error_response::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RandomImageQuery {
    pub session_id: String,
}

pub async fn random(
    State(core): State<AppState>,
    Query(params): Query<RandomImageQuery>,
) -> AppResult<Json<RandomImageResponse>> {
    let response = image::random_image(&core, &params.session_id).await?;
    Ok(Json(response))
}

/// Streams the catalog's static bytes from `IMAGES_DIR`. The catalog row
/// existing is necessary but not sufficient — a missing file on disk also
/// yields 404 (§4.6 "Missing files yield 404 even if the catalog row exists").
pub async fn get_by_id(State(core): State<AppState>, Path(image_id): Path<String>) -> AppResult<Response> {
    let row = image::get_by_id(&core, &image_id).await?;
    let path = std::path::Path::new(&core.config().images_dir).join(&row.image_id);
    let bytes = tokio::fs::read(&path).await.map_err(|_| AppError::from(CoreError::NotFound("image file")))?;

    let mut response = (StatusCode::OK, bytes).into_response();
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(guess_content_type(&row.image_id)));
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=604800, immutable"));
    Ok(response)
}

fn guess_content_type(image_id: &str) -> &'static str {
    if image_id.ends_with(".svg") {
        "image/svg+xml"
    } else if image_id.ends_with(".png") {
        "image/png"
    } else if image_id.ends_with(".jpg") || image_id.ends_with(".jpeg") {
        "image/jpeg"
    } else if image_id.ends_with(".webp") {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}
