//! Content-type enforcement for JSON routes (SPEC_FULL.md §4.10).

use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use imagedesc_core::error::CoreError;

use crate::error_response::AppError;

pub async fn content_type_mw(req: Request, next: Next) -> Response {
    if req.method() == Method::POST {
        let content_type =
            req.headers().get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
        if !content_type.starts_with("application/json") {
            return AppError::from(CoreError::UnsupportedMediaType).into_response();
        }
    }
    next.run(req).await
}
