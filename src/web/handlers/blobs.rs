//! Signed blob downloads.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response},
};
use chrono::Utc;
use std::sync::Arc;

use super::AppState;
use crate::web::dto::BlobQuery;
use crate::web::error::ApiError;
use crate::DriveError;

/// GET /blobs/*path?expires=&signature= - Serve a blob behind a signed locator.
///
/// A bad signature and a missing blob both render as not found; an expired locator
/// renders as gone.
pub async fn download_blob(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(query): Query<BlobQuery>,
) -> Result<Response<Body>, ApiError> {
    let path = path.trim_start_matches('/');
    let content = state
        .blobs
        .load_signed(path, query.expires, &query.signature, Utc::now())
        .await
        .map_err(|e| match e {
            DriveError::Expired => ApiError::gone("download link expired"),
            other => other.into(),
        })?;

    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content.len())
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
