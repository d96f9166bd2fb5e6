//! Public share link handlers. No authentication; the token is the capability.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::share::ShareResolution;
use crate::web::dto::{ApiResponse, PublicShareResponse};
use crate::web::error::ApiError;

fn render(resolution: ShareResolution) -> Result<Json<ApiResponse<PublicShareResponse>>, ApiError> {
    match resolution {
        ShareResolution::Invalid => Err(ApiError::not_found()),
        ShareResolution::Expired => Err(ApiError::gone("share link expired")),
        ShareResolution::File(view) => Ok(Json(ApiResponse::new(view.into()))),
        ShareResolution::Folder(view) => Ok(Json(ApiResponse::new(view.into()))),
    }
}

/// GET /s/:token - Resolve a share link.
pub async fn resolve_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<PublicShareResponse>>, ApiError> {
    render(state.shares.resolve(&token).await?)
}

/// GET /s/:token/folders/:id - List a folder inside a shared folder.
pub async fn browse_share(
    State(state): State<Arc<AppState>>,
    Path((token, folder_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<PublicShareResponse>>, ApiError> {
    render(state.shares.browse(&token, folder_id).await?)
}
