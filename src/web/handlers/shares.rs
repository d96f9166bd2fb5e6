//! Share link management handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::drive::ObjectRef;
use crate::share::{Revocation, ShareTarget};
use crate::web::dto::{
    ApiResponse, CreateShareRequest, OkResponse, ShareResponse, TargetQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/shares - Issue a share link.
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShareResponse>>), ApiError> {
    let target = ShareTarget {
        file_id: req.file_id,
        folder_id: req.folder_id,
    };
    let share = state
        .shares
        .issue(auth.principal(), target, req.role, req.expires_in)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ShareResponse::new(
            share,
            &state.public_base_url,
        ))),
    ))
}

/// GET /api/shares - List the caller's links, optionally for one object.
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<TargetQuery>,
) -> Result<Json<ApiResponse<Vec<ShareResponse>>>, ApiError> {
    let target = if query.is_empty() {
        None
    } else {
        Some(ObjectRef::from_pair(query.file_id, query.folder_id)?)
    };

    let shares = state.shares.list(auth.principal(), target).await?;

    Ok(Json(ApiResponse::new(
        shares
            .into_iter()
            .map(|share| ShareResponse::new(share, &state.public_base_url))
            .collect(),
    )))
}

/// DELETE /api/shares/:id - Revoke one of the caller's links.
pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(share_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OkResponse>>, ApiError> {
    match state.shares.revoke(auth.principal(), share_id).await? {
        Revocation::Revoked => Ok(Json(ApiResponse::new(OkResponse::new()))),
        Revocation::NotFound => Err(ApiError::not_found()),
    }
}
