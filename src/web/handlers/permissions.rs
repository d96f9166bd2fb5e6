//! Grant (permission) handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::access::Grant;
use crate::drive::ObjectRef;
use crate::web::dto::{
    ApiResponse, CreatePermissionRequest, OkResponse, TargetQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/permissions - Grant a role on a file or folder.
pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Grant>>), ApiError> {
    let target = ObjectRef::from_pair(req.file_id, req.folder_id)?;

    let grant = state
        .grants
        .grant(auth.principal(), req.target_user_id, target, req.role)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(grant))))
}

/// GET /api/permissions?file_id=|folder_id= - List the grants on an object.
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<TargetQuery>,
) -> Result<Json<ApiResponse<Vec<Grant>>>, ApiError> {
    let target = ObjectRef::from_pair(query.file_id, query.folder_id)?;
    let grants = state.grants.list(auth.principal(), target).await?;

    Ok(Json(ApiResponse::new(grants)))
}

/// DELETE /api/permissions/:id - Revoke a grant.
pub async fn revoke_permission(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(grant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OkResponse>>, ApiError> {
    state.grants.revoke(auth.principal(), grant_id).await?;
    Ok(Json(ApiResponse::new(OkResponse::new())))
}
