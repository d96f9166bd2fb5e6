//! Folder handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FolderResponse, ListParams, OkResponse, RenameRequest,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let folder = state
        .drive
        .create_folder(auth.principal(), &req.name, req.parent_folder_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(folder.into()))))
}

/// GET /api/folders - List the caller's folders.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let folders = state
        .drive
        .list_folders(auth.principal(), &params.to_query())
        .await?;

    Ok(Json(ApiResponse::new(
        folders.into_iter().map(FolderResponse::from).collect(),
    )))
}

/// PATCH /api/folders/:id - Rename a folder.
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let folder = state
        .drive
        .rename_folder(auth.principal(), folder_id, &req.name)
        .await?;

    Ok(Json(ApiResponse::new(folder.into())))
}

/// DELETE /api/folders/:id - Delete an empty folder.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OkResponse>>, ApiError> {
    state.drive.delete_folder(auth.principal(), folder_id).await?;
    Ok(Json(ApiResponse::new(OkResponse::new())))
}
