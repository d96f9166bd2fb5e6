//! Move handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::web::dto::{
    ApiResponse, FileResponse, FolderResponse, MoveFileRequest, MoveFolderRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// PATCH /api/move/files/:id - Move a file to another folder (null for the root).
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<MoveFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .drive
        .move_file(auth.principal(), file_id, req.new_folder_id)
        .await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// PATCH /api/move/folders/:id - Move a folder under another folder (null for the root).
pub async fn move_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<MoveFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let folder = state
        .drive
        .move_folder(auth.principal(), folder_id, req.new_parent_id)
        .await?;

    Ok(Json(ApiResponse::new(folder.into())))
}
