//! File handlers.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::drive::UploadRequest;
use crate::web::dto::{
    ApiResponse, FileResponse, ListParams, OkResponse, RenameRequest, UrlResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Upload exceeds the size limit");
    }
    tracing::debug!("Failed to read multipart field: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

/// POST /api/files - Upload a file.
///
/// Multipart fields: `file` (required, with a filename) and `folder_id` (optional).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let mut filename: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut folder_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                mime_type = field
                    .content_type()
                    .filter(|ct| *ct != "application/octet-stream")
                    .map(|ct| ct.to_string());
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "folder_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    folder_id = Some(
                        text.parse()
                            .map_err(|_| ApiError::bad_request("folder_id must be a UUID"))?,
                    );
                }
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("No file content"))?;

    let mut request = UploadRequest::new(filename, content);
    request.folder_id = folder_id;
    request.mime_type = mime_type;

    let file = state.drive.upload(auth.principal(), request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(file.into()))))
}

/// GET /api/files - List the caller's files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state
        .drive
        .list_files(auth.principal(), &params.to_query())
        .await?;

    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}

/// GET /api/files/:id/url - Mint a time-limited download URL.
pub async fn get_file_url(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UrlResponse>>, ApiError> {
    let url = state
        .drive
        .download_locator(auth.principal(), file_id)
        .await?;

    Ok(Json(ApiResponse::new(UrlResponse { url })))
}

/// PATCH /api/files/:id - Rename a file.
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .drive
        .rename_file(auth.principal(), file_id, &req.name)
        .await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// POST /api/files/:id/trash - Move a file to the trash.
pub async fn trash_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state.drive.trash_file(auth.principal(), file_id).await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// POST /api/files/:id/restore - Restore a file from the trash.
pub async fn restore_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state.drive.restore_file(auth.principal(), file_id).await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/files/:id - Permanently delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OkResponse>>, ApiError> {
    state.drive.delete_file(auth.principal(), file_id).await?;
    Ok(Json(ApiResponse::new(OkResponse::new())))
}

/// GET /api/trash - List the caller's trashed files.
pub async fn list_trash(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state.drive.list_trash(auth.principal()).await?;
    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}
