//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::User;
use crate::drive::{File, Folder};
use crate::share::{FileShareView, FolderShareView, PublicFile, PublicFolder, Share, ShareRole};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Acknowledgement for operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    /// Always true.
    pub ok: bool,
}

impl OkResponse {
    /// The acknowledgement.
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Auth
// ============================================================================

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

// ============================================================================
// Files and folders
// ============================================================================

/// File metadata returned to authenticated callers.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub name: String,
    pub folder_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub size: i64,
    pub mime_type: String,
    pub is_trashed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            name: file.name,
            folder_id: file.folder_id,
            owner_id: file.owner_id,
            size: file.size,
            mime_type: file.mime_type,
            is_trashed: file.is_trashed,
            created_at: file.created_at,
        }
    }
}

/// Folder metadata returned to authenticated callers.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub parent_folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            owner_id: folder.owner_id,
            parent_folder_id: folder.parent_folder_id,
            created_at: folder.created_at,
        }
    }
}

/// Time-limited download URL.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Download URL.
    pub url: String,
}

// ============================================================================
// Shares
// ============================================================================

/// A share link as seen by its creator.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    /// The stored share.
    pub share: Share,
    /// Public URL of the link.
    pub url: String,
}

impl ShareResponse {
    /// Build the response with a URL under `base_url`.
    pub fn new(share: Share, base_url: &str) -> Self {
        let url = format!("{}/s/{}", base_url.trim_end_matches('/'), share.token);
        Self { share, url }
    }
}

/// What an anonymous link holder sees.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PublicShareResponse {
    /// A shared file with a download URL.
    File {
        role: ShareRole,
        file: PublicFile,
        url: String,
    },
    /// A shared folder (or a folder inside one) with its direct children.
    Folder {
        role: ShareRole,
        folder: PublicFolder,
        folders: Vec<PublicFolder>,
        files: Vec<PublicFile>,
    },
}

impl From<FileShareView> for PublicShareResponse {
    fn from(view: FileShareView) -> Self {
        PublicShareResponse::File {
            role: view.role,
            file: view.file,
            url: view.url,
        }
    }
}

impl From<FolderShareView> for PublicShareResponse {
    fn from(view: FolderShareView) -> Self {
        PublicShareResponse::Folder {
            role: view.role,
            folder: view.folder,
            folders: view.folders,
            files: view.files,
        }
    }
}
