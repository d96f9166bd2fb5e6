//! File and folder model for cloudrive.
//!
//! This module provides:
//! - File and folder metadata types
//! - Typed object references (exactly one of file or folder)
//! - The [`DriveService`] that gates every mutation through the access resolver

mod service;

pub use service::{DriveService, UploadRequest};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DriveError, Result};

/// Identifier of an authenticated actor.
pub type PrincipalId = Uuid;

/// Identifier of a file.
pub type FileId = Uuid;

/// Identifier of a folder.
pub type FolderId = Uuid;

/// Maximum length for file and folder names (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum number of parent links followed when walking folder ancestry.
pub const MAX_FOLDER_DEPTH: usize = 64;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct File {
    /// Unique file ID.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// Containing folder (None for the owner's root).
    pub folder_id: Option<FolderId>,
    /// Owning principal.
    pub owner_id: PrincipalId,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Path of the blob in object storage.
    #[serde(skip_serializing)]
    pub storage_path: String,
    /// Whether the file is in the trash.
    pub is_trashed: bool,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
}

/// A folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Owning principal.
    pub owner_id: PrincipalId,
    /// Parent folder ID (None for root folders).
    pub parent_folder_id: Option<FolderId>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

/// Discriminant of a drive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A file.
    File,
    /// A folder.
    Folder,
}

impl ObjectKind {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::File => "file",
            ObjectKind::Folder => "folder",
        }
    }
}

/// Reference to exactly one file or folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// A file reference.
    File(FileId),
    /// A folder reference.
    Folder(FolderId),
}

impl ObjectRef {
    /// Build a reference from the nullable column/field pair used by grants and shares.
    ///
    /// Exactly one of the two must be set.
    pub fn from_pair(file_id: Option<FileId>, folder_id: Option<FolderId>) -> Result<Self> {
        match (file_id, folder_id) {
            (Some(id), None) => Ok(ObjectRef::File(id)),
            (None, Some(id)) => Ok(ObjectRef::Folder(id)),
            _ => Err(DriveError::InvalidRequest(
                "exactly one of file_id or folder_id is required".to_string(),
            )),
        }
    }

    /// Split into the nullable (file_id, folder_id) pair.
    pub fn as_pair(&self) -> (Option<FileId>, Option<FolderId>) {
        match *self {
            ObjectRef::File(id) => (Some(id), None),
            ObjectRef::Folder(id) => (None, Some(id)),
        }
    }

    /// Kind of the referenced object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::File(_) => ObjectKind::File,
            ObjectRef::Folder(_) => ObjectKind::Folder,
        }
    }

    /// ID of the referenced object.
    pub fn id(&self) -> Uuid {
        match *self {
            ObjectRef::File(id) | ObjectRef::Folder(id) => id,
        }
    }
}

/// A fetched file or folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveObject {
    /// A file.
    File(File),
    /// A folder.
    Folder(Folder),
}

impl DriveObject {
    /// Owning principal.
    pub fn owner_id(&self) -> PrincipalId {
        match self {
            DriveObject::File(f) => f.owner_id,
            DriveObject::Folder(f) => f.owner_id,
        }
    }

    /// Reference to this object.
    pub fn object_ref(&self) -> ObjectRef {
        match self {
            DriveObject::File(f) => ObjectRef::File(f.id),
            DriveObject::Folder(f) => ObjectRef::Folder(f.id),
        }
    }
}

/// Data for creating a new file row.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub name: String,
    /// Containing folder.
    pub folder_id: Option<FolderId>,
    /// Owning principal.
    pub owner_id: PrincipalId,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Path of the blob in object storage.
    pub storage_path: String,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Owning principal.
    pub owner_id: PrincipalId,
    /// Parent folder ID (None for root folders).
    pub parent_folder_id: Option<FolderId>,
}

impl NewFolder {
    /// Create a new root folder owned by `owner_id`.
    pub fn new(name: impl Into<String>, owner_id: PrincipalId) -> Self {
        Self {
            name: name.into(),
            owner_id,
            parent_folder_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: FolderId) -> Self {
        self.parent_folder_id = Some(parent_id);
        self
    }
}

/// Direct children of a folder (one level only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderChildren {
    /// Child folders.
    pub folders: Vec<Folder>,
    /// Child files that are not trashed.
    pub files: Vec<File>,
}

/// Sort column for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// By name.
    Name,
    /// By size (folders fall back to creation time).
    Size,
    /// By creation time.
    #[default]
    CreatedAt,
}

impl SortField {
    /// Column name for SQL ordering.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// Listing parameters for owner-scoped listings.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Parent folder to list (None for the root).
    pub parent: Option<FolderId>,
    /// Page size.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Sort column.
    pub sort: SortField,
    /// Ascending order when true.
    pub ascending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            parent: None,
            limit: 20,
            offset: 0,
            sort: SortField::CreatedAt,
            ascending: false,
        }
    }
}

/// Validate a file or folder name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DriveError::InvalidRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DriveError::InvalidRequest(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.contains('/') || name.chars().any(|c| c.is_control()) {
        return Err(DriveError::InvalidRequest(
            "name must not contain '/' or control characters".to_string(),
        ));
    }
    Ok(())
}
