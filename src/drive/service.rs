//! Drive service for cloudrive.
//!
//! Every operation resolves access before touching the directory:
//! - Upload and folder creation with write checks on the destination
//! - Rename, trash, restore and delete of files
//! - Rename and delete of folders
//! - Moves, with the destination resolved before any write

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{
    ancestry_of, folder_depth, subtree_height, AccessResolver, Action, Ancestry,
};
use crate::store::{ObjectDirectory, ObjectStorage};
use crate::{DriveError, Result};

use super::{
    validate_name, File, FileId, Folder, FolderId, ListQuery, NewFile, NewFolder, PrincipalId,
    DEFAULT_MAX_FILE_SIZE, MAX_FOLDER_DEPTH,
};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Display name.
    pub name: String,
    /// Folder to upload into (None for the root).
    pub folder_id: Option<FolderId>,
    /// File content.
    pub content: Vec<u8>,
    /// MIME type. Guessed from the name when absent.
    pub mime_type: Option<String>,
}

impl UploadRequest {
    /// Create a new upload request for the root.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            folder_id: None,
            content,
            mime_type: None,
        }
    }

    /// Set the destination folder.
    pub fn in_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// File and folder operations gated by the access resolver.
#[derive(Clone)]
pub struct DriveService {
    directory: Arc<dyn ObjectDirectory>,
    storage: Arc<dyn ObjectStorage>,
    resolver: AccessResolver,
    max_file_size: u64,
    locator_ttl: Duration,
}

impl DriveService {
    /// Create a new DriveService.
    pub fn new(
        directory: Arc<dyn ObjectDirectory>,
        storage: Arc<dyn ObjectStorage>,
        resolver: AccessResolver,
    ) -> Self {
        Self {
            directory,
            storage,
            resolver,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            locator_ttl: Duration::from_secs(600),
        }
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Set the lifetime of download URLs.
    pub fn with_locator_ttl(mut self, ttl: Duration) -> Self {
        self.locator_ttl = ttl;
        self
    }

    /// Upload a file owned by `principal`.
    ///
    /// # Permission Check
    /// Write access on the destination folder, when one is given.
    ///
    /// # Validation
    /// - Name: non-empty, max 255 characters, no `/`
    /// - Size: max configured size (default 10MB)
    pub async fn upload(&self, principal: PrincipalId, request: UploadRequest) -> Result<File> {
        validate_name(&request.name)?;

        if request.content.len() as u64 > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(DriveError::InvalidRequest(format!(
                "file is too large (max {max_mb}MB)"
            )));
        }

        if let Some(folder_id) = request.folder_id {
            self.resolver
                .resolve_folder(principal, folder_id, Action::Write)
                .await?
                .require("folder")?;
        }

        let storage_path = format!("{principal}/{}", stored_name(&request.name));
        let mime_type = request.mime_type.unwrap_or_else(|| {
            mime_guess::from_path(&request.name)
                .first_or_octet_stream()
                .to_string()
        });

        self.storage.put(&storage_path, &request.content).await?;

        let new_file = NewFile {
            name: request.name,
            folder_id: request.folder_id,
            owner_id: principal,
            size: request.content.len() as i64,
            mime_type,
            storage_path,
        };
        let file = match self.directory.insert_file(&new_file).await {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&new_file.storage_path).await {
                    warn!(path = %new_file.storage_path, "failed to remove orphaned blob: {cleanup}");
                }
                return Err(e);
            }
        };

        info!(file_id = %file.id, %principal, size = file.size, "file uploaded");
        Ok(file)
    }

    /// Create a folder owned by `principal`.
    pub async fn create_folder(
        &self,
        principal: PrincipalId,
        name: &str,
        parent_folder_id: Option<FolderId>,
    ) -> Result<Folder> {
        validate_name(name)?;

        if let Some(parent_id) = parent_folder_id {
            self.resolver
                .resolve_folder(principal, parent_id, Action::Write)
                .await?
                .require("folder")?;
            self.ensure_fits_under(parent_id, 1).await?;
        }

        let mut new_folder = NewFolder::new(name, principal);
        new_folder.parent_folder_id = parent_folder_id;
        let folder = self.directory.insert_folder(&new_folder).await?;

        info!(folder_id = %folder.id, %principal, "folder created");
        Ok(folder)
    }

    /// List the caller's own non-trashed files.
    pub async fn list_files(&self, principal: PrincipalId, query: &ListQuery) -> Result<Vec<File>> {
        self.directory.list_files(principal, query).await
    }

    /// List the caller's own folders.
    pub async fn list_folders(
        &self,
        principal: PrincipalId,
        query: &ListQuery,
    ) -> Result<Vec<Folder>> {
        self.directory.list_folders(principal, query).await
    }

    /// List the caller's trashed files.
    pub async fn list_trash(&self, principal: PrincipalId) -> Result<Vec<File>> {
        self.directory.list_trashed(principal).await
    }

    /// Rename a file.
    pub async fn rename_file(&self, principal: PrincipalId, id: FileId, name: &str) -> Result<File> {
        validate_name(name)?;
        self.require_file(principal, id, Action::Write).await?;

        self.directory
            .rename_file(id, name)
            .await?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))
    }

    /// Move a file to the trash.
    pub async fn trash_file(&self, principal: PrincipalId, id: FileId) -> Result<File> {
        self.set_trashed(principal, id, true).await
    }

    /// Restore a file from the trash.
    pub async fn restore_file(&self, principal: PrincipalId, id: FileId) -> Result<File> {
        self.set_trashed(principal, id, false).await
    }

    async fn set_trashed(&self, principal: PrincipalId, id: FileId, trashed: bool) -> Result<File> {
        self.require_file(principal, id, Action::Write).await?;

        let file = self
            .directory
            .set_file_trashed(id, trashed)
            .await?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))?;

        info!(file_id = %id, %principal, trashed, "file trash state changed");
        Ok(file)
    }

    /// Permanently delete a file and its blob.
    pub async fn delete_file(&self, principal: PrincipalId, id: FileId) -> Result<()> {
        let file = self.require_file(principal, id, Action::Delete).await?;

        if !self.directory.delete_file(id).await? {
            return Err(DriveError::NotFound("file".to_string()));
        }
        match self.storage.remove(&file.storage_path).await {
            Ok(true) => {}
            Ok(false) => warn!(file_id = %id, path = %file.storage_path, "blob already missing"),
            Err(e) => warn!(file_id = %id, path = %file.storage_path, "failed to remove blob: {e}"),
        }

        info!(file_id = %id, %principal, "file deleted");
        Ok(())
    }

    /// Mint a time-limited download URL.
    pub async fn download_locator(&self, principal: PrincipalId, id: FileId) -> Result<String> {
        let file = self.require_file(principal, id, Action::Read).await?;
        if file.is_trashed {
            return Err(DriveError::InvalidRequest("file is in the trash".to_string()));
        }

        self.storage
            .create_locator(&file.storage_path, self.locator_ttl)
            .await
    }

    /// Rename a folder.
    pub async fn rename_folder(
        &self,
        principal: PrincipalId,
        id: FolderId,
        name: &str,
    ) -> Result<Folder> {
        validate_name(name)?;
        self.require_folder(principal, id, Action::Write).await?;

        self.directory
            .rename_folder(id, name)
            .await?
            .ok_or_else(|| DriveError::NotFound("folder".to_string()))
    }

    /// Delete an empty folder. Trashed files still count as contents.
    pub async fn delete_folder(&self, principal: PrincipalId, id: FolderId) -> Result<()> {
        self.require_folder(principal, id, Action::Delete).await?;

        if self.directory.has_children(id).await? {
            return Err(DriveError::InvalidRequest("folder is not empty".to_string()));
        }

        if !self.directory.delete_folder(id).await? {
            return Err(DriveError::NotFound("folder".to_string()));
        }

        info!(folder_id = %id, %principal, "folder deleted");
        Ok(())
    }

    /// Move a file to another folder, or to the root when `destination` is None.
    ///
    /// # Permission Check
    /// Write on the file and read on the destination, both resolved before the write.
    pub async fn move_file(
        &self,
        principal: PrincipalId,
        id: FileId,
        destination: Option<FolderId>,
    ) -> Result<File> {
        self.require_file(principal, id, Action::Write).await?;

        if let Some(folder_id) = destination {
            self.require_folder(principal, folder_id, Action::Read)
                .await?;
        }

        let file = self
            .directory
            .update_file_folder(id, destination)
            .await?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))?;

        info!(file_id = %id, %principal, destination = ?destination, "file moved");
        Ok(file)
    }

    /// Move a folder under another folder, or to the root when `new_parent` is None.
    ///
    /// # Permission Check
    /// Write on the folder and write on the new parent, both resolved before the write.
    /// The new parent must not be the folder itself or one of its descendants, and the
    /// moved subtree must stay within [`MAX_FOLDER_DEPTH`].
    pub async fn move_folder(
        &self,
        principal: PrincipalId,
        id: FolderId,
        new_parent: Option<FolderId>,
    ) -> Result<Folder> {
        self.require_folder(principal, id, Action::Write).await?;

        if let Some(parent_id) = new_parent {
            self.require_folder(principal, parent_id, Action::Write)
                .await?;

            match ancestry_of(self.directory.as_ref(), parent_id, id).await? {
                Ancestry::Outside => {}
                Ancestry::Within => {
                    return Err(DriveError::InvalidRequest(
                        "cannot move a folder into itself or one of its subfolders".to_string(),
                    ))
                }
                Ancestry::Unresolved => return Err(too_deep()),
            }

            let height = subtree_height(self.directory.as_ref(), id)
                .await?
                .ok_or_else(too_deep)?;
            self.ensure_fits_under(parent_id, height).await?;
        }

        let folder = self
            .directory
            .update_folder_parent(id, new_parent)
            .await?
            .ok_or_else(|| DriveError::NotFound("folder".to_string()))?;

        info!(folder_id = %id, %principal, new_parent = ?new_parent, "folder moved");
        Ok(folder)
    }

    /// Refuse to hang `height` levels of folders below `parent_id` past the depth limit.
    async fn ensure_fits_under(&self, parent_id: FolderId, height: usize) -> Result<()> {
        let fits = folder_depth(self.directory.as_ref(), parent_id)
            .await?
            .and_then(|depth| depth.checked_add(height))
            .is_some_and(|total| total <= MAX_FOLDER_DEPTH);
        if fits {
            Ok(())
        } else {
            Err(too_deep())
        }
    }

    async fn require_file(&self, principal: PrincipalId, id: FileId, action: Action) -> Result<File> {
        self.resolver
            .resolve_file(principal, id, action)
            .await?
            .require("file")
    }

    async fn require_folder(
        &self,
        principal: PrincipalId,
        id: FolderId,
        action: Action,
    ) -> Result<Folder> {
        self.resolver
            .resolve_folder(principal, id, action)
            .await?
            .require("folder")
    }
}

fn too_deep() -> DriveError {
    DriveError::InvalidRequest(format!(
        "folders cannot be nested more than {MAX_FOLDER_DEPTH} levels deep"
    ))
}

/// UUID-based blob name keeping the original extension ("bin" if none).
fn stored_name(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("bin");
    format!("{}.{ext}", Uuid::new_v4())
}
