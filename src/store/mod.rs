//! Collaborator interfaces consumed by the access core.
//!
//! The resolver and the share service never talk to a database directly. They are
//! constructed with handles implementing these traits, which lets the SQL-backed
//! implementations in [`crate::db`] be swapped for the in-memory doubles in [`memory`].
//!
//! Every call is a single read or a single atomic write. No trait method spans a
//! transaction, so a resolve followed by a mutation is two independent calls.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::access::{Grant, NewGrant, Role};
use crate::drive::{
    File, FileId, Folder, FolderChildren, FolderId, ListQuery, NewFile, NewFolder, ObjectRef,
    PrincipalId,
};
use crate::share::{NewShare, Share};
use crate::Result;

pub use memory::{MemoryObjectStorage, MemoryStore};

/// File and folder metadata.
#[async_trait]
pub trait ObjectDirectory: Send + Sync {
    /// Get a file by ID.
    async fn get_file(&self, id: FileId) -> Result<Option<File>>;

    /// Get a folder by ID.
    async fn get_folder(&self, id: FolderId) -> Result<Option<Folder>>;

    /// Change the containing folder of a file.
    async fn update_file_folder(
        &self,
        id: FileId,
        new_folder_id: Option<FolderId>,
    ) -> Result<Option<File>>;

    /// Change the parent of a folder.
    async fn update_folder_parent(
        &self,
        id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> Result<Option<Folder>>;

    /// Direct child folders and direct non-trashed child files of a folder.
    async fn list_children(&self, folder_id: FolderId) -> Result<FolderChildren>;

    /// Whether a folder contains any folder or file, trashed files included.
    async fn has_children(&self, folder_id: FolderId) -> Result<bool>;

    /// Insert a file row.
    async fn insert_file(&self, file: &NewFile) -> Result<File>;

    /// Insert a folder row.
    async fn insert_folder(&self, folder: &NewFolder) -> Result<Folder>;

    /// Rename a file.
    async fn rename_file(&self, id: FileId, name: &str) -> Result<Option<File>>;

    /// Move a file into or out of the trash.
    async fn set_file_trashed(&self, id: FileId, trashed: bool) -> Result<Option<File>>;

    /// Delete a file row. Returns `true` if a row was removed.
    async fn delete_file(&self, id: FileId) -> Result<bool>;

    /// Rename a folder.
    async fn rename_folder(&self, id: FolderId, name: &str) -> Result<Option<Folder>>;

    /// Delete a folder row. Returns `true` if a row was removed.
    async fn delete_folder(&self, id: FolderId) -> Result<bool>;

    /// List non-trashed files owned by `owner` in `query.parent`.
    async fn list_files(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<File>>;

    /// List folders owned by `owner` under `query.parent`.
    async fn list_folders(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<Folder>>;

    /// List trashed files owned by `owner`, newest first.
    async fn list_trashed(&self, owner: PrincipalId) -> Result<Vec<File>>;
}

/// Per-object role grants.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Roles granted to `principal` directly on `target`. May contain duplicates.
    async fn find_roles(&self, principal: PrincipalId, target: ObjectRef) -> Result<Vec<Role>>;

    /// Insert a grant.
    async fn insert_grant(&self, grant: &NewGrant) -> Result<Grant>;

    /// Get a grant by ID.
    async fn get_grant(&self, id: Uuid) -> Result<Option<Grant>>;

    /// List every grant on `target`.
    async fn list_grants(&self, target: ObjectRef) -> Result<Vec<Grant>>;

    /// Delete a grant. Returns `true` if a row was removed.
    async fn delete_grant(&self, id: Uuid) -> Result<bool>;
}

/// Registered principals.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Whether `id` belongs to a registered principal.
    async fn principal_exists(&self, id: PrincipalId) -> Result<bool>;
}

/// Share link rows.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Insert a share.
    async fn insert_share(&self, share: &NewShare) -> Result<Share>;

    /// Find a share by exact token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Share>>;

    /// Delete a share created by `principal`. Returns `true` if a row was removed.
    async fn delete_share(&self, id: Uuid, principal: PrincipalId) -> Result<bool>;

    /// List shares created by `principal`, optionally restricted to one target.
    async fn list_shares(
        &self,
        principal: PrincipalId,
        target: Option<ObjectRef>,
    ) -> Result<Vec<Share>>;
}

/// Blob storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `content` under `path`.
    async fn put(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Remove the blob at `path`. Returns `false` if it did not exist.
    async fn remove(&self, path: &str) -> Result<bool>;

    /// Mint a retrieval URL for `path` that stops working after `ttl`.
    async fn create_locator(&self, path: &str, ttl: Duration) -> Result<String>;
}
