//! SQL-backed collaborators.

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    DbPool, FileRepository, FolderRepository, GrantRepository, ShareRepository, UserRepository,
};
use crate::access::{Grant, NewGrant, Role};
use crate::drive::{
    File, FileId, Folder, FolderChildren, FolderId, ListQuery, NewFile, NewFolder, ObjectRef,
    PrincipalId,
};
use crate::share::{NewShare, Share};
use crate::store::{GrantStore, ObjectDirectory, PrincipalDirectory, ShareStore};
use crate::Result;

/// Implements the directory, grant and share traits over one SQLite pool.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    /// Create a store over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.pool)
    }

    fn folders(&self) -> FolderRepository<'_> {
        FolderRepository::new(&self.pool)
    }
}

#[async_trait]
impl ObjectDirectory for SqlStore {
    async fn get_file(&self, id: FileId) -> Result<Option<File>> {
        self.files().get_by_id(id).await
    }

    async fn get_folder(&self, id: FolderId) -> Result<Option<Folder>> {
        self.folders().get_by_id(id).await
    }

    async fn update_file_folder(
        &self,
        id: FileId,
        new_folder_id: Option<FolderId>,
    ) -> Result<Option<File>> {
        self.files().set_folder(id, new_folder_id).await
    }

    async fn update_folder_parent(
        &self,
        id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> Result<Option<Folder>> {
        self.folders().set_parent(id, new_parent_id).await
    }

    async fn list_children(&self, folder_id: FolderId) -> Result<FolderChildren> {
        self.folders().children(folder_id).await
    }

    async fn has_children(&self, folder_id: FolderId) -> Result<bool> {
        self.folders().has_children(folder_id).await
    }

    async fn insert_file(&self, file: &NewFile) -> Result<File> {
        self.files().create(file).await
    }

    async fn insert_folder(&self, folder: &NewFolder) -> Result<Folder> {
        self.folders().create(folder).await
    }

    async fn rename_file(&self, id: FileId, name: &str) -> Result<Option<File>> {
        self.files().rename(id, name).await
    }

    async fn set_file_trashed(&self, id: FileId, trashed: bool) -> Result<Option<File>> {
        self.files().set_trashed(id, trashed).await
    }

    async fn delete_file(&self, id: FileId) -> Result<bool> {
        self.files().delete(id).await
    }

    async fn rename_folder(&self, id: FolderId, name: &str) -> Result<Option<Folder>> {
        self.folders().rename(id, name).await
    }

    async fn delete_folder(&self, id: FolderId) -> Result<bool> {
        self.folders().delete(id).await
    }

    async fn list_files(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<File>> {
        self.files().list_by_owner(owner, query).await
    }

    async fn list_folders(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<Folder>> {
        self.folders().list_by_owner(owner, query).await
    }

    async fn list_trashed(&self, owner: PrincipalId) -> Result<Vec<File>> {
        self.files().list_trashed(owner).await
    }
}

#[async_trait]
impl GrantStore for SqlStore {
    async fn find_roles(&self, principal: PrincipalId, target: ObjectRef) -> Result<Vec<Role>> {
        GrantRepository::new(&self.pool)
            .find_roles(principal, target)
            .await
    }

    async fn insert_grant(&self, grant: &NewGrant) -> Result<Grant> {
        GrantRepository::new(&self.pool).create(grant).await
    }

    async fn get_grant(&self, id: Uuid) -> Result<Option<Grant>> {
        GrantRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_grants(&self, target: ObjectRef) -> Result<Vec<Grant>> {
        GrantRepository::new(&self.pool).list_for(target).await
    }

    async fn delete_grant(&self, id: Uuid) -> Result<bool> {
        GrantRepository::new(&self.pool).delete(id).await
    }
}

#[async_trait]
impl PrincipalDirectory for SqlStore {
    async fn principal_exists(&self, id: PrincipalId) -> Result<bool> {
        UserRepository::new(&self.pool).exists(id).await
    }
}

#[async_trait]
impl ShareStore for SqlStore {
    async fn insert_share(&self, share: &NewShare) -> Result<Share> {
        ShareRepository::new(&self.pool).create(share).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>> {
        ShareRepository::new(&self.pool).get_by_token(token).await
    }

    async fn delete_share(&self, id: Uuid, principal: PrincipalId) -> Result<bool> {
        ShareRepository::new(&self.pool).delete(id, principal).await
    }

    async fn list_shares(
        &self,
        principal: PrincipalId,
        target: Option<ObjectRef>,
    ) -> Result<Vec<Share>> {
        ShareRepository::new(&self.pool)
            .list_by_creator(principal, target)
            .await
    }
}
