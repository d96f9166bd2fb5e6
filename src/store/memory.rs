//! In-memory collaborators for tests and embedding.
//!
//! [`MemoryStore`] implements the directory, grant and share traits over plain maps,
//! counts lookups, and can be told to fail its next call with a storage error.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::access::{Grant, NewGrant, Role};
use crate::drive::{
    File, FileId, Folder, FolderChildren, FolderId, ListQuery, NewFile, NewFolder, ObjectRef,
    PrincipalId, SortField,
};
use crate::share::{NewShare, Share};
use crate::store::{GrantStore, ObjectDirectory, ObjectStorage, PrincipalDirectory, ShareStore};
use crate::{DriveError, Result};

#[derive(Default)]
struct State {
    files: HashMap<FileId, File>,
    folders: HashMap<FolderId, Folder>,
    grants: HashMap<Uuid, Grant>,
    shares: HashMap<Uuid, Share>,
    principals: HashSet<PrincipalId>,
}

/// Map-backed directory, grant store and share store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_countdown: AtomicUsize,
    directory_lookups: AtomicUsize,
    grant_lookups: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<()> {
        let previous =
            self.fail_countdown
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            return Err(DriveError::Storage("injected failure".to_string()));
        }
        Ok(())
    }

    /// Make the next trait call return [`DriveError::Storage`].
    pub fn fail_next_call(&self) {
        self.fail_call_after(0);
    }

    /// Let `skip` trait calls succeed, then fail the one after with [`DriveError::Storage`].
    pub fn fail_call_after(&self, skip: usize) {
        self.fail_countdown.store(skip + 1, Ordering::SeqCst);
    }

    /// Number of `get_file`/`get_folder` calls so far.
    pub fn directory_lookups(&self) -> usize {
        self.directory_lookups.load(Ordering::SeqCst)
    }

    /// Number of `find_roles` calls so far.
    pub fn grant_lookups(&self) -> usize {
        self.grant_lookups.load(Ordering::SeqCst)
    }

    /// Register a principal.
    pub fn seed_principal(&self, id: PrincipalId) {
        self.lock().principals.insert(id);
    }

    /// Insert a file with defaults for everything but owner, folder and name.
    pub async fn seed_file(
        &self,
        owner_id: PrincipalId,
        folder_id: Option<FolderId>,
        name: &str,
    ) -> File {
        let id = Uuid::new_v4();
        let file = File {
            id,
            name: name.to_string(),
            folder_id,
            owner_id,
            size: 0,
            mime_type: "application/octet-stream".to_string(),
            storage_path: format!("{owner_id}/{id}"),
            is_trashed: false,
            created_at: Utc::now(),
        };
        self.lock().files.insert(id, file.clone());
        file
    }

    /// Insert a folder without any failure injection.
    pub async fn seed_folder(&self, folder: NewFolder) -> Folder {
        let folder = Folder {
            id: Uuid::new_v4(),
            name: folder.name,
            owner_id: folder.owner_id,
            parent_folder_id: folder.parent_folder_id,
            created_at: Utc::now(),
        };
        self.lock().folders.insert(folder.id, folder.clone());
        folder
    }

    /// Insert a grant without any failure injection.
    pub async fn insert_grant_raw(&self, grant: &NewGrant) -> Grant {
        let (file_id, folder_id) = grant.target.as_pair();
        let grant = Grant {
            id: Uuid::new_v4(),
            user_id: grant.user_id,
            file_id,
            folder_id,
            role: grant.role,
            created_at: Utc::now(),
        };
        self.lock().grants.insert(grant.id, grant.clone());
        grant
    }

    /// Store a share row exactly as given.
    pub fn insert_share_raw(&self, share: Share) {
        self.lock().shares.insert(share.id, share);
    }

    /// Overwrite a folder's parent without any checks.
    pub fn set_folder_parent_raw(&self, id: FolderId, parent: Option<FolderId>) {
        if let Some(folder) = self.lock().folders.get_mut(&id) {
            folder.parent_folder_id = parent;
        }
    }

    /// Flag a file as trashed without any checks.
    pub fn set_file_trashed_raw(&self, id: FileId, trashed: bool) {
        if let Some(file) = self.lock().files.get_mut(&id) {
            file.is_trashed = trashed;
        }
    }

    /// Snapshot of a file row, bypassing counters.
    pub fn file_raw(&self, id: FileId) -> Option<File> {
        self.lock().files.get(&id).cloned()
    }

    /// Snapshot of a folder row, bypassing counters.
    pub fn folder_raw(&self, id: FolderId) -> Option<Folder> {
        self.lock().folders.get(&id).cloned()
    }
}

fn page<T>(
    mut rows: Vec<T>,
    query: &ListQuery,
    cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
) -> Vec<T> {
    rows.sort_by(|a, b| {
        let ord = cmp(a, b);
        if query.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    rows.into_iter()
        .skip(query.offset.max(0) as usize)
        .take(query.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl ObjectDirectory for MemoryStore {
    async fn get_file(&self, id: FileId) -> Result<Option<File>> {
        self.directory_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.lock().files.get(&id).cloned())
    }

    async fn get_folder(&self, id: FolderId) -> Result<Option<Folder>> {
        self.directory_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.lock().folders.get(&id).cloned())
    }

    async fn update_file_folder(
        &self,
        id: FileId,
        new_folder_id: Option<FolderId>,
    ) -> Result<Option<File>> {
        self.check()?;
        let mut state = self.lock();
        Ok(state.files.get_mut(&id).map(|file| {
            file.folder_id = new_folder_id;
            file.clone()
        }))
    }

    async fn update_folder_parent(
        &self,
        id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> Result<Option<Folder>> {
        self.check()?;
        let mut state = self.lock();
        Ok(state.folders.get_mut(&id).map(|folder| {
            folder.parent_folder_id = new_parent_id;
            folder.clone()
        }))
    }

    async fn list_children(&self, folder_id: FolderId) -> Result<FolderChildren> {
        self.check()?;
        let state = self.lock();
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_folder_id == Some(folder_id))
            .cloned()
            .collect();
        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| f.folder_id == Some(folder_id) && !f.is_trashed)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(FolderChildren { folders, files })
    }

    async fn has_children(&self, folder_id: FolderId) -> Result<bool> {
        self.check()?;
        let state = self.lock();
        Ok(state
            .folders
            .values()
            .any(|f| f.parent_folder_id == Some(folder_id))
            || state.files.values().any(|f| f.folder_id == Some(folder_id)))
    }

    async fn insert_file(&self, file: &NewFile) -> Result<File> {
        self.check()?;
        let file = File {
            id: Uuid::new_v4(),
            name: file.name.clone(),
            folder_id: file.folder_id,
            owner_id: file.owner_id,
            size: file.size,
            mime_type: file.mime_type.clone(),
            storage_path: file.storage_path.clone(),
            is_trashed: false,
            created_at: Utc::now(),
        };
        self.lock().files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn insert_folder(&self, folder: &NewFolder) -> Result<Folder> {
        self.check()?;
        Ok(self.seed_folder(folder.clone()).await)
    }

    async fn rename_file(&self, id: FileId, name: &str) -> Result<Option<File>> {
        self.check()?;
        let mut state = self.lock();
        Ok(state.files.get_mut(&id).map(|file| {
            file.name = name.to_string();
            file.clone()
        }))
    }

    async fn set_file_trashed(&self, id: FileId, trashed: bool) -> Result<Option<File>> {
        self.check()?;
        let mut state = self.lock();
        Ok(state.files.get_mut(&id).map(|file| {
            file.is_trashed = trashed;
            file.clone()
        }))
    }

    async fn delete_file(&self, id: FileId) -> Result<bool> {
        self.check()?;
        let mut state = self.lock();
        state.grants.retain(|_, g| g.file_id != Some(id));
        state.shares.retain(|_, s| s.file_id != Some(id));
        Ok(state.files.remove(&id).is_some())
    }

    async fn rename_folder(&self, id: FolderId, name: &str) -> Result<Option<Folder>> {
        self.check()?;
        let mut state = self.lock();
        Ok(state.folders.get_mut(&id).map(|folder| {
            folder.name = name.to_string();
            folder.clone()
        }))
    }

    async fn delete_folder(&self, id: FolderId) -> Result<bool> {
        self.check()?;
        let mut state = self.lock();
        state.grants.retain(|_, g| g.folder_id != Some(id));
        state.shares.retain(|_, s| s.folder_id != Some(id));
        for file in state.files.values_mut() {
            if file.folder_id == Some(id) {
                file.folder_id = None;
            }
        }
        Ok(state.folders.remove(&id).is_some())
    }

    async fn list_files(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<File>> {
        self.check()?;
        let rows: Vec<File> = self
            .lock()
            .files
            .values()
            .filter(|f| f.owner_id == owner && f.folder_id == query.parent && !f.is_trashed)
            .cloned()
            .collect();
        Ok(page(rows, query, |a, b| match query.sort {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }))
    }

    async fn list_folders(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<Folder>> {
        self.check()?;
        let rows: Vec<Folder> = self
            .lock()
            .folders
            .values()
            .filter(|f| f.owner_id == owner && f.parent_folder_id == query.parent)
            .cloned()
            .collect();
        Ok(page(rows, query, |a, b| match query.sort {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size | SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }))
    }

    async fn list_trashed(&self, owner: PrincipalId) -> Result<Vec<File>> {
        self.check()?;
        let mut rows: Vec<File> = self
            .lock()
            .files
            .values()
            .filter(|f| f.owner_id == owner && f.is_trashed)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryStore {
    async fn principal_exists(&self, id: PrincipalId) -> Result<bool> {
        self.check()?;
        Ok(self.lock().principals.contains(&id))
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn find_roles(&self, principal: PrincipalId, target: ObjectRef) -> Result<Vec<Role>> {
        self.grant_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .lock()
            .grants
            .values()
            .filter(|g| g.user_id == principal && g.target() == Some(target))
            .map(|g| g.role)
            .collect())
    }

    async fn insert_grant(&self, grant: &NewGrant) -> Result<Grant> {
        self.check()?;
        Ok(self.insert_grant_raw(grant).await)
    }

    async fn get_grant(&self, id: Uuid) -> Result<Option<Grant>> {
        self.check()?;
        Ok(self.lock().grants.get(&id).cloned())
    }

    async fn list_grants(&self, target: ObjectRef) -> Result<Vec<Grant>> {
        self.check()?;
        let mut rows: Vec<Grant> = self
            .lock()
            .grants
            .values()
            .filter(|g| g.target() == Some(target))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn delete_grant(&self, id: Uuid) -> Result<bool> {
        self.check()?;
        Ok(self.lock().grants.remove(&id).is_some())
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn insert_share(&self, share: &NewShare) -> Result<Share> {
        self.check()?;
        let (file_id, folder_id) = share.target.as_pair();
        let share = Share {
            id: Uuid::new_v4(),
            token: share.token.clone(),
            file_id,
            folder_id,
            role: share.role,
            expires_at: share.expires_at,
            created_by: share.created_by,
            created_at: Utc::now(),
        };
        let mut state = self.lock();
        if state.shares.values().any(|s| s.token == share.token) {
            return Err(DriveError::Storage("duplicate share token".to_string()));
        }
        state.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>> {
        self.check()?;
        Ok(self
            .lock()
            .shares
            .values()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn delete_share(&self, id: Uuid, principal: PrincipalId) -> Result<bool> {
        self.check()?;
        let mut state = self.lock();
        match state.shares.get(&id) {
            Some(share) if share.created_by == principal => {
                state.shares.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_shares(
        &self,
        principal: PrincipalId,
        target: Option<ObjectRef>,
    ) -> Result<Vec<Share>> {
        self.check()?;
        let mut rows: Vec<Share> = self
            .lock()
            .shares
            .values()
            .filter(|s| s.created_by == principal)
            .filter(|s| target.is_none() || s.target() == target)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

/// Map-backed blob storage with opaque locators.
#[derive(Default)]
pub struct MemoryObjectStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_next: AtomicBool,
}

impl MemoryObjectStorage {
    /// Create an empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DriveError::Storage("injected failure".to_string()));
        }
        Ok(())
    }

    /// Make the next call return [`DriveError::Storage`].
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Contents stored at `path`.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, path: &str, content: &[u8]) -> Result<()> {
        self.check()?;
        self.lock().insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<bool> {
        self.check()?;
        Ok(self.lock().remove(path).is_some())
    }

    async fn create_locator(&self, path: &str, ttl: Duration) -> Result<String> {
        self.check()?;
        Ok(format!("memory://{path}?ttl={}", ttl.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_children_is_one_level_and_skips_trash() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let root = store.seed_folder(NewFolder::new("root", owner)).await;
        let child = store
            .seed_folder(NewFolder::new("child", owner).with_parent(root.id))
            .await;
        store
            .seed_folder(NewFolder::new("grandchild", owner).with_parent(child.id))
            .await;
        let visible = store.seed_file(owner, Some(root.id), "a.txt").await;
        let trashed = store.seed_file(owner, Some(root.id), "b.txt").await;
        store.set_file_trashed_raw(trashed.id, true);
        store.seed_file(owner, Some(child.id), "deep.txt").await;

        let children = store.list_children(root.id).await.unwrap();
        assert_eq!(children.folders, vec![child]);
        assert_eq!(children.files.len(), 1);
        assert_eq!(children.files[0].id, visible.id);
    }

    #[tokio::test]
    async fn test_fail_next_call_fails_once() {
        let store = MemoryStore::new();
        store.fail_next_call();
        assert!(matches!(
            store.get_file(Uuid::new_v4()).await,
            Err(DriveError::Storage(_))
        ));
        assert!(store.get_file(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_call_after_skips_earlier_calls() {
        let store = MemoryStore::new();
        store.fail_call_after(1);
        assert!(store.get_file(Uuid::new_v4()).await.is_ok());
        assert!(matches!(
            store.get_folder(Uuid::new_v4()).await,
            Err(DriveError::Storage(_))
        ));
        assert!(store.get_folder(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_has_children_counts_trash() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let empty = store.seed_folder(NewFolder::new("empty", owner)).await;
        let with_trash = store.seed_folder(NewFolder::new("trash", owner)).await;
        let with_folder = store.seed_folder(NewFolder::new("parent", owner)).await;
        let file = store.seed_file(owner, Some(with_trash.id), "old.txt").await;
        store.set_file_trashed_raw(file.id, true);
        store
            .seed_folder(NewFolder::new("child", owner).with_parent(with_folder.id))
            .await;

        assert!(!store.has_children(empty.id).await.unwrap());
        assert!(store.has_children(with_trash.id).await.unwrap());
        assert!(store.has_children(with_folder.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_share_only_by_creator() {
        let store = MemoryStore::new();
        let creator = Uuid::new_v4();
        let share = store
            .insert_share(&NewShare {
                token: "t".repeat(32),
                target: ObjectRef::File(Uuid::new_v4()),
                role: Default::default(),
                expires_at: None,
                created_by: creator,
            })
            .await
            .unwrap();

        assert!(!store.delete_share(share.id, Uuid::new_v4()).await.unwrap());
        assert!(store.delete_share(share.id, creator).await.unwrap());
        assert!(!store.delete_share(share.id, creator).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_files_paging() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for name in ["c", "a", "b"] {
            store.seed_file(owner, None, name).await;
        }
        store.seed_file(Uuid::new_v4(), None, "other").await;

        let query = ListQuery {
            sort: SortField::Name,
            ascending: true,
            limit: 2,
            ..Default::default()
        };
        let names: Vec<String> = store
            .list_files(owner, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_object_storage() {
        let storage = MemoryObjectStorage::new();
        storage.put("u/1.txt", b"hello").await.unwrap();
        assert_eq!(storage.get("u/1.txt").unwrap(), b"hello");
        let url = storage
            .create_locator("u/1.txt", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(url, "memory://u/1.txt?ttl=60");
        assert!(storage.remove("u/1.txt").await.unwrap());
        assert!(!storage.remove("u/1.txt").await.unwrap());
        assert!(storage.is_empty());
    }
}
