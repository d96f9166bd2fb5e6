//! Share issuing, resolution and revocation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{ancestry_of, AccessResolver, Action, Ancestry};
use crate::drive::{File, FileId, Folder, FolderChildren, FolderId, ObjectRef, PrincipalId};
use crate::share::token::{generate_token, is_well_formed, tokens_match};
use crate::share::{NewShare, Share, ShareRole};
use crate::store::{ObjectDirectory, ObjectStorage, ShareStore};
use crate::{DriveError, Result};

/// Raw share target as supplied by a caller. Exactly one field must be set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ShareTarget {
    /// File to share.
    pub file_id: Option<FileId>,
    /// Folder to share.
    pub folder_id: Option<FolderId>,
}

impl ShareTarget {
    /// Target a file.
    pub fn file(id: FileId) -> Self {
        Self {
            file_id: Some(id),
            folder_id: None,
        }
    }

    /// Target a folder.
    pub fn folder(id: FolderId) -> Self {
        Self {
            file_id: None,
            folder_id: Some(id),
        }
    }
}

/// File metadata exposed to anonymous link holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicFile {
    pub id: FileId,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<File> for PublicFile {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            name: file.name,
            size: file.size,
            mime_type: file.mime_type,
            created_at: file.created_at,
        }
    }
}

/// Folder metadata exposed to anonymous link holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicFolder {
    pub id: FolderId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Folder> for PublicFolder {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            created_at: folder.created_at,
        }
    }
}

/// What a file link shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileShareView {
    /// Role carried by the link.
    pub role: ShareRole,
    /// File metadata.
    pub file: PublicFile,
    /// Time-limited download URL.
    pub url: String,
}

/// What a folder link shows: one level of the folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderShareView {
    /// Role carried by the link.
    pub role: ShareRole,
    /// The listed folder.
    pub folder: PublicFolder,
    /// Direct child folders.
    pub folders: Vec<PublicFolder>,
    /// Direct non-trashed child files.
    pub files: Vec<PublicFile>,
}

/// Outcome of presenting a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareResolution {
    /// Unknown token, malformed row, missing target, or a path outside the share.
    Invalid,
    /// The share exists but has expired.
    Expired,
    /// A file share.
    File(FileShareView),
    /// A folder share (or a folder inside it).
    Folder(FolderShareView),
}

/// Outcome of a revoke request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revocation {
    /// The share was deleted.
    Revoked,
    /// No share with that ID was created by the caller.
    NotFound,
}

/// Issues and resolves bearer share links.
#[derive(Clone)]
pub struct ShareService {
    shares: Arc<dyn ShareStore>,
    directory: Arc<dyn ObjectDirectory>,
    storage: Arc<dyn ObjectStorage>,
    resolver: AccessResolver,
    locator_ttl: Duration,
}

impl ShareService {
    /// Download URLs handed to link holders are valid for this long by default.
    pub const DEFAULT_LOCATOR_TTL: Duration = Duration::from_secs(600);

    /// Create a new share service.
    pub fn new(
        shares: Arc<dyn ShareStore>,
        directory: Arc<dyn ObjectDirectory>,
        storage: Arc<dyn ObjectStorage>,
        resolver: AccessResolver,
    ) -> Self {
        Self {
            shares,
            directory,
            storage,
            resolver,
            locator_ttl: Self::DEFAULT_LOCATOR_TTL,
        }
    }

    /// Set the lifetime of download URLs.
    pub fn with_locator_ttl(mut self, ttl: Duration) -> Self {
        self.locator_ttl = ttl;
        self
    }

    /// Issue a link to a file or folder.
    ///
    /// `ttl_secs` of `None` creates a link that never expires; `Some(0)` creates a link
    /// that is already expired.
    pub async fn issue(
        &self,
        principal: PrincipalId,
        target: ShareTarget,
        role: ShareRole,
        ttl_secs: Option<u64>,
    ) -> Result<Share> {
        let target = ObjectRef::from_pair(target.file_id, target.folder_id)?;

        self.resolver
            .resolve(principal, target, Action::Write)
            .await?
            .require(target.kind().as_str())?;

        let now = Utc::now();
        let expires_at = match ttl_secs {
            Some(secs) => Some(
                i64::try_from(secs)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
                    .ok_or_else(|| DriveError::InvalidRequest("ttl is too large".to_string()))?,
            ),
            None => None,
        };

        let share = self
            .shares
            .insert_share(&NewShare {
                token: generate_token(),
                target,
                role,
                expires_at,
                created_by: principal,
            })
            .await?;

        info!(
            share_id = %share.id,
            %principal,
            kind = target.kind().as_str(),
            object = %target.id(),
            %role,
            "share issued"
        );
        Ok(share)
    }

    /// Resolve a presented token to what it grants.
    pub async fn resolve(&self, token: &str) -> Result<ShareResolution> {
        let Some((share, target)) = self.lookup(token).await? else {
            return Ok(ShareResolution::Invalid);
        };
        if share.is_expired_at(Utc::now()) {
            debug!(share_id = %share.id, "share expired");
            return Ok(ShareResolution::Expired);
        }

        match target {
            ObjectRef::File(id) => self.file_view(&share, id).await,
            ObjectRef::Folder(id) => self.folder_view(&share, id).await,
        }
    }

    /// List `folder_id` through a folder link.
    ///
    /// `folder_id` must be the shared folder or one of its descendants.
    pub async fn browse(&self, token: &str, folder_id: FolderId) -> Result<ShareResolution> {
        let Some((share, target)) = self.lookup(token).await? else {
            return Ok(ShareResolution::Invalid);
        };
        if share.is_expired_at(Utc::now()) {
            return Ok(ShareResolution::Expired);
        }
        let ObjectRef::Folder(root_id) = target else {
            return Ok(ShareResolution::Invalid);
        };

        let ancestry = ancestry_of(self.directory.as_ref(), folder_id, root_id).await?;
        if ancestry != Ancestry::Within {
            warn!(share_id = %share.id, %folder_id, "browse outside shared folder");
            return Ok(ShareResolution::Invalid);
        }
        self.folder_view(&share, folder_id).await
    }

    /// Delete a link created by `principal`.
    pub async fn revoke(&self, principal: PrincipalId, share_id: Uuid) -> Result<Revocation> {
        if self.shares.delete_share(share_id, principal).await? {
            info!(%share_id, %principal, "share revoked");
            Ok(Revocation::Revoked)
        } else {
            Ok(Revocation::NotFound)
        }
    }

    /// Links created by `principal`, optionally restricted to one object.
    pub async fn list(
        &self,
        principal: PrincipalId,
        target: Option<ObjectRef>,
    ) -> Result<Vec<Share>> {
        self.shares.list_shares(principal, target).await
    }

    async fn lookup(&self, token: &str) -> Result<Option<(Share, ObjectRef)>> {
        if !is_well_formed(token) {
            return Ok(None);
        }
        let Some(share) = self.shares.find_by_token(token).await? else {
            return Ok(None);
        };
        if !tokens_match(&share.token, token) {
            return Ok(None);
        }
        let Some(target) = share.target() else {
            warn!(share_id = %share.id, "share row has no single target");
            return Ok(None);
        };
        Ok(Some((share, target)))
    }

    async fn file_view(&self, share: &Share, id: FileId) -> Result<ShareResolution> {
        let file = match self.directory.get_file(id).await? {
            Some(file) if !file.is_trashed => file,
            _ => return Ok(ShareResolution::Invalid),
        };
        let url = self
            .storage
            .create_locator(&file.storage_path, self.locator_ttl)
            .await?;

        Ok(ShareResolution::File(FileShareView {
            role: share.role,
            file: file.into(),
            url,
        }))
    }

    async fn folder_view(&self, share: &Share, id: FolderId) -> Result<ShareResolution> {
        let Some(folder) = self.directory.get_folder(id).await? else {
            return Ok(ShareResolution::Invalid);
        };
        let FolderChildren { folders, files } = self.directory.list_children(id).await?;

        Ok(ShareResolution::Folder(FolderShareView {
            role: share.role,
            folder: folder.into(),
            folders: folders.into_iter().map(Into::into).collect(),
            files: files
                .into_iter()
                .filter(|f| !f.is_trashed)
                .map(Into::into)
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{NewGrant, Role};
    use crate::drive::NewFolder;
    use crate::share::token::TOKEN_LENGTH;
    use crate::store::{MemoryObjectStorage, MemoryStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ShareService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryObjectStorage::new());
        let resolver = AccessResolver::new(store.clone(), store.clone());
        let service = ShareService::new(store.clone(), store.clone(), storage, resolver);
        Fixture { store, service }
    }

    fn file_view(resolution: ShareResolution) -> FileShareView {
        match resolution {
            ShareResolution::File(view) => view,
            other => panic!("expected file view, got {other:?}"),
        }
    }

    fn folder_view(resolution: ShareResolution) -> FolderShareView {
        match resolution {
            ShareResolution::Folder(view) => view,
            other => panic!("expected folder view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issue_and_resolve_file() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "report.pdf").await;

        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .unwrap();
        assert_eq!(share.token.len(), TOKEN_LENGTH);
        assert_eq!(share.file_id, Some(file.id));
        assert!(share.expires_at.is_none());

        let view = file_view(f.service.resolve(&share.token).await.unwrap());
        assert_eq!(view.file.name, "report.pdf");
        assert_eq!(view.role, ShareRole::Viewer);
        assert_eq!(view.url, format!("memory://{}?ttl=600", file.storage_path));
    }

    #[tokio::test]
    async fn test_issue_requires_exactly_one_target() {
        let f = fixture();
        let owner = Uuid::new_v4();

        let both = ShareTarget {
            file_id: Some(Uuid::new_v4()),
            folder_id: Some(Uuid::new_v4()),
        };
        let err = f
            .service
            .issue(owner, both, ShareRole::Viewer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::InvalidRequest(_)));

        let err = f
            .service
            .issue(owner, ShareTarget::default(), ShareRole::Viewer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::InvalidRequest(_)));

        // Validation happens before any lookup.
        assert_eq!(f.store.directory_lookups(), 0);
    }

    #[tokio::test]
    async fn test_issue_requires_write_access() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;
        for (user, role) in [(viewer, Role::Viewer), (editor, Role::Editor)] {
            f.store
                .insert_grant_raw(&NewGrant {
                    user_id: user,
                    target: ObjectRef::File(file.id),
                    role,
                })
                .await;
        }

        let err = f
            .service
            .issue(viewer, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Denied(_)));

        assert!(f
            .service
            .issue(editor, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .is_ok());

        let err = f
            .service
            .issue(owner, ShareTarget::file(Uuid::new_v4()), ShareRole::Viewer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediately_expired() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;

        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, Some(0))
            .await
            .unwrap();
        assert_eq!(
            f.service.resolve(&share.token).await.unwrap(),
            ShareResolution::Expired
        );
    }

    #[tokio::test]
    async fn test_past_expiry_is_expired_and_future_is_not() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;

        let mut share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, Some(3600))
            .await
            .unwrap();
        assert!(matches!(
            f.service.resolve(&share.token).await.unwrap(),
            ShareResolution::File(_)
        ));

        share.id = Uuid::new_v4();
        share.token = generate_token();
        share.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        f.store.insert_share_raw(share.clone());
        assert_eq!(
            f.service.resolve(&share.token).await.unwrap(),
            ShareResolution::Expired
        );
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens_are_invalid() {
        let f = fixture();
        assert_eq!(
            f.service.resolve(&generate_token()).await.unwrap(),
            ShareResolution::Invalid
        );
        assert_eq!(f.service.resolve("").await.unwrap(), ShareResolution::Invalid);
        assert_eq!(
            f.service.resolve("../../etc/passwd").await.unwrap(),
            ShareResolution::Invalid
        );
    }

    #[tokio::test]
    async fn test_trashed_or_deleted_file_is_invalid() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;
        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .unwrap();

        f.store.set_file_trashed_raw(file.id, true);
        assert_eq!(
            f.service.resolve(&share.token).await.unwrap(),
            ShareResolution::Invalid
        );
    }

    #[tokio::test]
    async fn test_editor_share_on_file_is_still_read_only_view() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;
        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Editor, None)
            .await
            .unwrap();

        let view = file_view(f.service.resolve(&share.token).await.unwrap());
        assert_eq!(view.role, ShareRole::Editor);
        assert_eq!(view.file.id, file.id);
    }

    #[tokio::test]
    async fn test_folder_share_lists_direct_children_only() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let root = f.store.seed_folder(NewFolder::new("root", owner)).await;
        let child = f
            .store
            .seed_folder(NewFolder::new("child", owner).with_parent(root.id))
            .await;
        let grandchild = f
            .store
            .seed_folder(NewFolder::new("grandchild", owner).with_parent(child.id))
            .await;
        f.store.seed_file(owner, Some(root.id), "visible.txt").await;
        let trashed = f.store.seed_file(owner, Some(root.id), "trashed.txt").await;
        f.store.set_file_trashed_raw(trashed.id, true);
        f.store.seed_file(owner, Some(child.id), "deep.txt").await;

        let share = f
            .service
            .issue(owner, ShareTarget::folder(root.id), ShareRole::Viewer, None)
            .await
            .unwrap();
        let view = folder_view(f.service.resolve(&share.token).await.unwrap());

        assert_eq!(view.folder.id, root.id);
        let folder_ids: Vec<_> = view.folders.iter().map(|f| f.id).collect();
        assert_eq!(folder_ids, vec![child.id]);
        assert!(!folder_ids.contains(&grandchild.id));
        let names: Vec<_> = view.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["visible.txt"]);
    }

    #[tokio::test]
    async fn test_browse_descendant_and_reject_sibling() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let root = f.store.seed_folder(NewFolder::new("root", owner)).await;
        let child = f
            .store
            .seed_folder(NewFolder::new("child", owner).with_parent(root.id))
            .await;
        f.store.seed_file(owner, Some(child.id), "deep.txt").await;
        let sibling = f.store.seed_folder(NewFolder::new("private", owner)).await;

        let share = f
            .service
            .issue(owner, ShareTarget::folder(root.id), ShareRole::Viewer, None)
            .await
            .unwrap();

        let view = folder_view(f.service.browse(&share.token, child.id).await.unwrap());
        assert_eq!(view.folder.id, child.id);
        assert_eq!(view.files.len(), 1);

        assert_eq!(
            f.service.browse(&share.token, sibling.id).await.unwrap(),
            ShareResolution::Invalid
        );
    }

    #[tokio::test]
    async fn test_browse_through_file_share_is_invalid() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let folder = f.store.seed_folder(NewFolder::new("root", owner)).await;
        let file = f.store.seed_file(owner, Some(folder.id), "a.txt").await;
        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .unwrap();

        assert_eq!(
            f.service.browse(&share.token, folder.id).await.unwrap(),
            ShareResolution::Invalid
        );
    }

    #[tokio::test]
    async fn test_revoke() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let file = f.store.seed_file(owner, None, "a.txt").await;
        let share = f
            .service
            .issue(owner, ShareTarget::file(file.id), ShareRole::Viewer, None)
            .await
            .unwrap();

        assert_eq!(
            f.service.revoke(Uuid::new_v4(), share.id).await.unwrap(),
            Revocation::NotFound
        );
        assert_eq!(
            f.service.revoke(owner, share.id).await.unwrap(),
            Revocation::Revoked
        );
        assert_eq!(
            f.service.revoke(owner, share.id).await.unwrap(),
            Revocation::NotFound
        );
        assert_eq!(
            f.service.resolve(&share.token).await.unwrap(),
            ShareResolution::Invalid
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_creator_and_target() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let a = f.store.seed_file(owner, None, "a.txt").await;
        let b = f.store.seed_file(owner, None, "b.txt").await;
        for id in [a.id, a.id, b.id] {
            f.service
                .issue(owner, ShareTarget::file(id), ShareRole::Viewer, None)
                .await
                .unwrap();
        }

        assert_eq!(f.service.list(owner, None).await.unwrap().len(), 3);
        assert_eq!(
            f.service
                .list(owner, Some(ObjectRef::File(a.id)))
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(f.service.list(Uuid::new_v4(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let f = fixture();
        f.store.fail_next_call();
        let result = f.service.resolve(&generate_token()).await;
        assert!(matches!(result, Err(DriveError::Storage(_))));
    }
}
