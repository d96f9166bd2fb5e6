//! Direct role grants and their management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::access::{AccessResolver, Action, Role};
use crate::drive::{FileId, FolderId, ObjectRef, PrincipalId};
use crate::store::{GrantStore, PrincipalDirectory};
use crate::{DriveError, Result};

/// A role granted to one principal on one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Grant ID.
    pub id: Uuid,
    /// Grantee.
    pub user_id: PrincipalId,
    /// Target file.
    pub file_id: Option<FileId>,
    /// Target folder.
    pub folder_id: Option<FolderId>,
    /// Granted role.
    pub role: Role,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

impl Grant {
    /// The granted object, or None if the row is malformed.
    pub fn target(&self) -> Option<ObjectRef> {
        ObjectRef::from_pair(self.file_id, self.folder_id).ok()
    }
}

/// Data for creating a grant.
#[derive(Debug, Clone)]
pub struct NewGrant {
    /// Grantee.
    pub user_id: PrincipalId,
    /// Target object.
    pub target: ObjectRef,
    /// Granted role.
    pub role: Role,
}

/// Creates, lists and removes grants, gated by the resolver.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantStore>,
    resolver: AccessResolver,
    principals: Option<Arc<dyn PrincipalDirectory>>,
}

impl GrantService {
    /// Create a new grant service.
    pub fn new(grants: Arc<dyn GrantStore>, resolver: AccessResolver) -> Self {
        Self {
            grants,
            resolver,
            principals: None,
        }
    }

    /// Reject grants to principals `principals` does not know.
    pub fn with_principals(mut self, principals: Arc<dyn PrincipalDirectory>) -> Self {
        self.principals = Some(principals);
        self
    }

    /// Grant `role` on `target` to `user_id`. The caller needs delete access.
    ///
    /// The grantee is looked up only after access is resolved, so callers without
    /// access learn nothing about which principals exist.
    pub async fn grant(
        &self,
        principal: PrincipalId,
        user_id: PrincipalId,
        target: ObjectRef,
        role: Role,
    ) -> Result<Grant> {
        self.resolver
            .resolve(principal, target, Action::Delete)
            .await?
            .require(target.kind().as_str())?;

        if let Some(principals) = &self.principals {
            if !principals.principal_exists(user_id).await? {
                return Err(DriveError::InvalidRequest(
                    "target_user_id does not exist".to_string(),
                ));
            }
        }

        let grant = self
            .grants
            .insert_grant(&NewGrant {
                user_id,
                target,
                role,
            })
            .await?;

        info!(
            grant_id = %grant.id,
            %principal,
            grantee = %user_id,
            object = %target.id(),
            %role,
            "grant created"
        );
        Ok(grant)
    }

    /// List the grants on `target`. The caller needs read access.
    pub async fn list(&self, principal: PrincipalId, target: ObjectRef) -> Result<Vec<Grant>> {
        self.resolver
            .resolve(principal, target, Action::Read)
            .await?
            .require(target.kind().as_str())?;

        self.grants.list_grants(target).await
    }

    /// Remove a grant. The caller needs delete access on the grant's target.
    pub async fn revoke(&self, principal: PrincipalId, grant_id: Uuid) -> Result<()> {
        let grant = self
            .grants
            .get_grant(grant_id)
            .await?
            .ok_or_else(|| DriveError::NotFound("permission".to_string()))?;
        let target = grant
            .target()
            .ok_or_else(|| DriveError::NotFound("permission".to_string()))?;

        self.resolver
            .resolve(principal, target, Action::Delete)
            .await?
            .require(target.kind().as_str())?;

        if !self.grants.delete_grant(grant_id).await? {
            return Err(DriveError::NotFound("permission".to_string()));
        }

        info!(%grant_id, %principal, "grant revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::drive::NewFolder;

    fn service(store: &Arc<MemoryStore>) -> GrantService {
        GrantService::new(
            store.clone(),
            AccessResolver::new(store.clone(), store.clone()),
        )
    }

    #[tokio::test]
    async fn test_owner_grants_and_grantee_gains_access() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let file = store.seed_file(owner, None, "a.txt").await;
        let service = service(&store);

        let grant = service
            .grant(owner, user, ObjectRef::File(file.id), Role::Viewer)
            .await
            .unwrap();
        assert_eq!(grant.file_id, Some(file.id));
        assert_eq!(grant.role, Role::Viewer);

        let resolver = AccessResolver::new(store.clone(), store.clone());
        assert!(resolver
            .resolve_file(user, file.id, Action::Read)
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn test_editor_cannot_grant() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let folder = store.seed_folder(NewFolder::new("team", owner)).await;
        let target = ObjectRef::Folder(folder.id);
        let service = service(&store);
        service.grant(owner, editor, target, Role::Editor).await.unwrap();

        let result = service
            .grant(editor, Uuid::new_v4(), target, Role::Viewer)
            .await;
        assert!(matches!(result, Err(DriveError::Denied(_))));
    }

    #[tokio::test]
    async fn test_granted_owner_can_grant() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let co_owner = Uuid::new_v4();
        let file = store.seed_file(owner, None, "a.txt").await;
        let target = ObjectRef::File(file.id);
        let service = service(&store);
        service.grant(owner, co_owner, target, Role::Owner).await.unwrap();

        assert!(service
            .grant(co_owner, Uuid::new_v4(), target, Role::Viewer)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_list_requires_read() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let file = store.seed_file(owner, None, "a.txt").await;
        let target = ObjectRef::File(file.id);
        let service = service(&store);
        service.grant(owner, viewer, target, Role::Viewer).await.unwrap();

        assert_eq!(service.list(viewer, target).await.unwrap().len(), 1);
        assert!(matches!(
            service.list(Uuid::new_v4(), target).await,
            Err(DriveError::Denied(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let file = store.seed_file(owner, None, "a.txt").await;
        let target = ObjectRef::File(file.id);
        let service = service(&store);
        let grant = service.grant(owner, user, target, Role::Editor).await.unwrap();

        // The grantee cannot remove their own editor grant.
        assert!(matches!(
            service.revoke(user, grant.id).await,
            Err(DriveError::Denied(_))
        ));

        service.revoke(owner, grant.id).await.unwrap();
        assert!(service.list(owner, target).await.unwrap().is_empty());
        assert!(matches!(
            service.revoke(owner, grant.id).await,
            Err(DriveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_grantee_only_reported_to_authorized_callers() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let known = Uuid::new_v4();
        store.seed_principal(known);
        let file = store.seed_file(owner, None, "a.txt").await;
        let target = ObjectRef::File(file.id);
        let service = service(&store).with_principals(store.clone());

        assert!(matches!(
            service.grant(known, Uuid::new_v4(), target, Role::Viewer).await,
            Err(DriveError::Denied(_))
        ));
        assert!(matches!(
            service.grant(owner, Uuid::new_v4(), target, Role::Viewer).await,
            Err(DriveError::InvalidRequest(_))
        ));
        assert!(service.list(owner, target).await.unwrap().is_empty());

        service.grant(owner, known, target, Role::Viewer).await.unwrap();
    }

    #[tokio::test]
    async fn test_grant_on_missing_object() {
        let store = Arc::new(MemoryStore::new());
        let result = service(&store)
            .grant(
                Uuid::new_v4(),
                Uuid::new_v4(),
                ObjectRef::File(Uuid::new_v4()),
                Role::Viewer,
            )
            .await;
        assert!(matches!(result, Err(DriveError::NotFound(_))));
    }
}
