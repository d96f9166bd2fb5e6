//! The access resolver: ownership, then direct grants, then deny.

use std::sync::Arc;

use tracing::debug;

use crate::access::Action;
use crate::drive::{DriveObject, File, FileId, Folder, FolderId, ObjectRef, PrincipalId};
use crate::store::{GrantStore, ObjectDirectory};
use crate::{DriveError, Result};

/// Outcome of an access decision.
///
/// `Deny` and `NotFound` are distinct here so callers can log them, but both must be
/// rendered identically to end users so object existence does not leak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    /// Access granted; carries the fetched object.
    Allow(T),
    /// The object exists but the principal lacks a sufficient role.
    Deny,
    /// The object does not exist.
    NotFound,
}

impl<T> Access<T> {
    /// Whether access was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow(_))
    }

    /// The object if access was granted.
    pub fn allowed(self) -> Option<T> {
        match self {
            Access::Allow(t) => Some(t),
            _ => None,
        }
    }

    /// Map the allowed object.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Access<U> {
        match self {
            Access::Allow(t) => Access::Allow(f(t)),
            Access::Deny => Access::Deny,
            Access::NotFound => Access::NotFound,
        }
    }

    /// Turn the decision into a result, naming the object in the error.
    pub fn require(self, what: &str) -> Result<T> {
        match self {
            Access::Allow(t) => Ok(t),
            Access::Deny => Err(DriveError::Denied(what.to_string())),
            Access::NotFound => Err(DriveError::NotFound(what.to_string())),
        }
    }
}

/// Decides whether a principal may perform an action on a file or folder.
///
/// Each call performs exactly one directory lookup and at most one grant lookup. It
/// never walks folder ancestry and has no side effects.
#[derive(Clone)]
pub struct AccessResolver {
    directory: Arc<dyn ObjectDirectory>,
    grants: Arc<dyn GrantStore>,
}

impl AccessResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(directory: Arc<dyn ObjectDirectory>, grants: Arc<dyn GrantStore>) -> Self {
        Self { directory, grants }
    }

    /// Resolve access to any object.
    pub async fn resolve(
        &self,
        principal: PrincipalId,
        target: ObjectRef,
        action: Action,
    ) -> Result<Access<DriveObject>> {
        match target {
            ObjectRef::File(id) => Ok(self
                .resolve_file(principal, id, action)
                .await?
                .map(DriveObject::File)),
            ObjectRef::Folder(id) => Ok(self
                .resolve_folder(principal, id, action)
                .await?
                .map(DriveObject::Folder)),
        }
    }

    /// Resolve access to a file.
    pub async fn resolve_file(
        &self,
        principal: PrincipalId,
        id: FileId,
        action: Action,
    ) -> Result<Access<File>> {
        let Some(file) = self.directory.get_file(id).await? else {
            debug!(%principal, file_id = %id, "file not found");
            return Ok(Access::NotFound);
        };
        let owner = file.owner_id;
        self.decide(principal, owner, ObjectRef::File(id), file, action)
            .await
    }

    /// Resolve access to a folder.
    pub async fn resolve_folder(
        &self,
        principal: PrincipalId,
        id: FolderId,
        action: Action,
    ) -> Result<Access<Folder>> {
        let Some(folder) = self.directory.get_folder(id).await? else {
            debug!(%principal, folder_id = %id, "folder not found");
            return Ok(Access::NotFound);
        };
        let owner = folder.owner_id;
        self.decide(principal, owner, ObjectRef::Folder(id), folder, action)
            .await
    }

    async fn decide<T>(
        &self,
        principal: PrincipalId,
        owner: PrincipalId,
        target: ObjectRef,
        object: T,
        action: Action,
    ) -> Result<Access<T>> {
        if owner == principal {
            return Ok(Access::Allow(object));
        }

        let roles = self.grants.find_roles(principal, target).await?;
        let Some(role) = roles.into_iter().max() else {
            debug!(%principal, object = %target.id(), %action, "no grant");
            return Ok(Access::Deny);
        };

        if role.permits(action) {
            Ok(Access::Allow(object))
        } else {
            debug!(%principal, object = %target.id(), %role, %action, "role does not permit action");
            Ok(Access::Deny)
        }
    }
}
