//! Grant repository.
//!
//! Roles are stored as text and decoded through [`Role::from_str`], so an unknown
//! value in the table surfaces as [`DriveError::InvalidRole`] instead of a decision.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::access::{Grant, NewGrant, Role};
use crate::drive::{FileId, FolderId, ObjectRef, PrincipalId};
use crate::{DriveError, Result};

/// Grant row as stored.
#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    id: Uuid,
    user_id: PrincipalId,
    file_id: Option<FileId>,
    folder_id: Option<FolderId>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for Grant {
    type Error = DriveError;

    fn try_from(row: GrantRow) -> Result<Self> {
        Ok(Grant {
            id: row.id,
            user_id: row.user_id,
            file_id: row.file_id,
            folder_id: row.folder_id,
            role: Role::from_str(&row.role)?,
            created_at: row.created_at,
        })
    }
}

/// Repository for grant rows.
pub struct GrantRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> GrantRepository<'a> {
    /// Create a new GrantRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a grant.
    pub async fn create(&self, new_grant: &NewGrant) -> Result<Grant> {
        let (file_id, folder_id) = new_grant.target.as_pair();
        let grant = Grant {
            id: Uuid::new_v4(),
            user_id: new_grant.user_id,
            file_id,
            folder_id,
            role: new_grant.role,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO permissions (id, user_id, file_id, folder_id, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(grant.id)
        .bind(grant.user_id)
        .bind(grant.file_id)
        .bind(grant.folder_id)
        .bind(grant.role.as_str())
        .bind(grant.created_at)
        .execute(self.pool)
        .await?;

        Ok(grant)
    }

    /// Get a grant by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Grant>> {
        let row = sqlx::query_as::<_, GrantRow>(
            "SELECT id, user_id, file_id, folder_id, role, created_at FROM permissions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Grant::try_from).transpose()
    }

    /// Roles held by `user_id` directly on `target`.
    pub async fn find_roles(&self, user_id: PrincipalId, target: ObjectRef) -> Result<Vec<Role>> {
        let sql = match target {
            ObjectRef::File(_) => "SELECT role FROM permissions WHERE user_id = ? AND file_id = ?",
            ObjectRef::Folder(_) => {
                "SELECT role FROM permissions WHERE user_id = ? AND folder_id = ?"
            }
        };

        let roles: Vec<String> = sqlx::query_scalar(sql)
            .bind(user_id)
            .bind(target.id())
            .fetch_all(self.pool)
            .await?;

        roles.iter().map(|role| Role::from_str(role)).collect()
    }

    /// All grants on `target`, oldest first.
    pub async fn list_for(&self, target: ObjectRef) -> Result<Vec<Grant>> {
        let sql = match target {
            ObjectRef::File(_) => {
                "SELECT id, user_id, file_id, folder_id, role, created_at
                 FROM permissions WHERE file_id = ? ORDER BY created_at"
            }
            ObjectRef::Folder(_) => {
                "SELECT id, user_id, file_id, folder_id, role, created_at
                 FROM permissions WHERE folder_id = ? ORDER BY created_at"
            }
        };

        let rows = sqlx::query_as::<_, GrantRow>(sql)
            .bind(target.id())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Grant::try_from).collect()
    }

    /// Delete a grant.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
