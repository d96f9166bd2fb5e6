//! Share repository.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::drive::{FileId, FolderId, ObjectRef, PrincipalId};
use crate::share::{NewShare, Share, ShareRole};
use crate::{DriveError, Result};

const SHARE_COLUMNS: &str =
    "id, token, file_id, folder_id, role, expires_at, created_by, created_at";

/// Share row as stored.
#[derive(Debug, sqlx::FromRow)]
struct ShareRow {
    id: Uuid,
    token: String,
    file_id: Option<FileId>,
    folder_id: Option<FolderId>,
    role: String,
    expires_at: Option<DateTime<Utc>>,
    created_by: PrincipalId,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShareRow> for Share {
    type Error = DriveError;

    fn try_from(row: ShareRow) -> Result<Self> {
        Ok(Share {
            id: row.id,
            token: row.token,
            file_id: row.file_id,
            folder_id: row.folder_id,
            role: ShareRole::from_str(&row.role)?,
            expires_at: row.expires_at,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Repository for share rows.
pub struct ShareRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a share.
    pub async fn create(&self, new_share: &NewShare) -> Result<Share> {
        let (file_id, folder_id) = new_share.target.as_pair();
        let share = Share {
            id: Uuid::new_v4(),
            token: new_share.token.clone(),
            file_id,
            folder_id,
            role: new_share.role,
            expires_at: new_share.expires_at,
            created_by: new_share.created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO shares (id, token, file_id, folder_id, role, expires_at, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(share.id)
        .bind(&share.token)
        .bind(share.file_id)
        .bind(share.folder_id)
        .bind(share.role.as_str())
        .bind(share.expires_at)
        .bind(share.created_by)
        .bind(share.created_at)
        .execute(self.pool)
        .await?;

        Ok(share)
    }

    /// Find a share by exact token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Share>> {
        let row = sqlx::query_as::<_, ShareRow>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(Share::try_from).transpose()
    }

    /// Delete a share if it was created by `created_by`.
    pub async fn delete(&self, id: Uuid, created_by: PrincipalId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(created_by)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Shares created by `created_by`, newest first, optionally for one object.
    pub async fn list_by_creator(
        &self,
        created_by: PrincipalId,
        target: Option<ObjectRef>,
    ) -> Result<Vec<Share>> {
        let rows = match target {
            None => {
                sqlx::query_as::<_, ShareRow>(&format!(
                    "SELECT {SHARE_COLUMNS} FROM shares WHERE created_by = ? ORDER BY created_at DESC"
                ))
                .bind(created_by)
                .fetch_all(self.pool)
                .await?
            }
            Some(target) => {
                let column = match target {
                    ObjectRef::File(_) => "file_id",
                    ObjectRef::Folder(_) => "folder_id",
                };
                sqlx::query_as::<_, ShareRow>(&format!(
                    "SELECT {SHARE_COLUMNS} FROM shares WHERE created_by = ? AND {column} = ?
                     ORDER BY created_at DESC"
                ))
                .bind(created_by)
                .bind(target.id())
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(Share::try_from).collect()
    }
}
