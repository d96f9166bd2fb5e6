//! File and folder repositories.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::DbPool;
use crate::drive::{
    File, FileId, Folder, FolderChildren, FolderId, ListQuery, NewFile, NewFolder, PrincipalId,
    SortField,
};
use crate::Result;

const FILE_COLUMNS: &str =
    "id, name, folder_id, owner_id, size, mime_type, storage_path, is_trashed, created_at";

const FOLDER_COLUMNS: &str = "id, name, owner_id, parent_folder_id, created_at";

fn push_order(query: &mut QueryBuilder<'_, Sqlite>, list: &ListQuery, has_size: bool) {
    let column = match list.sort {
        SortField::Size if !has_size => SortField::CreatedAt.column(),
        sort => sort.column(),
    };
    let direction = if list.ascending { "ASC" } else { "DESC" };
    query.push(format!(" ORDER BY {column} {direction}, id {direction}"));
    query.push(" LIMIT ");
    query.push_bind(list.limit);
    query.push(" OFFSET ");
    query.push_bind(list.offset);
}

/// Repository for file rows.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a file row.
    pub async fn create(&self, new_file: &NewFile) -> Result<File> {
        let file = File {
            id: Uuid::new_v4(),
            name: new_file.name.clone(),
            folder_id: new_file.folder_id,
            owner_id: new_file.owner_id,
            size: new_file.size,
            mime_type: new_file.mime_type.clone(),
            storage_path: new_file.storage_path.clone(),
            is_trashed: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO files (id, name, folder_id, owner_id, size, mime_type, storage_path, is_trashed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file.id)
        .bind(&file.name)
        .bind(file.folder_id)
        .bind(file.owner_id)
        .bind(file.size)
        .bind(&file.mime_type)
        .bind(&file.storage_path)
        .bind(file.is_trashed)
        .bind(file.created_at)
        .execute(self.pool)
        .await?;

        Ok(file)
    }

    /// Get a file by ID, trashed or not.
    pub async fn get_by_id(&self, id: FileId) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(file)
    }

    /// Set the containing folder.
    pub async fn set_folder(&self, id: FileId, folder_id: Option<FolderId>) -> Result<Option<File>> {
        let result = sqlx::query("UPDATE files SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Rename a file.
    pub async fn rename(&self, id: FileId, name: &str) -> Result<Option<File>> {
        let result = sqlx::query("UPDATE files SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Set the trashed flag.
    pub async fn set_trashed(&self, id: FileId, trashed: bool) -> Result<Option<File>> {
        let result = sqlx::query("UPDATE files SET is_trashed = ? WHERE id = ?")
            .bind(trashed)
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a file row. Grants and shares on it cascade.
    pub async fn delete(&self, id: FileId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Non-trashed files directly inside a folder.
    pub async fn list_in_folder(&self, folder_id: FolderId) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE folder_id = ? AND is_trashed = 0 ORDER BY name"
        ))
        .bind(folder_id)
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// Non-trashed files owned by `owner` in `query.parent`.
    pub async fn list_by_owner(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<File>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE is_trashed = 0 AND owner_id = "
        ));
        builder.push_bind(owner);
        match query.parent {
            Some(parent) => {
                builder.push(" AND folder_id = ");
                builder.push_bind(parent);
            }
            None => {
                builder.push(" AND folder_id IS NULL");
            }
        }
        push_order(&mut builder, query, true);

        let files = builder
            .build_query_as::<File>()
            .fetch_all(self.pool)
            .await?;
        Ok(files)
    }

    /// Trashed files owned by `owner`, newest first.
    pub async fn list_trashed(&self, owner: PrincipalId) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ? AND is_trashed = 1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }
}

/// Repository for folder rows.
pub struct FolderRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a folder row.
    pub async fn create(&self, new_folder: &NewFolder) -> Result<Folder> {
        let folder = Folder {
            id: Uuid::new_v4(),
            name: new_folder.name.clone(),
            owner_id: new_folder.owner_id,
            parent_folder_id: new_folder.parent_folder_id,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO folders (id, name, owner_id, parent_folder_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.owner_id)
        .bind(folder.parent_folder_id)
        .bind(folder.created_at)
        .execute(self.pool)
        .await?;

        Ok(folder)
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: FolderId) -> Result<Option<Folder>> {
        let folder =
            sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(folder)
    }

    /// Set the parent folder.
    pub async fn set_parent(
        &self,
        id: FolderId,
        parent_id: Option<FolderId>,
    ) -> Result<Option<Folder>> {
        let result = sqlx::query("UPDATE folders SET parent_folder_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Rename a folder.
    pub async fn rename(&self, id: FolderId, name: &str) -> Result<Option<Folder>> {
        let result = sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a folder row.
    pub async fn delete(&self, id: FolderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Folders directly inside a folder.
    pub async fn list_children(&self, parent_id: FolderId) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_folder_id = ? ORDER BY name"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(folders)
    }

    /// Folders owned by `owner` under `query.parent`.
    pub async fn list_by_owner(&self, owner: PrincipalId, query: &ListQuery) -> Result<Vec<Folder>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = "
        ));
        builder.push_bind(owner);
        match query.parent {
            Some(parent) => {
                builder.push(" AND parent_folder_id = ");
                builder.push_bind(parent);
            }
            None => {
                builder.push(" AND parent_folder_id IS NULL");
            }
        }
        push_order(&mut builder, query, false);

        let folders = builder
            .build_query_as::<Folder>()
            .fetch_all(self.pool)
            .await?;
        Ok(folders)
    }

    /// Direct child folders and direct non-trashed child files.
    pub async fn children(&self, folder_id: FolderId) -> Result<FolderChildren> {
        let folders = self.list_children(folder_id).await?;
        let files = FileRepository::new(self.pool)
            .list_in_folder(folder_id)
            .await?;
        Ok(FolderChildren { folders, files })
    }

    /// Whether any folder or file, trashed or not, sits directly inside a folder.
    pub async fn has_children(&self, folder_id: FolderId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE parent_folder_id = ?)
                 OR EXISTS(SELECT 1 FROM files WHERE folder_id = ?)",
        )
        .bind(folder_id)
        .bind(folder_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
