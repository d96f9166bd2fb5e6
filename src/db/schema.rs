//! Database schema and migrations for cloudrive.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
/// IDs are UUIDs stored as 16-byte blobs; timestamps are bound from Rust.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table for authentication
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    name        TEXT,
    created_at  TEXT NOT NULL
);
"#,
    // v2: Folders and files
    r#"
CREATE TABLE folders (
    id                BLOB PRIMARY KEY,
    name              TEXT NOT NULL,
    owner_id          BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    parent_folder_id  BLOB REFERENCES folders(id) ON DELETE CASCADE,
    created_at        TEXT NOT NULL
);

CREATE INDEX idx_folders_owner_parent ON folders(owner_id, parent_folder_id);
CREATE INDEX idx_folders_parent ON folders(parent_folder_id);

CREATE TABLE files (
    id            BLOB PRIMARY KEY,
    name          TEXT NOT NULL,
    folder_id     BLOB REFERENCES folders(id) ON DELETE SET NULL,
    owner_id      BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    size          INTEGER NOT NULL,
    mime_type     TEXT NOT NULL,
    storage_path  TEXT NOT NULL,
    is_trashed    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX idx_files_owner_folder ON files(owner_id, folder_id);
CREATE INDEX idx_files_folder ON files(folder_id);
"#,
    // v3: Per-object role grants
    r#"
CREATE TABLE permissions (
    id          BLOB PRIMARY KEY,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    file_id     BLOB REFERENCES files(id) ON DELETE CASCADE,
    folder_id   BLOB REFERENCES folders(id) ON DELETE CASCADE,
    role        TEXT NOT NULL,           -- 'owner', 'editor', 'viewer'
    created_at  TEXT NOT NULL,
    CHECK ((file_id IS NULL) <> (folder_id IS NULL))
);

CREATE INDEX idx_permissions_user_file ON permissions(user_id, file_id);
CREATE INDEX idx_permissions_user_folder ON permissions(user_id, folder_id);
"#,
    // v4: Public share links
    r#"
CREATE TABLE shares (
    id          BLOB PRIMARY KEY,
    token       TEXT NOT NULL,
    file_id     BLOB REFERENCES files(id) ON DELETE CASCADE,
    folder_id   BLOB REFERENCES folders(id) ON DELETE CASCADE,
    role        TEXT NOT NULL DEFAULT 'viewer',  -- 'viewer', 'editor'
    expires_at  TEXT,                            -- NULL = never
    created_by  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    CHECK ((file_id IS NULL) <> (folder_id IS NULL))
);

CREATE UNIQUE INDEX idx_shares_token ON shares(token);
CREATE INDEX idx_shares_created_by ON shares(created_by);
"#,
];
