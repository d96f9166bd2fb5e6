//! Request DTOs for Web API.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::access::Role;
use crate::drive::{ListQuery, SortField};
use crate::share::ShareRole;

/// Largest page size accepted by listing endpoints.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "Must be 8 to 128 characters"))]
    pub password: String,
    /// Display name (optional).
    #[serde(default)]
    #[validate(length(max = 100, message = "Must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Folder creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Must be 1 to 255 characters"))]
    pub name: String,
    /// Parent folder (omit for the root).
    #[serde(default)]
    pub parent_folder_id: Option<Uuid>,
}

/// Rename request for files and folders.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Must be 1 to 255 characters"))]
    pub name: String,
}

/// File move request. A null destination moves the file to the root.
#[derive(Debug, Deserialize, Validate)]
pub struct MoveFileRequest {
    /// Destination folder.
    #[serde(default)]
    pub new_folder_id: Option<Uuid>,
}

/// Folder move request. A null parent moves the folder to the root.
#[derive(Debug, Deserialize, Validate)]
pub struct MoveFolderRequest {
    /// New parent folder.
    #[serde(default)]
    pub new_parent_id: Option<Uuid>,
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// Query parameters for `GET /api/files` and `GET /api/folders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Folder to list (omit for the root).
    pub parent: Option<Uuid>,
    /// Page size (default 20, max 100).
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
    /// Sort column.
    pub sort: Option<SortField>,
    /// Sort direction.
    pub order: Option<SortOrder>,
}

impl ListParams {
    /// Convert to a clamped listing query.
    pub fn to_query(&self) -> ListQuery {
        let defaults = ListQuery::default();
        ListQuery {
            parent: self.parent,
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
            sort: self.sort.unwrap_or(defaults.sort),
            ascending: self.order.unwrap_or_default() == SortOrder::Asc,
        }
    }
}

/// Grant creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    /// User receiving the role.
    pub target_user_id: Uuid,
    /// Target file.
    #[serde(default)]
    pub file_id: Option<Uuid>,
    /// Target folder.
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    /// Granted role.
    pub role: Role,
}

/// Target selector used by `GET /api/permissions` and `GET /api/shares`.
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    /// File ID.
    pub file_id: Option<Uuid>,
    /// Folder ID.
    pub folder_id: Option<Uuid>,
}

impl TargetQuery {
    /// Whether neither field is set.
    pub fn is_empty(&self) -> bool {
        self.file_id.is_none() && self.folder_id.is_none()
    }
}

/// Share link creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShareRequest {
    /// File to share.
    #[serde(default)]
    pub file_id: Option<Uuid>,
    /// Folder to share.
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    /// Conferred role (default viewer).
    #[serde(default)]
    pub role: ShareRole,
    /// Lifetime in seconds (omit for a link that never expires).
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Query parameters of a signed blob URL.
#[derive(Debug, Deserialize)]
pub struct BlobQuery {
    /// Unix expiry timestamp.
    pub expires: i64,
    /// Hex HMAC signature.
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let query = ListParams::default().to_query();
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert!(!query.ascending);
        assert!(query.parent.is_none());
    }

    #[test]
    fn test_list_params_clamped() {
        let params = ListParams {
            limit: Some(10_000),
            offset: Some(-5),
            order: Some(SortOrder::Asc),
            sort: Some(SortField::Name),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.offset, 0);
        assert_eq!(query.sort, SortField::Name);
        assert!(query.ascending);

        let params = ListParams {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(params.to_query().limit, 1);
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
            name: Some("Alice".to_string()),
        };
        assert!(valid.validate().is_ok());

        let invalid = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };
        let errors = invalid.validate().unwrap_err();
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        assert!(fields.contains(&"email".to_string()));
        assert!(fields.contains(&"password".to_string()));
    }

    #[test]
    fn test_create_share_request_defaults() {
        let req: CreateShareRequest =
            serde_json::from_str(r#"{"file_id":"6f1c1f38-9a43-4c57-8a51-2d6a3c0e9b11"}"#).unwrap();
        assert_eq!(req.role, ShareRole::Viewer);
        assert!(req.expires_in.is_none());
        assert!(req.folder_id.is_none());
    }

    #[test]
    fn test_create_permission_request_rejects_unknown_role() {
        let result: Result<CreatePermissionRequest, _> = serde_json::from_str(
            r#"{"target_user_id":"6f1c1f38-9a43-4c57-8a51-2d6a3c0e9b11","role":"admin"}"#,
        );
        assert!(result.is_err());
    }
}
