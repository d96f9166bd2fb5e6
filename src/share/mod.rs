//! Link-based sharing for cloudrive.
//!
//! A share is a bearer capability: whoever holds the token gets the share's role on
//! one file, or on one folder and (through [`ShareService::browse`]) its descendants,
//! without being an authenticated principal.

mod service;
pub mod token;

pub use service::{
    FileShareView, FolderShareView, PublicFile, PublicFolder, Revocation, ShareResolution,
    ShareService, ShareTarget,
};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Role;
use crate::drive::{FileId, FolderId, ObjectRef, PrincipalId};
use crate::{DriveError, Result};

/// Role a share link confers. Links can never confer ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    /// Read only.
    #[default]
    Viewer,
    /// Read and write.
    ///
    /// Currently inert: anonymous holders only ever receive read-only views.
    Editor,
}

impl ShareRole {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Viewer => "viewer",
            ShareRole::Editor => "editor",
        }
    }

    /// The equivalent lattice role.
    pub fn as_role(&self) -> Role {
        match self {
            ShareRole::Viewer => Role::Viewer,
            ShareRole::Editor => Role::Editor,
        }
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShareRole {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "viewer" => Ok(ShareRole::Viewer),
            "editor" => Ok(ShareRole::Editor),
            _ => Err(DriveError::InvalidRole(s.to_string())),
        }
    }
}

/// A stored share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    /// Share ID (used for revocation).
    pub id: Uuid,
    /// Bearer token.
    pub token: String,
    /// Shared file.
    pub file_id: Option<FileId>,
    /// Shared folder.
    pub folder_id: Option<FolderId>,
    /// Conferred role.
    pub role: ShareRole,
    /// Expiry (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Creating principal.
    pub created_by: PrincipalId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// The shared object, or None if the row is malformed.
    pub fn target(&self) -> Option<ObjectRef> {
        ObjectRef::from_pair(self.file_id, self.folder_id).ok()
    }

    /// Whether the share is expired at `now`. A share expiring exactly at `now` is expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Data for creating a share row.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// Bearer token.
    pub token: String,
    /// Shared object.
    pub target: ObjectRef,
    /// Conferred role.
    pub role: ShareRole,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creating principal.
    pub created_by: PrincipalId,
}
