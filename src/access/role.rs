//! Role lattice: which role permits which action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DriveError, Result};

/// Role granted on a file or folder.
///
/// Ordered by privilege so that the most permissive of several grants is `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read only.
    Viewer = 0,
    /// Read and write.
    Editor = 1,
    /// Every action.
    Owner = 2,
}

/// Action requested on a file or folder.
///
/// Ordered by required privilege: read ⊆ write ⊆ delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// View metadata or content.
    Read,
    /// Rename, move, trash, restore.
    Write,
    /// Permanent deletion and grant management.
    Delete,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }

    /// Whether this role permits `action`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cloudrive::access::{Action, Role};
    ///
    /// assert!(Role::Owner.permits(Action::Delete));
    /// assert!(Role::Editor.permits(Action::Write));
    /// assert!(!Role::Viewer.permits(Action::Write));
    /// ```
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Owner => true,
            Role::Editor => matches!(action, Action::Read | Action::Write),
            Role::Viewer => action == Action::Read,
        }
    }
}

impl Action {
    /// Convert action to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DriveError;

    /// Parse a stored role. Matching is exact; anything else is [`DriveError::InvalidRole`].
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            _ => Err(DriveError::InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = DriveError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Evaluate a raw stored role value against an action.
///
/// Unknown role values fail with [`DriveError::InvalidRole`]; they never deny silently.
pub fn permits(role: &str, action: Action) -> Result<bool> {
    Ok(role.parse::<Role>()?.permits(action))
}
