//! Role classification and permission checks
//!
//! Every request resolves to a [`Principal`] carrying an explicit [`RoleKind`].
//! A role name the system does not recognize maps to `Unknown`, and `Unknown`
//! is always denied — an unrecognized identity never falls through to
//! administrative scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{LaurelError, Result};

/// Permission names as stored in the permissions table
pub mod perms {
    pub const ACHIEVEMENT_READ: &str = "achievement:read";
    pub const ACHIEVEMENT_CREATE: &str = "achievement:create";
    pub const ACHIEVEMENT_UPDATE: &str = "achievement:update";
    pub const ACHIEVEMENT_DELETE: &str = "achievement:delete";
    pub const ACHIEVEMENT_VERIFY: &str = "achievement:verify";

    pub const USERS_READ: &str = "read:users";
    pub const USERS_CREATE: &str = "create:users";
    pub const USERS_UPDATE: &str = "update:users";
    pub const USERS_DELETE: &str = "delete:users";
    pub const USERS_UPDATE_ROLE: &str = "update_role:users";
}

/// The roles the workflow understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleKind {
    /// Submits and owns achievements
    Student,
    /// Verifies or rejects advisee submissions
    Advisor,
    /// Manages users and sees everything
    Admin,
    /// Role name not recognized; denied everywhere
    Unknown,
}

impl RoleKind {
    /// Classify a role name from the roles table
    pub fn from_name(name: &str) -> Self {
        match name {
            "Student" => RoleKind::Student,
            "Advisor" | "Lecturer" => RoleKind::Advisor,
            "Admin" => RoleKind::Admin,
            _ => RoleKind::Unknown,
        }
    }

    pub fn can_review(self) -> bool {
        matches!(self, RoleKind::Advisor | RoleKind::Admin)
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Student => write!(f, "Student"),
            RoleKind::Advisor => write!(f, "Advisor"),
            RoleKind::Admin => write!(f, "Admin"),
            RoleKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// The acting identity for one request, resolved from a verified token plus
/// the permission rows for its role. Never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role: RoleKind,
    pub permissions: Vec<String>,
}

impl Principal {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with `Forbidden` unless the principal holds the permission
    pub fn require_permission(&self, permission: &str) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(LaurelError::Forbidden(format!(
                "permission denied: {}",
                permission
            )))
        }
    }

    /// Fail with `Forbidden` unless the principal may verify/reject
    pub fn require_reviewer(&self) -> Result<()> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(LaurelError::Forbidden(
                "only advisors and admins may review achievements".into(),
            ))
        }
    }
}
