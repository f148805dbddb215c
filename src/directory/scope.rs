//! Role-scope resolution
//!
//! Maps a principal to the set of students it may see: a student sees itself,
//! an advisor sees its advisees, an admin sees everyone. The role tag comes
//! from the identity claims, never inferred by elimination — an unrecognized
//! role is denied rather than silently widened to administrative scope.

use std::sync::Arc;

use uuid::Uuid;

use super::{PersonDirectory, Student};
use crate::auth::{Principal, RoleKind};
use crate::types::{LaurelError, Result};

/// The students a principal is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleScope {
    /// A student's own record
    Own(Uuid),
    /// An advisor's advisees (may be empty)
    Advisees(Vec<Uuid>),
    /// Administrative: no student filter
    All,
}

#[derive(Clone)]
pub struct ScopeResolver {
    directory: Arc<dyn PersonDirectory>,
}

impl ScopeResolver {
    pub fn new(directory: Arc<dyn PersonDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve the student-id scope for a principal
    pub async fn resolve(&self, principal: &Principal) -> Result<RoleScope> {
        match principal.role {
            RoleKind::Student => {
                let student = self
                    .directory
                    .find_student_by_user_id(principal.user_id)
                    .await?
                    .ok_or_else(|| {
                        LaurelError::Forbidden("no student profile for this account".into())
                    })?;
                Ok(RoleScope::Own(student.id))
            }
            RoleKind::Advisor => {
                let lecturer = self
                    .directory
                    .find_lecturer_by_user_id(principal.user_id)
                    .await?
                    .ok_or_else(|| {
                        LaurelError::Forbidden("no lecturer profile for this account".into())
                    })?;
                let advisees = self.directory.advisee_student_ids(lecturer.id).await?;
                Ok(RoleScope::Advisees(advisees))
            }
            RoleKind::Admin => Ok(RoleScope::All),
            RoleKind::Unknown => Err(LaurelError::Forbidden("unrecognized role".into())),
        }
    }

    /// May the principal access this particular student's record?
    pub async fn can_access_student(
        &self,
        principal: &Principal,
        student: &Student,
    ) -> Result<bool> {
        match self.resolve(principal).await? {
            RoleScope::Own(own_id) => Ok(own_id == student.id),
            RoleScope::Advisees(ids) => Ok(ids.contains(&student.id)),
            RoleScope::All => Ok(true),
        }
    }
}
