//! Person directory: students, lecturers, and the advisor relationship
//!
//! Read-mostly lookups over Postgres. The only mutation is advisor
//! reassignment, which is admin-only.

mod pg;
mod scope;

pub use pg::PgDirectory;
pub use scope::{RoleScope, ScopeResolver};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{Page, Paginated, Result};

/// A student row joined with its user account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Institutional student number
    pub student_number: String,
    pub program_study: String,
    pub academic_year: String,
    /// Assigned advisor (lecturer id); optional
    pub advisor_id: Option<Uuid>,
    /// Display name from the joined user row
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// A lecturer row joined with its user account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lecturer {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Institutional lecturer number
    pub lecturer_number: String,
    pub department: String,
    /// Display name from the joined user row
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// Lookup contract over the person directory
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn find_student_by_user_id(&self, user_id: Uuid) -> Result<Option<Student>>;
    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>>;
    async fn find_lecturer_by_user_id(&self, user_id: Uuid) -> Result<Option<Lecturer>>;
    async fn find_lecturer_by_id(&self, id: Uuid) -> Result<Option<Lecturer>>;

    /// Student ids advised by the given lecturer
    async fn advisee_student_ids(&self, advisor_id: Uuid) -> Result<Vec<Uuid>>;
    /// Full student rows advised by the given lecturer
    async fn advisees(&self, advisor_id: Uuid) -> Result<Vec<Student>>;

    async fn list_students(&self, page: Page) -> Result<Paginated<Student>>;
    async fn list_lecturers(&self, page: Page) -> Result<Paginated<Lecturer>>;

    /// Reassign a student's advisor (admin-only at the route layer)
    async fn assign_advisor(&self, student_id: Uuid, advisor_id: Uuid) -> Result<()>;
}
