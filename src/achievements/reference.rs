//! Achievement reference rows
//!
//! The relational side of an achievement: workflow status, ownership, and the
//! pointer into the content store. Every transition updates this row first;
//! status updates are guarded on the expected source status so that two
//! racing reviewers cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::status::AchievementStatus;
use crate::types::{Page, Paginated, Result};

/// The authoritative workflow row for one achievement
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AchievementReference {
    pub id: Uuid,
    pub student_id: Uuid,
    /// Content document key (Mongo ObjectId hex); immutable once created
    pub content_ref: String,
    #[sqlx(try_from = "String")]
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AchievementReference {
    /// A fresh draft row pointing at an already-written content document
    pub fn new_draft(student_id: Uuid, content_ref: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            student_id,
            content_ref,
            status: AchievementStatus::Draft,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store contract for reference rows.
///
/// The `mark_*` methods perform conditional updates: they only apply when the
/// row is still in an allowed source status, and return `false` when no row
/// matched. Callers translate `false` into an invalid-state error; this is
/// what makes concurrent verify/reject races safe.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn insert(&self, reference: &AchievementReference) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>>;

    /// References for the given students, newest first, `deleted` excluded
    async fn list_by_student_ids(
        &self,
        student_ids: &[Uuid],
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>>;

    /// All references, newest first, `deleted` excluded
    async fn list_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>>;

    /// draft|rejected → submitted, stamping `submitted_at`
    async fn mark_submitted(&self, id: Uuid) -> Result<bool>;

    /// submitted → verified, stamping the verifier and clearing any stale
    /// rejection note
    async fn mark_verified(&self, id: Uuid, verifier: Uuid) -> Result<bool>;

    /// submitted → rejected with the reviewer's note
    async fn mark_rejected(&self, id: Uuid, note: &str) -> Result<bool>;

    /// draft → deleted
    async fn mark_deleted(&self, id: Uuid) -> Result<bool>;

    /// `(student_id, content_ref)` pairs of verified achievements, optionally
    /// restricted to a student set. Feeds the reporting aggregator.
    async fn verified_refs(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<(Uuid, String)>>;
}

const REFERENCE_COLUMNS: &str = "id, student_id, content_ref, status, submitted_at, verified_at, \
                                 verified_by, rejection_note, created_at, updated_at";

/// Postgres-backed reference store
#[derive(Clone)]
pub struct PgReferenceStore {
    pool: PgPool,
}

impl PgReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_filtered(
        &self,
        student_ids: Option<&[Uuid]>,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        let status = status.map(|s| s.as_str());
        let ids: Option<Vec<Uuid>> = student_ids.map(|ids| ids.to_vec());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM achievement_references \
             WHERE status != 'deleted' \
             AND ($1::uuid[] IS NULL OR student_id = ANY($1)) \
             AND ($2::text IS NULL OR status = $2)",
        )
        .bind(&ids)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {REFERENCE_COLUMNS} FROM achievement_references \
             WHERE status != 'deleted' \
             AND ($1::uuid[] IS NULL OR student_id = ANY($1)) \
             AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, AchievementReference>(&query)
            .bind(&ids)
            .bind(status)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(rows, page, total as u64))
    }
}

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    async fn insert(&self, reference: &AchievementReference) -> Result<()> {
        sqlx::query(
            "INSERT INTO achievement_references \
             (id, student_id, content_ref, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(reference.id)
        .bind(reference.student_id)
        .bind(&reference.content_ref)
        .bind(reference.status.as_str())
        .bind(reference.created_at)
        .bind(reference.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>> {
        let query = format!("SELECT {REFERENCE_COLUMNS} FROM achievement_references WHERE id = $1");
        let reference = sqlx::query_as::<_, AchievementReference>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reference)
    }

    async fn list_by_student_ids(
        &self,
        student_ids: &[Uuid],
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        if student_ids.is_empty() {
            return Ok(Paginated::empty(page));
        }
        self.list_filtered(Some(student_ids), status, page).await
    }

    async fn list_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        self.list_filtered(None, status, page).await
    }

    async fn mark_submitted(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE achievement_references \
             SET status = 'submitted', submitted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status IN ('draft', 'rejected')",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_verified(&self, id: Uuid, verifier: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE achievement_references \
             SET status = 'verified', verified_by = $1, verified_at = NOW(), \
                 rejection_note = NULL, updated_at = NOW() \
             WHERE id = $2 AND status = 'submitted'",
        )
        .bind(verifier)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_rejected(&self, id: Uuid, note: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE achievement_references \
             SET status = 'rejected', rejection_note = $1, verified_by = NULL, \
                 verified_at = NOW(), updated_at = NOW() \
             WHERE id = $2 AND status = 'submitted'",
        )
        .bind(note)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_deleted(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE achievement_references \
             SET status = 'deleted', updated_at = NOW() \
             WHERE id = $1 AND status = 'draft'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn verified_refs(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<(Uuid, String)>> {
        let ids: Option<Vec<Uuid>> = student_ids.map(|ids| ids.to_vec());
        let refs: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT student_id, content_ref FROM achievement_references \
             WHERE status = 'verified' \
             AND ($1::uuid[] IS NULL OR student_id = ANY($1))",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(refs)
    }
}
