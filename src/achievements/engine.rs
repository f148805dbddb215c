//! Achievement lifecycle engine
//!
//! Orchestrates every workflow transition across the two stores. The
//! protocol, in both directions of the dual write:
//!
//! - **create**: content document first, then the reference row. If the
//!   second write fails, the content document is an invisible orphan — never
//!   a reference pointing at missing content.
//! - **transitions** (submit/verify/reject/delete): guarded Postgres update
//!   first (the authoritative write), then best-effort document appends.
//!   A failed append degrades the outcome to `CommittedWithWarnings` but the
//!   transition stands.
//!
//! A guarded update that matches zero rows means the source status changed
//! underneath us (e.g. two reviewers racing); the loser gets an
//! invalid-state error instead of silently clobbering the winner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::content_store::{AchievementInput, ContentStore};
use super::reference::{AchievementReference, ReferenceStore};
use super::status::AchievementStatus;
use crate::auth::Principal;
use crate::db::schemas::{AchievementDoc, Attachment, NotificationEntry, StatusHistoryEntry};
use crate::directory::{PersonDirectory, RoleScope, ScopeResolver, Student};
use crate::types::{LaurelError, Page, Paginated, Result};

/// Result of a transition whose authoritative write committed.
///
/// `CommittedWithWarnings` means the status change is durable but one or
/// more advisory writes (history, notification) failed and were only logged.
#[derive(Debug)]
pub enum Outcome<T> {
    Committed(T),
    CommittedWithWarnings { value: T, warnings: Vec<String> },
}

impl<T> Outcome<T> {
    fn new(value: T, warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            Outcome::Committed(value)
        } else {
            Outcome::CommittedWithWarnings { value, warnings }
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Committed(value) => value,
            Outcome::CommittedWithWarnings { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Committed(value) => value,
            Outcome::CommittedWithWarnings { value, .. } => value,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Outcome::Committed(_) => &[],
            Outcome::CommittedWithWarnings { warnings, .. } => warnings,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::CommittedWithWarnings { .. })
    }
}

/// Reference row joined with its content document and owner
#[derive(Debug, Serialize)]
pub struct AchievementDetail {
    pub id: Uuid,
    pub student: Student,
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub rejection_note: Option<String>,
    pub achievement: AchievementDoc,
}

#[derive(Clone)]
pub struct LifecycleEngine {
    references: Arc<dyn ReferenceStore>,
    contents: Arc<dyn ContentStore>,
    directory: Arc<dyn PersonDirectory>,
    scopes: ScopeResolver,
}

impl LifecycleEngine {
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        contents: Arc<dyn ContentStore>,
        directory: Arc<dyn PersonDirectory>,
    ) -> Self {
        let scopes = ScopeResolver::new(directory.clone());
        Self {
            references,
            contents,
            directory,
            scopes,
        }
    }

    /// Create a draft achievement for the acting student.
    pub async fn create(
        &self,
        acting_user_id: Uuid,
        input: AchievementInput,
    ) -> Result<AchievementReference> {
        let student = self
            .directory
            .find_student_by_user_id(acting_user_id)
            .await?
            .ok_or_else(|| {
                LaurelError::Forbidden("only students may create achievements".into())
            })?;

        if input.title.trim().is_empty() {
            return Err(LaurelError::Validation("title is required".into()));
        }

        // Content first: if the reference insert fails we are left with an
        // invisible orphan document, never a reference to missing content.
        let content_ref = self.contents.insert(student.id, &input).await?;

        let reference = AchievementReference::new_draft(student.id, content_ref);
        if let Err(e) = self.references.insert(&reference).await {
            warn!(
                content_ref = %reference.content_ref,
                "reference insert failed after content write; content document orphaned"
            );
            return Err(e);
        }

        Ok(reference)
    }

    /// Replace the content of a draft or rejected achievement.
    pub async fn update(&self, reference_id: Uuid, input: AchievementInput) -> Result<()> {
        let reference = self.load(reference_id).await?;

        if !reference.status.is_editable() {
            return Err(LaurelError::InvalidState(format!(
                "cannot update an achievement in status '{}'",
                reference.status
            )));
        }

        if input.title.trim().is_empty() {
            return Err(LaurelError::Validation("title is required".into()));
        }

        self.contents.replace(&reference.content_ref, &input).await
    }

    /// Submit a draft or rejected achievement for verification.
    pub async fn submit(&self, reference_id: Uuid, acting_user_id: Uuid) -> Result<Outcome<()>> {
        let reference = self.load(reference_id).await?;
        self.require_owner(&reference, acting_user_id).await?;

        if !reference.status.is_editable() {
            return Err(LaurelError::InvalidState(format!(
                "cannot submit an achievement in status '{}'",
                reference.status
            )));
        }

        if !self.references.mark_submitted(reference_id).await? {
            return Err(LaurelError::InvalidState(
                "achievement is no longer submittable".into(),
            ));
        }

        let mut warnings = Vec::new();
        self.record_history(
            &reference.content_ref,
            StatusHistoryEntry::new(
                AchievementStatus::Submitted,
                Some(acting_user_id),
                "submitted for verification",
            ),
            &mut warnings,
        )
        .await;

        Ok(Outcome::new((), warnings))
    }

    /// Verify a submitted achievement.
    pub async fn verify(&self, reference_id: Uuid, verifier_id: Uuid) -> Result<Outcome<()>> {
        let reference = self.load(reference_id).await?;

        if !reference.status.is_reviewable() {
            return Err(LaurelError::InvalidState(format!(
                "cannot verify an achievement in status '{}'",
                reference.status
            )));
        }

        if !self.references.mark_verified(reference_id, verifier_id).await? {
            return Err(LaurelError::InvalidState(
                "achievement is no longer awaiting review".into(),
            ));
        }

        let mut warnings = Vec::new();
        self.record_history(
            &reference.content_ref,
            StatusHistoryEntry::new(AchievementStatus::Verified, Some(verifier_id), "verified"),
            &mut warnings,
        )
        .await;

        let title = self.content_title(&reference.content_ref).await;
        self.record_notification(
            &reference.content_ref,
            NotificationEntry::new(
                "achievement_verified",
                "Approved",
                format!("{} was approved", title),
            ),
            &mut warnings,
        )
        .await;

        Ok(Outcome::new((), warnings))
    }

    /// Reject a submitted achievement with a mandatory note.
    pub async fn reject(
        &self,
        reference_id: Uuid,
        verifier_id: Uuid,
        note: &str,
    ) -> Result<Outcome<()>> {
        if note.trim().is_empty() {
            return Err(LaurelError::Validation("rejection note is required".into()));
        }

        let reference = self.load(reference_id).await?;

        if !reference.status.is_reviewable() {
            return Err(LaurelError::InvalidState(format!(
                "cannot reject an achievement in status '{}'",
                reference.status
            )));
        }

        if !self.references.mark_rejected(reference_id, note).await? {
            return Err(LaurelError::InvalidState(
                "achievement is no longer awaiting review".into(),
            ));
        }

        let mut warnings = Vec::new();
        self.record_history(
            &reference.content_ref,
            StatusHistoryEntry::new(
                AchievementStatus::Rejected,
                Some(verifier_id),
                format!("rejected: {}", note),
            ),
            &mut warnings,
        )
        .await;

        let title = self.content_title(&reference.content_ref).await;
        self.record_notification(
            &reference.content_ref,
            NotificationEntry::new(
                "achievement_rejected",
                "Rejected",
                format!("{} was rejected: {}", title, note),
            ),
            &mut warnings,
        )
        .await;

        Ok(Outcome::new((), warnings))
    }

    /// Soft-delete a draft achievement.
    pub async fn delete(&self, reference_id: Uuid, acting_user_id: Uuid) -> Result<Outcome<()>> {
        let reference = self.load(reference_id).await?;
        self.require_owner(&reference, acting_user_id).await?;

        if !reference.status.is_deletable() {
            return Err(LaurelError::InvalidState(
                "only draft achievements can be deleted".into(),
            ));
        }

        if !self.references.mark_deleted(reference_id).await? {
            return Err(LaurelError::InvalidState(
                "achievement is no longer deletable".into(),
            ));
        }

        // The reference row already hides the achievement; the content
        // soft-delete and history entry are advisory from here on.
        let mut warnings = Vec::new();
        if let Err(e) = self.contents.soft_delete(&reference.content_ref).await {
            warn!(reference_id = %reference_id, error = %e, "content soft-delete failed");
            warnings.push(format!("content soft-delete failed: {}", e));
        }
        self.record_history(
            &reference.content_ref,
            StatusHistoryEntry::new(
                AchievementStatus::Deleted,
                Some(acting_user_id),
                "deleted by student",
            ),
            &mut warnings,
        )
        .await;

        Ok(Outcome::new((), warnings))
    }

    /// Full detail for one achievement. Deleted achievements are invisible
    /// here regardless of caller role.
    pub async fn get_detail(&self, reference_id: Uuid) -> Result<AchievementDetail> {
        let reference = self.load(reference_id).await?;

        if reference.status == AchievementStatus::Deleted {
            return Err(LaurelError::NotFound(format!(
                "achievement {}",
                reference_id
            )));
        }

        let achievement = self
            .contents
            .find_by_id(&reference.content_ref)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("achievement {}", reference_id)))?;

        let student = self
            .directory
            .find_student_by_id(reference.student_id)
            .await?
            .ok_or_else(|| {
                LaurelError::NotFound(format!("student {}", reference.student_id))
            })?;

        Ok(AchievementDetail {
            id: reference.id,
            student,
            status: reference.status,
            submitted_at: reference.submitted_at,
            verified_at: reference.verified_at,
            verified_by: reference.verified_by,
            rejection_note: reference.rejection_note,
            achievement,
        })
    }

    /// The status history of one achievement.
    pub async fn history(&self, reference_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let reference = self.load(reference_id).await?;
        let achievement = self
            .contents
            .find_by_id(&reference.content_ref)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("achievement {}", reference_id)))?;
        Ok(achievement.status_history)
    }

    /// List achievements visible to the principal, newest first.
    pub async fn list_for_principal(
        &self,
        principal: &Principal,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        // Deleted achievements are excluded from every listing; filtering on
        // them yields nothing rather than a special view.
        if status == Some(AchievementStatus::Deleted) {
            return Ok(Paginated::empty(page));
        }

        match self.scopes.resolve(principal).await? {
            RoleScope::Own(student_id) => {
                self.references
                    .list_by_student_ids(&[student_id], status, page)
                    .await
            }
            RoleScope::Advisees(ids) => {
                if ids.is_empty() {
                    return Ok(Paginated::empty(page));
                }
                self.references.list_by_student_ids(&ids, status, page).await
            }
            RoleScope::All => self.references.list_all(status, page).await,
        }
    }

    /// List one student's achievements, with the own/advisor/admin access check.
    pub async fn list_for_student(
        &self,
        principal: &Principal,
        student_id: Uuid,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        let student = self
            .directory
            .find_student_by_id(student_id)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("student {}", student_id)))?;

        if !self.scopes.can_access_student(principal, &student).await? {
            return Err(LaurelError::Forbidden(
                "not allowed to view this student's achievements".into(),
            ));
        }

        if status == Some(AchievementStatus::Deleted) {
            return Ok(Paginated::empty(page));
        }

        self.references
            .list_by_student_ids(&[student_id], status, page)
            .await
    }

    /// Record an uploaded attachment on a non-deleted achievement.
    pub async fn attach(
        &self,
        reference_id: Uuid,
        file_name: String,
        file_url: String,
        file_type: String,
    ) -> Result<Attachment> {
        let reference = self.load(reference_id).await?;

        if reference.status == AchievementStatus::Deleted {
            return Err(LaurelError::InvalidState(
                "cannot attach files to a deleted achievement".into(),
            ));
        }

        let attachment = Attachment {
            file_name,
            file_url,
            file_type,
            uploaded_at: bson::DateTime::now(),
        };
        self.contents
            .append_attachment(&reference.content_ref, attachment.clone())
            .await?;
        Ok(attachment)
    }

    async fn load(&self, reference_id: Uuid) -> Result<AchievementReference> {
        self.references
            .find_by_id(reference_id)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("achievement {}", reference_id)))
    }

    /// The acting user must be the student who owns the reference.
    async fn require_owner(
        &self,
        reference: &AchievementReference,
        acting_user_id: Uuid,
    ) -> Result<()> {
        let student = self
            .directory
            .find_student_by_user_id(acting_user_id)
            .await?
            .ok_or_else(|| {
                LaurelError::Forbidden("only students may perform this operation".into())
            })?;

        if student.id != reference.student_id {
            return Err(LaurelError::Forbidden(
                "not the owner of this achievement".into(),
            ));
        }
        Ok(())
    }

    async fn record_history(
        &self,
        content_ref: &str,
        entry: StatusHistoryEntry,
        warnings: &mut Vec<String>,
    ) {
        if let Err(e) = self.contents.append_history(content_ref, entry).await {
            warn!(content_ref = %content_ref, error = %e, "history append failed");
            warnings.push(format!("history append failed: {}", e));
        }
    }

    async fn record_notification(
        &self,
        content_ref: &str,
        notif: NotificationEntry,
        warnings: &mut Vec<String>,
    ) {
        if let Err(e) = self.contents.append_notification(content_ref, notif).await {
            warn!(content_ref = %content_ref, error = %e, "notification append failed");
            warnings.push(format!("notification append failed: {}", e));
        }
    }

    async fn content_title(&self, content_ref: &str) -> String {
        match self.contents.find_by_id(content_ref).await {
            Ok(Some(doc)) if !doc.title.is_empty() => doc.title,
            _ => "Your achievement".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RoleKind;
    use crate::testutil::{
        achievement_input as input, principal, FakeContentStore, FakeDirectory,
        FakeReferenceStore,
    };

    struct Harness {
        engine: LifecycleEngine,
        references: Arc<FakeReferenceStore>,
        contents: Arc<FakeContentStore>,
        directory: Arc<FakeDirectory>,
    }

    fn harness() -> Harness {
        let references = Arc::new(FakeReferenceStore::default());
        let contents = Arc::new(FakeContentStore::default());
        let directory = Arc::new(FakeDirectory::default());
        let engine = LifecycleEngine::new(
            references.clone(),
            contents.clone(),
            directory.clone(),
        );
        Harness {
            engine,
            references,
            contents,
            directory,
        }
    }

    // ----- scenarios ---------------------------------------------------------

    #[tokio::test]
    async fn test_create_then_submit() {
        let h = harness();
        let (student_user, student_id) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        assert_eq!(reference.status, AchievementStatus::Draft);
        assert_eq!(reference.student_id, student_id);

        let doc = h.contents.doc(&reference.content_ref).unwrap();
        assert_eq!(doc.status_history.len(), 1);
        assert_eq!(doc.status_history[0].status, AchievementStatus::Draft);

        let outcome = h.engine.submit(reference.id, student_user).await.unwrap();
        assert!(!outcome.is_degraded());

        let updated = h.references.get(reference.id).unwrap();
        assert_eq!(updated.status, AchievementStatus::Submitted);
        assert!(updated.submitted_at.is_some());

        let doc = h.contents.doc(&reference.content_ref).unwrap();
        assert_eq!(doc.status_history.len(), 2);
        assert_eq!(doc.status_history[1].status, AchievementStatus::Submitted);
    }

    #[tokio::test]
    async fn test_create_requires_a_student() {
        let h = harness();
        let err = h.engine.create(Uuid::new_v4(), input("X")).await.unwrap_err();
        assert!(matches!(err, LaurelError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reject_then_resubmit_keeps_note() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();

        h.engine
            .reject(reference.id, advisor_user, "incomplete proof")
            .await
            .unwrap();
        let rejected = h.references.get(reference.id).unwrap();
        assert_eq!(rejected.status, AchievementStatus::Rejected);
        assert_eq!(rejected.rejection_note.as_deref(), Some("incomplete proof"));
        assert!(rejected.verified_by.is_none());

        // Resubmission succeeds and does not clear the old note
        h.engine.submit(reference.id, student_user).await.unwrap();
        let resubmitted = h.references.get(reference.id).unwrap();
        assert_eq!(resubmitted.status, AchievementStatus::Submitted);
        assert_eq!(
            resubmitted.rejection_note.as_deref(),
            Some("incomplete proof")
        );

        let doc = h.contents.doc(&reference.content_ref).unwrap();
        let statuses: Vec<AchievementStatus> =
            doc.status_history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                AchievementStatus::Draft,
                AchievementStatus::Submitted,
                AchievementStatus::Rejected,
                AchievementStatus::Submitted,
            ]
        );
    }

    #[tokio::test]
    async fn test_verify_clears_rejection_state() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();
        h.engine
            .reject(reference.id, advisor_user, "fix the scan")
            .await
            .unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();

        h.engine.verify(reference.id, advisor_user).await.unwrap();
        let verified = h.references.get(reference.id).unwrap();
        assert_eq!(verified.status, AchievementStatus::Verified);
        assert_eq!(verified.verified_by, Some(advisor_user));
        assert!(verified.rejection_note.is_none());
    }

    #[tokio::test]
    async fn test_verify_not_reachable_from_rejected() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();
        h.engine
            .reject(reference.id, advisor_user, "wrong certificate")
            .await
            .unwrap();

        // A rejected achievement must be resubmitted before verification
        let err = h.engine.verify(reference.id, advisor_user).await.unwrap_err();
        assert!(matches!(err, LaurelError::InvalidState(_)));
        assert_eq!(
            h.references.get(reference.id).unwrap().status,
            AchievementStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_delete_only_from_draft() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();

        let err = h.engine.delete(reference.id, student_user).await.unwrap_err();
        assert!(matches!(err, LaurelError::InvalidState(_)));

        // Unchanged
        let unchanged = h.references.get(reference.id).unwrap();
        assert_eq!(unchanged.status, AchievementStatus::Submitted);
    }

    #[tokio::test]
    async fn test_delete_hides_achievement() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.delete(reference.id, student_user).await.unwrap();

        assert_eq!(
            h.references.get(reference.id).unwrap().status,
            AchievementStatus::Deleted
        );
        assert!(h
            .contents
            .doc(&reference.content_ref)
            .unwrap()
            .deleted_at
            .is_some());

        let err = h.engine.get_detail(reference.id).await.unwrap_err();
        assert!(matches!(err, LaurelError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_state_machine_completeness() {
        // Every (status, operation) pair outside the transition table fails
        // with InvalidState and leaves the reference unchanged.
        use AchievementStatus::*;

        let submit_blocked = [Submitted, Verified, Deleted];
        let review_blocked = [Draft, Rejected, Verified, Deleted];
        let delete_blocked = [Submitted, Verified, Rejected, Deleted];
        let update_blocked = [Submitted, Verified, Deleted];

        for (blocked, op) in [
            (&submit_blocked[..], "submit"),
            (&review_blocked[..], "verify"),
            (&review_blocked[..], "reject"),
            (&delete_blocked[..], "delete"),
            (&update_blocked[..], "update"),
        ] {
            for &status in blocked {
                let h = harness();
                let (student_user, _) = h.directory.add_student(None);
                let (advisor_user, _) = h.directory.add_lecturer();

                let reference = h.engine.create(student_user, input("X")).await.unwrap();
                // Force the reference into the target status directly
                h.references.force_status(reference.id, status);

                let result = match op {
                    "submit" => h.engine.submit(reference.id, student_user).await.map(|_| ()),
                    "verify" => h.engine.verify(reference.id, advisor_user).await.map(|_| ()),
                    "reject" => h
                        .engine
                        .reject(reference.id, advisor_user, "nope")
                        .await
                        .map(|_| ()),
                    "delete" => h.engine.delete(reference.id, student_user).await.map(|_| ()),
                    "update" => h.engine.update(reference.id, input("Y")).await,
                    _ => unreachable!(),
                };

                let err = result.unwrap_err();
                assert!(
                    matches!(err, LaurelError::InvalidState(_)),
                    "{op} from {status} should be InvalidState, got {err:?}"
                );
                assert_eq!(
                    h.references.get(reference.id).unwrap().status,
                    status,
                    "{op} from {status} must not change the row"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        let mut last_len = 0;

        let mut assert_grew_by_one = |expected: AchievementStatus| {
            let doc = h.contents.doc(&reference.content_ref).unwrap();
            assert_eq!(doc.status_history.len(), last_len + 1);
            assert_eq!(doc.status_history.last().unwrap().status, expected);
            last_len = doc.status_history.len();
        };

        assert_grew_by_one(AchievementStatus::Draft);

        h.engine.submit(reference.id, student_user).await.unwrap();
        assert_grew_by_one(AchievementStatus::Submitted);

        h.engine
            .reject(reference.id, advisor_user, "redo")
            .await
            .unwrap();
        assert_grew_by_one(AchievementStatus::Rejected);

        h.engine.submit(reference.id, student_user).await.unwrap();
        assert_grew_by_one(AchievementStatus::Submitted);

        h.engine.verify(reference.id, advisor_user).await.unwrap();
        assert_grew_by_one(AchievementStatus::Verified);
    }

    #[tokio::test]
    async fn test_degraded_append_still_commits() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.contents.break_appends();

        let outcome = h.engine.submit(reference.id, student_user).await.unwrap();
        assert!(outcome.is_degraded());
        assert_eq!(outcome.warnings().len(), 1);

        // The authoritative transition stands
        assert_eq!(
            h.references.get(reference.id).unwrap().status,
            AchievementStatus::Submitted
        );
        // The audit trail lags behind
        assert_eq!(
            h.contents
                .doc(&reference.content_ref)
                .unwrap()
                .status_history
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_reject_requires_note() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();

        let err = h
            .engine
            .reject(reference.id, advisor_user, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, LaurelError::Validation(_)));
        assert_eq!(
            h.references.get(reference.id).unwrap().status,
            AchievementStatus::Submitted
        );
    }

    #[tokio::test]
    async fn test_submit_by_non_owner_is_forbidden() {
        let h = harness();
        let (owner_user, _) = h.directory.add_student(None);
        let (other_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(owner_user, input("X")).await.unwrap();
        let err = h.engine.submit(reference.id, other_user).await.unwrap_err();
        assert!(matches!(err, LaurelError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_verify_notification_recorded() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);
        let (advisor_user, _) = h.directory.add_lecturer();

        let reference = h.engine.create(student_user, input("Chess Cup")).await.unwrap();
        h.engine.submit(reference.id, student_user).await.unwrap();
        h.engine.verify(reference.id, advisor_user).await.unwrap();

        let doc = h.contents.doc(&reference.content_ref).unwrap();
        assert_eq!(doc.notifications.len(), 1);
        assert_eq!(doc.notifications[0].kind, "achievement_verified");
        assert!(doc.notifications[0].message.contains("Chess Cup"));
        assert!(!doc.notifications[0].read);
    }

    #[tokio::test]
    async fn test_get_detail_is_idempotent() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();

        let first = h.engine.get_detail(reference.id).await.unwrap();
        let second = h.engine.get_detail(reference.id).await.unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_role_scope_containment() {
        let h = harness();
        let (advisor_user, advisor_id) = h.directory.add_lecturer();
        let (owner_user, owner_student) = h.directory.add_student(Some(advisor_id));
        let (stranger_user, _) = h.directory.add_student(None);

        h.engine.create(owner_user, input("Mine")).await.unwrap();
        h.engine.create(stranger_user, input("Theirs")).await.unwrap();

        // Student sees only their own
        let student_list = h
            .engine
            .list_for_principal(
                &principal(owner_user, RoleKind::Student),
                None,
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(student_list.data.len(), 1);
        assert!(student_list.data.iter().all(|r| r.student_id == owner_student));

        // Advisor sees only advisees
        let advisor_list = h
            .engine
            .list_for_principal(
                &principal(advisor_user, RoleKind::Advisor),
                None,
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(advisor_list.data.len(), 1);
        assert!(advisor_list.data.iter().all(|r| r.student_id == owner_student));

        // Admin sees everything
        let admin_list = h
            .engine
            .list_for_principal(
                &principal(Uuid::new_v4(), RoleKind::Admin),
                None,
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(admin_list.data.len(), 2);
    }

    #[tokio::test]
    async fn test_listing_excludes_deleted_and_filters() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let kept = h.engine.create(student_user, input("Kept")).await.unwrap();
        let gone = h.engine.create(student_user, input("Gone")).await.unwrap();
        h.engine.delete(gone.id, student_user).await.unwrap();

        let p = principal(student_user, RoleKind::Student);
        let list = h
            .engine
            .list_for_principal(&p, None, Page::default())
            .await
            .unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].id, kept.id);

        // Filtering on deleted yields nothing
        let deleted = h
            .engine
            .list_for_principal(&p, Some(AchievementStatus::Deleted), Page::default())
            .await
            .unwrap();
        assert!(deleted.data.is_empty());

        // Status filter applies
        let drafts = h
            .engine
            .list_for_principal(&p, Some(AchievementStatus::Draft), Page::default())
            .await
            .unwrap();
        assert_eq!(drafts.data.len(), 1);
        let submitted = h
            .engine
            .list_for_principal(&p, Some(AchievementStatus::Submitted), Page::default())
            .await
            .unwrap();
        assert!(submitted.data.is_empty());
    }

    #[tokio::test]
    async fn test_pagination() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        for i in 0..25 {
            h.engine
                .create(student_user, input(&format!("A{i}")))
                .await
                .unwrap();
        }

        let p = principal(student_user, RoleKind::Student);
        let page1 = h
            .engine
            .list_for_principal(&p, None, Page::new(Some(1), Some(10)))
            .await
            .unwrap();
        let page2 = h
            .engine
            .list_for_principal(&p, None, Page::new(Some(2), Some(10)))
            .await
            .unwrap();
        let page3 = h
            .engine
            .list_for_principal(&p, None, Page::new(Some(3), Some(10)))
            .await
            .unwrap();

        assert_eq!(page1.data.len(), 10);
        assert_eq!(page2.data.len(), 10);
        assert_eq!(page3.data.len(), 5);
        assert_eq!(page1.total, 25);
        assert_eq!(page1.total_pages, 3);

        // Newest first within and across pages
        for pair in page1.data.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        if let (Some(last), Some(first)) = (page1.data.last(), page2.data.first()) {
            assert!(last.created_at >= first.created_at);
        }
    }

    #[tokio::test]
    async fn test_update_replaces_content_only() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("Before")).await.unwrap();
        h.engine.update(reference.id, input("After")).await.unwrap();

        let doc = h.contents.doc(&reference.content_ref).unwrap();
        assert_eq!(doc.title, "After");
        // History untouched by content updates
        assert_eq!(doc.status_history.len(), 1);
        // Reference status untouched
        assert_eq!(
            h.references.get(reference.id).unwrap().status,
            AchievementStatus::Draft
        );
    }

    #[tokio::test]
    async fn test_attach_rejected_for_deleted() {
        let h = harness();
        let (student_user, _) = h.directory.add_student(None);

        let reference = h.engine.create(student_user, input("X")).await.unwrap();
        h.engine.delete(reference.id, student_user).await.unwrap();

        let err = h
            .engine
            .attach(
                reference.id,
                "proof.pdf".into(),
                "/uploads/proof.pdf".into(),
                "application/pdf".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LaurelError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_list_for_student_access_check() {
        let h = harness();
        let (owner_user, owner_student) = h.directory.add_student(None);
        let (other_user, _) = h.directory.add_student(None);

        h.engine.create(owner_user, input("X")).await.unwrap();

        let err = h
            .engine
            .list_for_student(
                &principal(other_user, RoleKind::Student),
                owner_student,
                None,
                Page::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LaurelError::Forbidden(_)));

        let ok = h
            .engine
            .list_for_student(
                &principal(owner_user, RoleKind::Student),
                owner_student,
                None,
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(ok.data.len(), 1);
    }
}
