//! In-memory store fakes for unit tests
//!
//! These implement the store contracts over plain maps, including the
//! guarded-update semantics of the reference store, so the lifecycle engine
//! and reporting aggregator can be exercised without Postgres or MongoDB.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use uuid::Uuid;

use crate::achievements::{
    AchievementInput, AchievementReference, AchievementStatus, ContentStore, ReferenceStore,
};
use crate::auth::{Principal, RoleKind};
use crate::db::schemas::{AchievementDoc, Attachment, NotificationEntry, StatusHistoryEntry};
use crate::directory::{Lecturer, PersonDirectory, Student};
use crate::types::{LaurelError, Page, Paginated, Result};

#[derive(Default)]
pub struct FakeReferenceStore {
    pub rows: Mutex<HashMap<Uuid, AchievementReference>>,
}

impl FakeReferenceStore {
    pub fn get(&self, id: Uuid) -> Option<AchievementReference> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    /// Force a row into a status, bypassing the transition guards
    pub fn force_status(&self, id: Uuid, status: AchievementStatus) {
        let mut rows = self.rows.lock().unwrap();
        rows.get_mut(&id).unwrap().status = status;
    }
}

#[async_trait]
impl ReferenceStore for FakeReferenceStore {
    async fn insert(&self, reference: &AchievementReference) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(reference.id, reference.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>> {
        Ok(self.get(id))
    }

    async fn list_by_student_ids(
        &self,
        student_ids: &[Uuid],
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<AchievementReference> = rows
            .values()
            .filter(|r| student_ids.contains(&r.student_id))
            .filter(|r| r.status != AchievementStatus::Deleted)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let start = (page.offset() as usize).min(matching.len());
        let end = (start + page.limit() as usize).min(matching.len());
        Ok(Paginated::new(matching[start..end].to_vec(), page, total))
    }

    async fn list_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<Paginated<AchievementReference>> {
        let all_ids: Vec<Uuid> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .map(|r| r.student_id)
            .collect();
        self.list_by_student_ids(&all_ids, status, page).await
    }

    async fn mark_submitted(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(r) if r.status.is_editable() => {
                r.status = AchievementStatus::Submitted;
                r.submitted_at = Some(Utc::now());
                r.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_verified(&self, id: Uuid, verifier: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(r) if r.status == AchievementStatus::Submitted => {
                r.status = AchievementStatus::Verified;
                r.verified_by = Some(verifier);
                r.verified_at = Some(Utc::now());
                r.rejection_note = None;
                r.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_rejected(&self, id: Uuid, note: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(r) if r.status == AchievementStatus::Submitted => {
                r.status = AchievementStatus::Rejected;
                r.rejection_note = Some(note.to_string());
                r.verified_by = None;
                r.verified_at = Some(Utc::now());
                r.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_deleted(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(r) if r.status == AchievementStatus::Draft => {
                r.status = AchievementStatus::Deleted;
                r.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn verified_refs(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<(Uuid, String)>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.status == AchievementStatus::Verified)
            .filter(|r| student_ids.map_or(true, |ids| ids.contains(&r.student_id)))
            .map(|r| (r.student_id, r.content_ref.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeContentStore {
    pub docs: Mutex<HashMap<String, AchievementDoc>>,
    fail_appends: AtomicBool,
}

impl FakeContentStore {
    pub fn doc(&self, content_ref: &str) -> Option<AchievementDoc> {
        self.docs.lock().unwrap().get(content_ref).cloned()
    }

    /// Make history/notification appends fail, to exercise degraded outcomes
    pub fn break_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    fn check_appends(&self) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            Err(LaurelError::Database("document store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn insert(&self, student_id: Uuid, input: &AchievementInput) -> Result<String> {
        let content_ref = ObjectId::new().to_hex();
        let now = bson::DateTime::now();
        let doc = AchievementDoc {
            id: Some(ObjectId::parse_str(&content_ref).unwrap()),
            student_id,
            achievement_type: input.achievement_type.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            details: input.details.clone(),
            attachments: Vec::new(),
            tags: input.tags.clone(),
            points: input.points,
            level: input.level.clone(),
            status_history: vec![StatusHistoryEntry::new(
                AchievementStatus::Draft,
                None,
                "achievement created",
            )],
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.docs.lock().unwrap().insert(content_ref.clone(), doc);
        Ok(content_ref)
    }

    async fn find_by_id(&self, content_ref: &str) -> Result<Option<AchievementDoc>> {
        Ok(self.doc(content_ref).filter(|d| d.deleted_at.is_none()))
    }

    async fn replace(&self, content_ref: &str, input: &AchievementInput) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(content_ref)
            .ok_or_else(|| LaurelError::NotFound("content".into()))?;
        doc.achievement_type = input.achievement_type.clone();
        doc.title = input.title.clone();
        doc.description = input.description.clone();
        doc.details = input.details.clone();
        doc.tags = input.tags.clone();
        doc.points = input.points;
        doc.level = input.level.clone();
        doc.updated_at = bson::DateTime::now();
        Ok(())
    }

    async fn soft_delete(&self, content_ref: &str) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.get_mut(content_ref) {
            doc.deleted_at = Some(bson::DateTime::now());
        }
        Ok(())
    }

    async fn append_history(&self, content_ref: &str, entry: StatusHistoryEntry) -> Result<()> {
        self.check_appends()?;
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.get_mut(content_ref) {
            doc.status_history.push(entry);
        }
        Ok(())
    }

    async fn append_notification(
        &self,
        content_ref: &str,
        notif: NotificationEntry,
    ) -> Result<()> {
        self.check_appends()?;
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.get_mut(content_ref) {
            doc.notifications.push(notif);
        }
        Ok(())
    }

    async fn append_attachment(&self, content_ref: &str, attachment: Attachment) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.get_mut(content_ref) {
            doc.attachments.push(attachment);
        }
        Ok(())
    }

    async fn find_by_student_ids(&self, student_ids: &[Uuid]) -> Result<Vec<AchievementDoc>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .values()
            .filter(|d| student_ids.contains(&d.student_id) && d.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, content_refs: &[String]) -> Result<Vec<AchievementDoc>> {
        let docs = self.docs.lock().unwrap();
        Ok(content_refs
            .iter()
            .filter_map(|r| docs.get(r))
            .filter(|d| d.deleted_at.is_none())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    pub students: Mutex<Vec<Student>>,
    pub lecturers: Mutex<Vec<Lecturer>>,
}

impl FakeDirectory {
    /// Register a student; returns `(user_id, student_id)`
    pub fn add_student(&self, advisor_id: Option<Uuid>) -> (Uuid, Uuid) {
        self.add_named_student(advisor_id, "Test Student")
    }

    pub fn add_named_student(&self, advisor_id: Option<Uuid>, full_name: &str) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let id = Uuid::new_v4();
        self.students.lock().unwrap().push(Student {
            id,
            user_id,
            student_number: "2110511001".into(),
            program_study: "Informatics".into(),
            academic_year: "2024/2025".into(),
            advisor_id,
            full_name: full_name.into(),
            created_at: Utc::now(),
        });
        (user_id, id)
    }

    /// Register a lecturer; returns `(user_id, lecturer_id)`
    pub fn add_lecturer(&self) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let id = Uuid::new_v4();
        self.lecturers.lock().unwrap().push(Lecturer {
            id,
            user_id,
            lecturer_number: "0411058901".into(),
            department: "Informatics".into(),
            full_name: "Test Lecturer".into(),
            created_at: Utc::now(),
        });
        (user_id, id)
    }
}

#[async_trait]
impl PersonDirectory for FakeDirectory {
    async fn find_student_by_user_id(&self, user_id: Uuid) -> Result<Option<Student>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_lecturer_by_user_id(&self, user_id: Uuid) -> Result<Option<Lecturer>> {
        Ok(self
            .lecturers
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.user_id == user_id)
            .cloned())
    }

    async fn find_lecturer_by_id(&self, id: Uuid) -> Result<Option<Lecturer>> {
        Ok(self
            .lecturers
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn advisee_student_ids(&self, advisor_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.advisor_id == Some(advisor_id))
            .map(|s| s.id)
            .collect())
    }

    async fn advisees(&self, advisor_id: Uuid) -> Result<Vec<Student>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.advisor_id == Some(advisor_id))
            .cloned()
            .collect())
    }

    async fn list_students(&self, page: Page) -> Result<Paginated<Student>> {
        Ok(Paginated::from_full(
            self.students.lock().unwrap().clone(),
            page,
        ))
    }

    async fn list_lecturers(&self, page: Page) -> Result<Paginated<Lecturer>> {
        Ok(Paginated::from_full(
            self.lecturers.lock().unwrap().clone(),
            page,
        ))
    }

    async fn assign_advisor(&self, student_id: Uuid, advisor_id: Uuid) -> Result<()> {
        let mut students = self.students.lock().unwrap();
        if let Some(s) = students.iter_mut().find(|s| s.id == student_id) {
            s.advisor_id = Some(advisor_id);
        }
        Ok(())
    }
}

/// A minimal content input for tests
pub fn achievement_input(title: &str) -> AchievementInput {
    AchievementInput {
        achievement_type: "competition".into(),
        title: title.into(),
        description: "A test achievement".into(),
        details: bson::doc! { "rank": 1 },
        tags: vec!["test".into()],
        points: 10,
        level: Some("national".into()),
    }
}

/// A principal with the given role and no permissions
pub fn principal(user_id: Uuid, role: RoleKind) -> Principal {
    Principal {
        user_id,
        role_id: Uuid::new_v4(),
        role,
        permissions: Vec::new(),
    }
}
