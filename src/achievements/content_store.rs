//! Achievement content store
//!
//! Owns the MongoDB side of an achievement: payload, attachments, and the
//! append-only `statusHistory`/`notifications` arrays. History and
//! notification appends are the advisory half of the dual-store protocol —
//! the engine calls them after the authoritative Postgres write and treats
//! failures as warnings, not operation failures.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::schemas::{
    AchievementDoc, Attachment, NotificationEntry, StatusHistoryEntry, ACHIEVEMENT_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{LaurelError, Result};

/// Caller-supplied content fields for create/update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementInput {
    pub achievement_type: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub details: Document,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub level: Option<String>,
}

/// Store contract for achievement content documents
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a content document seeded with its initial `draft` history
    /// entry, returning the new document's key.
    async fn insert(&self, student_id: Uuid, input: &AchievementInput) -> Result<String>;

    /// Fetch a content document. Soft-deleted documents read as absent.
    async fn find_by_id(&self, content_ref: &str) -> Result<Option<AchievementDoc>>;

    /// Replace the caller-editable fields, preserving identity, ownership,
    /// attachments and the append-only arrays.
    async fn replace(&self, content_ref: &str, input: &AchievementInput) -> Result<()>;

    async fn soft_delete(&self, content_ref: &str) -> Result<()>;

    async fn append_history(&self, content_ref: &str, entry: StatusHistoryEntry) -> Result<()>;

    async fn append_notification(&self, content_ref: &str, notif: NotificationEntry) -> Result<()>;

    async fn append_attachment(&self, content_ref: &str, attachment: Attachment) -> Result<()>;

    /// Non-deleted content for the given students
    async fn find_by_student_ids(&self, student_ids: &[Uuid]) -> Result<Vec<AchievementDoc>>;

    /// Non-deleted content for the given document keys (batch read)
    async fn find_by_ids(&self, content_refs: &[String]) -> Result<Vec<AchievementDoc>>;
}

fn parse_object_id(content_ref: &str) -> Result<ObjectId> {
    ObjectId::parse_str(content_ref)
        .map_err(|_| LaurelError::BadRequest(format!("invalid content reference: {}", content_ref)))
}

/// MongoDB-backed content store
#[derive(Clone)]
pub struct MongoContentStore {
    collection: MongoCollection<AchievementDoc>,
}

impl MongoContentStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection(ACHIEVEMENT_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl ContentStore for MongoContentStore {
    async fn insert(&self, student_id: Uuid, input: &AchievementInput) -> Result<String> {
        let now = DateTime::now();
        let document = AchievementDoc {
            id: None,
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
                crate::achievements::AchievementStatus::Draft,
                None,
                "achievement created",
            )],
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.collection.insert_one(document).await?;
        Ok(id.to_hex())
    }

    async fn find_by_id(&self, content_ref: &str) -> Result<Option<AchievementDoc>> {
        let id = parse_object_id(content_ref)?;
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        // Soft-deleted content is invisible to reads
        Ok(document.filter(|d| d.deleted_at.is_none()))
    }

    async fn replace(&self, content_ref: &str, input: &AchievementInput) -> Result<()> {
        let id = parse_object_id(content_ref)?;
        let update = doc! {
            "$set": {
                "achievementType": input.achievement_type.as_str(),
                "title": input.title.as_str(),
                "description": input.description.as_str(),
                "details": input.details.clone(),
                "tags": input.tags.clone(),
                "points": input.points,
                "level": input.level.as_deref(),
                "updatedAt": DateTime::now(),
            }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn soft_delete(&self, content_ref: &str) -> Result<()> {
        let id = parse_object_id(content_ref)?;
        let now = DateTime::now();
        let update = doc! {
            "$set": { "deletedAt": now, "updatedAt": now }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn append_history(&self, content_ref: &str, entry: StatusHistoryEntry) -> Result<()> {
        let id = parse_object_id(content_ref)?;
        let entry = bson::to_bson(&entry)
            .map_err(|e| LaurelError::Database(format!("history encode failed: {}", e)))?;
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$push": { "statusHistory": entry } })
            .await?;
        Ok(())
    }

    async fn append_notification(&self, content_ref: &str, notif: NotificationEntry) -> Result<()> {
        let id = parse_object_id(content_ref)?;
        let notif = bson::to_bson(&notif)
            .map_err(|e| LaurelError::Database(format!("notification encode failed: {}", e)))?;
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$push": { "notifications": notif } })
            .await?;
        Ok(())
    }

    async fn append_attachment(&self, content_ref: &str, attachment: Attachment) -> Result<()> {
        let id = parse_object_id(content_ref)?;
        let attachment = bson::to_bson(&attachment)
            .map_err(|e| LaurelError::Database(format!("attachment encode failed: {}", e)))?;
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$push": { "attachments": attachment } })
            .await?;
        Ok(())
    }

    async fn find_by_student_ids(&self, student_ids: &[Uuid]) -> Result<Vec<AchievementDoc>> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = student_ids.iter().map(|id| id.to_string()).collect();
        self.collection
            .find_many(doc! {
                "studentId": { "$in": ids },
                "deletedAt": { "$exists": false },
            })
            .await
    }

    async fn find_by_ids(&self, content_refs: &[String]) -> Result<Vec<AchievementDoc>> {
        if content_refs.is_empty() {
            return Ok(Vec::new());
        }
        // Skip malformed keys rather than failing the whole batch
        let ids: Vec<ObjectId> = content_refs
            .iter()
            .filter_map(|r| ObjectId::parse_str(r).ok())
            .collect();
        self.collection
            .find_many(doc! {
                "_id": { "$in": ids },
                "deletedAt": { "$exists": false },
            })
            .await
    }
}
