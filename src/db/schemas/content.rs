//! Achievement content document schema
//!
//! The document store holds the rich side of an achievement: title,
//! description, free-form details, attachments, tags, and the append-only
//! `statusHistory` and `notifications` arrays. The workflow status itself is
//! NOT here — the Postgres reference row is authoritative for that.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::AchievementStatus;
use crate::db::mongo::IntoIndexes;

/// Collection name for achievement content
pub const ACHIEVEMENT_COLLECTION: &str = "achievements";

/// Achievement content document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDoc {
    /// MongoDB document ID; its hex form is the reference row's content key
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Owning student (denormalized from the reference row)
    pub student_id: Uuid,

    /// Category, e.g. "competition" or "certification"
    pub achievement_type: String,

    pub title: String,
    pub description: String,

    /// Free-form details map; shape varies by achievement type
    #[serde(default)]
    pub details: Document,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub points: i32,

    /// Competition level ("local", "national", ...); absent means unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Append-only audit trail; one entry per workflow transition
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,

    /// Append-only verify/reject notifications for the owning student
    #[serde(default)]
    pub notifications: Vec<NotificationEntry>,

    pub created_at: DateTime,
    pub updated_at: DateTime,

    /// Set on soft deletion, together with the reference row's `deleted` status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,
}

/// An uploaded file attached to an achievement
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime,
}

/// One immutable audit record per workflow transition
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: Uuid,

    pub status: AchievementStatus,

    /// Acting user, when the transition had one (initial creation has none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<Uuid>,

    pub changed_at: DateTime,
    pub note: String,
}

impl StatusHistoryEntry {
    pub fn new(status: AchievementStatus, changed_by: Option<Uuid>, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            changed_by,
            changed_at: DateTime::now(),
            note: note.into(),
        }
    }
}

/// A recorded (not delivered) notification for the owning student
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub kind: String,

    pub title: String,
    pub message: String,

    #[serde(default)]
    pub read: bool,

    pub created_at: DateTime,
}

impl NotificationEntry {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for AchievementDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Owning student, for scoped content queries
            (
                doc! { "studentId": 1 },
                Some(
                    IndexOptions::builder()
                        .name("student_id_index".to_string())
                        .build(),
                ),
            ),
            // Soft-deletion flag, paired with studentId in most filters
            (
                doc! { "deletedAt": 1 },
                Some(
                    IndexOptions::builder()
                        .name("deleted_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
