//! Database schemas for Laurel
//!
//! Defines MongoDB document structures for achievement content.
//! Relational row types live next to their stores (`users`, `directory`,
//! `achievements::reference`).

mod content;

pub use content::{
    AchievementDoc, Attachment, NotificationEntry, StatusHistoryEntry, ACHIEVEMENT_COLLECTION,
};
