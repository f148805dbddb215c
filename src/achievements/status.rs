//! Achievement workflow statuses and the transitions between them
//!
//! ```text
//!            submit            verify
//! draft ───────────► submitted ──────► verified
//!   │                 ▲     │
//!   │ delete          │     │ reject(note)
//!   ▼                 │     ▼
//! deleted             └── rejected
//!                       (resubmit)
//! ```
//!
//! `verified` and `deleted` have no outgoing transitions. A rejected
//! achievement can only be resubmitted, never verified directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::LaurelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStatus {
    Draft,
    Submitted,
    Verified,
    Rejected,
    Deleted,
}

impl AchievementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementStatus::Draft => "draft",
            AchievementStatus::Submitted => "submitted",
            AchievementStatus::Verified => "verified",
            AchievementStatus::Rejected => "rejected",
            AchievementStatus::Deleted => "deleted",
        }
    }

    /// May the owner edit or submit content in this status?
    pub fn is_editable(self) -> bool {
        matches!(self, AchievementStatus::Draft | AchievementStatus::Rejected)
    }

    /// May a reviewer verify or reject in this status?
    pub fn is_reviewable(self) -> bool {
        self == AchievementStatus::Submitted
    }

    /// May the owner delete in this status?
    pub fn is_deletable(self) -> bool {
        self == AchievementStatus::Draft
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AchievementStatus {
    type Error = LaurelError;

    fn try_from(value: String) -> Result<Self, LaurelError> {
        value.parse()
    }
}

impl FromStr for AchievementStatus {
    type Err = LaurelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AchievementStatus::Draft),
            "submitted" => Ok(AchievementStatus::Submitted),
            "verified" => Ok(AchievementStatus::Verified),
            "rejected" => Ok(AchievementStatus::Rejected),
            "deleted" => Ok(AchievementStatus::Deleted),
            other => Err(LaurelError::Validation(format!(
                "unknown achievement status: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AchievementStatus::*;

    #[test]
    fn test_round_trip() {
        for status in [Draft, Submitted, Verified, Rejected, Deleted] {
            assert_eq!(status.as_str().parse::<AchievementStatus>().unwrap(), status);
        }
        assert!("pending".parse::<AchievementStatus>().is_err());
    }

    #[test]
    fn test_transition_table() {
        // submit: draft and rejected only
        assert!(Draft.is_editable());
        assert!(Rejected.is_editable());
        assert!(!Submitted.is_editable());
        assert!(!Verified.is_editable());
        assert!(!Deleted.is_editable());

        // verify/reject: submitted only — a rejected achievement must be
        // resubmitted before it can be verified
        assert!(Submitted.is_reviewable());
        assert!(!Rejected.is_reviewable());
        assert!(!Draft.is_reviewable());
        assert!(!Verified.is_reviewable());
        assert!(!Deleted.is_reviewable());

        // delete: draft only
        assert!(Draft.is_deletable());
        assert!(!Submitted.is_deletable());
        assert!(!Verified.is_deletable());
        assert!(!Rejected.is_deletable());
        assert!(!Deleted.is_deletable());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&Submitted).unwrap();
        assert_eq!(json, "\"submitted\"");
        let back: AchievementStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Submitted);
    }
}
