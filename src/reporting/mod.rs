//! Reporting aggregator
//!
//! Read-only statistics over verified achievements. Only `verified` rows
//! count — having a record is not the same as having an earned achievement.
//! Scope follows the same role-scope resolution as listings: a student sees
//! their own numbers, an advisor the sum over advisees, an admin everything.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::achievements::{ContentStore, ReferenceStore};
use crate::auth::Principal;
use crate::db::schemas::AchievementDoc;
use crate::directory::{PersonDirectory, RoleScope, ScopeResolver};
use crate::types::{LaurelError, Result};

/// How many students the leaderboard keeps
const TOP_STUDENT_LIMIT: usize = 10;

/// Role-scoped statistics payload
#[derive(Debug, Default, Serialize)]
pub struct AchievementStatistics {
    pub total_per_type: BTreeMap<String, i64>,
    /// Monthly buckets (`YYYY-MM`) over the trailing 12 months
    pub total_per_period: BTreeMap<String, i64>,
    /// Count per competition level; unlabeled content lands in "unknown"
    pub distribution: BTreeMap<String, i64>,
    pub top_students: Vec<TopStudent>,
}

/// Per-student statistics payload
#[derive(Debug, Default, Serialize)]
pub struct StudentAchievementStatistics {
    pub total_achievements: i64,
    pub per_type: BTreeMap<String, i64>,
    pub per_period: BTreeMap<String, i64>,
    pub distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopStudent {
    pub student_id: Uuid,
    pub full_name: String,
    pub points: i64,
    pub count: i64,
}

#[derive(Clone)]
pub struct ReportService {
    references: Arc<dyn ReferenceStore>,
    contents: Arc<dyn ContentStore>,
    directory: Arc<dyn PersonDirectory>,
    scopes: ScopeResolver,
}

impl ReportService {
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

    /// Statistics scoped by the principal's role.
    pub async fn statistics(&self, principal: &Principal) -> Result<AchievementStatistics> {
        match self.scopes.resolve(principal).await? {
            RoleScope::Own(student_id) => self.scoped_statistics(Some(&[student_id])).await,
            RoleScope::Advisees(ids) => {
                if ids.is_empty() {
                    return Ok(AchievementStatistics::default());
                }
                self.scoped_statistics(Some(&ids)).await
            }
            RoleScope::All => self.scoped_statistics(None).await,
        }
    }

    /// Statistics for one student, with the own/advisor/admin access check.
    pub async fn student_statistics(
        &self,
        principal: &Principal,
        student_id: Uuid,
    ) -> Result<StudentAchievementStatistics> {
        let student = self
            .directory
            .find_student_by_id(student_id)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("student {}", student_id)))?;

        if !self.scopes.can_access_student(principal, &student).await? {
            return Err(LaurelError::Forbidden(
                "not allowed to view this student's statistics".into(),
            ));
        }

        let docs = self.verified_docs(Some(&[student_id])).await?;
        let (per_type, per_period, distribution) = bucket_recent(&docs);

        Ok(StudentAchievementStatistics {
            total_achievements: docs.len() as i64,
            per_type,
            per_period,
            distribution,
        })
    }

    async fn scoped_statistics(
        &self,
        student_ids: Option<&[Uuid]>,
    ) -> Result<AchievementStatistics> {
        let docs = self.verified_docs(student_ids).await?;
        let (total_per_type, total_per_period, distribution) = bucket_recent(&docs);

        // Points and counts per student are not time-filtered: the
        // leaderboard reflects everything a student has ever earned.
        let mut per_student: BTreeMap<Uuid, (i64, i64)> = BTreeMap::new();
        for doc in &docs {
            let entry = per_student.entry(doc.student_id).or_default();
            entry.0 += i64::from(doc.points);
            entry.1 += 1;
        }

        let mut top_students = Vec::with_capacity(per_student.len());
        for (student_id, (points, count)) in per_student {
            let full_name = self
                .directory
                .find_student_by_id(student_id)
                .await?
                .map(|s| s.full_name)
                .unwrap_or_else(|| "Unknown".to_string());
            top_students.push(TopStudent {
                student_id,
                full_name,
                points,
                count,
            });
        }

        top_students.sort_by(|a, b| b.points.cmp(&a.points).then(b.count.cmp(&a.count)));
        top_students.truncate(TOP_STUDENT_LIMIT);

        Ok(AchievementStatistics {
            total_per_type,
            total_per_period,
            distribution,
            top_students,
        })
    }

    /// Verified content documents, optionally restricted to a student set.
    async fn verified_docs(&self, student_ids: Option<&[Uuid]>) -> Result<Vec<AchievementDoc>> {
        let refs = self.references.verified_refs(student_ids).await?;
        let content_refs: Vec<String> = refs.into_iter().map(|(_, r)| r).collect();
        self.contents.find_by_ids(&content_refs).await
    }
}

/// Bucket documents created in the trailing 12 months by type, month, and
/// level (missing level counts as "unknown").
fn bucket_recent(
    docs: &[AchievementDoc],
) -> (
    BTreeMap<String, i64>,
    BTreeMap<String, i64>,
    BTreeMap<String, i64>,
) {
    let cutoff = Utc::now() - Duration::days(365);
    let mut per_type = BTreeMap::new();
    let mut per_period = BTreeMap::new();
    let mut per_level = BTreeMap::new();

    for doc in docs {
        let created_at = doc.created_at.to_chrono();
        if created_at < cutoff {
            continue;
        }
        *per_type.entry(doc.achievement_type.clone()).or_default() += 1;
        *per_period
            .entry(created_at.format("%Y-%m").to_string())
            .or_default() += 1;
        let level = doc.level.clone().unwrap_or_else(|| "unknown".to_string());
        *per_level.entry(level).or_default() += 1;
    }

    (per_type, per_period, per_level)
}
