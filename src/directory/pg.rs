//! Postgres-backed person directory

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Lecturer, PersonDirectory, Student};
use crate::types::{Page, Paginated, Result};

const STUDENT_SELECT: &str = "SELECT s.id, s.user_id, s.student_number, s.program_study, \
                              s.academic_year, s.advisor_id, u.full_name, s.created_at \
                              FROM students s JOIN users u ON s.user_id = u.id";

const LECTURER_SELECT: &str = "SELECT l.id, l.user_id, l.lecturer_number, l.department, \
                               u.full_name, l.created_at \
                               FROM lecturers l JOIN users u ON l.user_id = u.id";

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonDirectory for PgDirectory {
    async fn find_student_by_user_id(&self, user_id: Uuid) -> Result<Option<Student>> {
        let query = format!("{STUDENT_SELECT} WHERE s.user_id = $1");
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        let query = format!("{STUDENT_SELECT} WHERE s.id = $1");
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn find_lecturer_by_user_id(&self, user_id: Uuid) -> Result<Option<Lecturer>> {
        let query = format!("{LECTURER_SELECT} WHERE l.user_id = $1");
        let lecturer = sqlx::query_as::<_, Lecturer>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lecturer)
    }

    async fn find_lecturer_by_id(&self, id: Uuid) -> Result<Option<Lecturer>> {
        let query = format!("{LECTURER_SELECT} WHERE l.id = $1");
        let lecturer = sqlx::query_as::<_, Lecturer>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lecturer)
    }

    async fn advisee_student_ids(&self, advisor_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM students WHERE advisor_id = $1")
            .bind(advisor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn advisees(&self, advisor_id: Uuid) -> Result<Vec<Student>> {
        let query = format!("{STUDENT_SELECT} WHERE s.advisor_id = $1 ORDER BY s.created_at DESC");
        let students = sqlx::query_as::<_, Student>(&query)
            .bind(advisor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn list_students(&self, page: Page) -> Result<Paginated<Student>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{STUDENT_SELECT} ORDER BY s.created_at DESC LIMIT $1 OFFSET $2");
        let students = sqlx::query_as::<_, Student>(&query)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(students, page, total as u64))
    }

    async fn list_lecturers(&self, page: Page) -> Result<Paginated<Lecturer>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lecturers")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{LECTURER_SELECT} ORDER BY l.created_at DESC LIMIT $1 OFFSET $2");
        let lecturers = sqlx::query_as::<_, Lecturer>(&query)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(lecturers, page, total as u64))
    }

    async fn assign_advisor(&self, student_id: Uuid, advisor_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE students SET advisor_id = $1 WHERE id = $2")
            .bind(advisor_id)
            .bind(student_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
