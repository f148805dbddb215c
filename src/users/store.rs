//! Postgres-backed user store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{User, UserStore};
use crate::types::{Page, Paginated, Result};

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role_id, is_active, \
                            created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1 LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list(&self, page: Page) -> Result<Paginated<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(users, page, total as u64))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, full_name, role_id, \
             is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role_id)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET username = $1, email = $2, password_hash = $3, full_name = $4, \
             role_id = $5, is_active = $6, updated_at = $7 WHERE id = $8",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role_id)
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET role_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(role_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn role_name(&self, role_id: Uuid) -> Result<Option<String>> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<String>> {
        let perms: Vec<String> = sqlx::query_scalar(
            "SELECT p.name FROM role_permissions rp \
             JOIN permissions p ON rp.permission_id = p.id \
             WHERE rp.role_id = $1",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(perms)
    }
}
