//! User accounts, roles, and permissions
//!
//! Users live in Postgres together with their role and the role's permission
//! grants. Account administration is admin-only and gated by the
//! `*:users` permissions.

mod store;

pub use store::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::types::{LaurelError, Page, Paginated, Result};

/// A user account row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 hash; never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store contract for user accounts and role/permission lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn list(&self, page: Page) -> Result<Paginated<User>>;
    async fn insert(&self, user: &User) -> Result<()>;
    async fn update(&self, user: &User) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<()>;
    async fn role_name(&self, role_id: Uuid) -> Result<Option<String>>;
    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<String>>;
}

/// Request body for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role_id: Uuid,
}

/// Request body for updating a user. A missing password keeps the old hash.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Account administration on top of a [`UserStore`]
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, page: Page) -> Result<Paginated<User>> {
        self.store.list(page).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| LaurelError::NotFound(format!("user {}", id)))
    }

    pub async fn create(&self, req: CreateUserRequest) -> Result<User> {
        if req.username.is_empty()
            || req.email.is_empty()
            || req.password.is_empty()
            || req.full_name.is_empty()
        {
            return Err(LaurelError::Validation(
                "username, email, password and full_name are required".into(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            password_hash: hash_password(&req.password)?,
            full_name: req.full_name,
            role_id: req.role_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&user).await?;
        self.get(user.id).await
    }

    pub async fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<User> {
        let mut user = self.get(id).await?;

        if let Some(username) = req.username {
            user.username = username;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(full_name) = req.full_name {
            user.full_name = full_name;
        }
        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }
        if let Some(password) = req.password {
            if !password.is_empty() {
                user.password_hash = hash_password(&password)?;
            }
        }
        user.updated_at = Utc::now();

        self.store.update(&user).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        // Surface NotFound before attempting the delete
        self.get(id).await?;
        self.store.delete(id).await
    }

    pub async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<User> {
        self.get(id).await?;
        if self.store.role_name(role_id).await?.is_none() {
            return Err(LaurelError::Validation(format!(
                "role {} does not exist",
                role_id
            )));
        }
        self.store.set_role(id, role_id).await?;
        self.get(id).await
    }
}
