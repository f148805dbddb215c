//! Login and token refresh backed by the user store
//!
//! Flow:
//! 1. Look the account up by username or email
//! 2. Reject inactive accounts before touching the password
//! 3. Verify the password against the stored Argon2 hash
//! 4. Resolve role name + permissions and mint access/refresh tokens

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::auth::{verify_password, JwtValidator, TokenInput};
use crate::types::{LaurelError, Result};
use crate::users::{User, UserStore};

/// Successful login/refresh payload
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: User,
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtValidator,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtValidator) -> Self {
        Self { users, jwt }
    }

    /// Authenticate with username-or-email plus password
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse> {
        let user = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| LaurelError::Unauthorized("invalid credentials".into()))?;

        if !user.is_active {
            return Err(LaurelError::Unauthorized("account inactive".into()));
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(LaurelError::Unauthorized("invalid credentials".into()));
        }

        info!(user_id = %user.id, "login successful");
        self.issue_tokens(user).await
    }

    /// Exchange a valid refresh token for a new token pair (rotation)
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse> {
        let result = self.jwt.verify_token(refresh_token);
        let claims = result
            .claims
            .ok_or_else(|| LaurelError::Unauthorized("invalid refresh token".into()))?;

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| LaurelError::Unauthorized("user no longer exists".into()))?;

        if !user.is_active {
            return Err(LaurelError::Unauthorized("account inactive".into()));
        }

        self.issue_tokens(user).await
    }

    async fn issue_tokens(&self, user: User) -> Result<LoginResponse> {
        let role = self
            .users
            .role_name(user.role_id)
            .await?
            .ok_or_else(|| LaurelError::Internal("account has no role".into()))?;
        let permissions = self.users.permissions_for_role(user.role_id).await?;

        let input = TokenInput {
            user_id: user.id,
            role_id: user.role_id,
            role_name: role.clone(),
        };
        let token = self.jwt.generate_token(input.clone())?;
        let refresh_token = self.jwt.generate_refresh_token(input)?;

        Ok(LoginResponse {
            token,
            refresh_token,
            user,
            role,
            permissions,
        })
    }
}
