//! Authentication and authorization for Laurel
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - Role classification and permission checks
//! - The login/refresh flow backed by the user store

pub mod jwt;
pub mod password;
pub mod roles;
pub mod service;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use password::{hash_password, verify_password};
pub use roles::{perms, Principal, RoleKind};
pub use service::{AuthService, LoginResponse};
