//! Laurel - achievement tracking backend
//!
//! Students submit achievements, advisors verify or reject them, admins
//! manage accounts and read aggregate statistics. Workflow state lives in
//! Postgres; achievement content and its audit trail live in MongoDB.
//!
//! ## Services
//!
//! - **Lifecycle engine**: the `draft → submitted → verified|rejected →
//!   deleted` state machine and its dual-store write protocol
//! - **Person directory**: student/lecturer lookups and advisor scoping
//! - **Reporting**: role-scoped statistics over verified achievements
//! - **Auth**: JWT + Argon2 login, role and permission resolution

pub mod achievements;
pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod directory;
pub mod reporting;
pub mod routes;
pub mod server;
pub mod types;
pub mod users;

#[cfg(test)]
pub mod testutil;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LaurelError, Result};
