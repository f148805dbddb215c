//! Database clients for Laurel
//!
//! Postgres holds workflow state, accounts and the person directory;
//! MongoDB holds achievement content documents.

pub mod mongo;
pub mod postgres;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use postgres::connect_postgres;
