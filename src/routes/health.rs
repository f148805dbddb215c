//! Health check endpoints
//!
//! - `/health`, `/healthz` — liveness: the process is up
//! - `/ready`, `/readyz` — readiness: both stores answer a ping
//! - `/version` — package version for deployment verification

use hyper::StatusCode;
use hyper::Response;
use serde::Serialize;
use std::sync::Arc;

use super::helpers::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub uptime: u64,
    pub node_id: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub postgres: bool,
    pub mongodb: bool,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// Liveness probe
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            node_id: state.args.node_id.to_string(),
        },
    )
}

/// Readiness probe: pings both stores
pub async fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let postgres = sqlx::query("SELECT 1").execute(&state.pg_pool).await.is_ok();
    let mongodb = state
        .mongo
        .inner()
        .database(state.mongo.db_name())
        .run_command(bson::doc! { "ping": 1 })
        .await
        .is_ok();

    let ready = postgres && mongodb;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(
        status,
        &ReadinessResponse {
            ready,
            postgres,
            mongodb,
        },
    )
}

/// Version info
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}
