//! Statistics endpoints
//!
//! - `GET /reports/statistics` — role-scoped aggregate statistics
//! - `GET /reports/students/{id}/statistics` — one student's statistics

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use super::helpers::{authenticate, error_response, json_response, parse_id, BoxBody};
use crate::server::AppState;
use crate::types::Result;

/// Dispatch `/reports/*` requests. Returns `None` for unknown paths.
pub async fn handle_report_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["reports", "statistics"]) => handle_statistics(req, state).await,
        (&Method::GET, ["reports", "students", id, "statistics"]) => {
            handle_student_statistics(req, state, id).await
        }
        _ => return None,
    };

    Some(response.unwrap_or_else(error_response))
}

async fn handle_statistics(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let stats = state.reports.statistics(&principal).await?;
    Ok(json_response(StatusCode::OK, &stats))
}

async fn handle_student_statistics(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let stats = state
        .reports
        .student_statistics(&principal, parse_id(id)?)
        .await?;
    Ok(json_response(StatusCode::OK, &stats))
}
