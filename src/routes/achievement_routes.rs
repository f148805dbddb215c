//! Achievement lifecycle endpoints
//!
//! - `GET    /achievements` — role-scoped listing (status/page/limit filters)
//! - `POST   /achievements` — create a draft (students)
//! - `GET    /achievements/{id}` — full detail
//! - `PUT    /achievements/{id}` — update content (draft/rejected only)
//! - `DELETE /achievements/{id}` — soft delete (draft only, owner)
//! - `POST   /achievements/{id}/submit` — submit for verification (owner)
//! - `POST   /achievements/{id}/verify` — verify (advisor/admin)
//! - `POST   /achievements/{id}/reject` — reject with note (advisor/admin)
//! - `GET    /achievements/{id}/history` — status history
//! - `POST   /achievements/{id}/attachments` — upload an attachment

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::helpers::{
    authenticate, error_response, json_response, page_from_query, parse_id, parse_json_body,
    query_param, read_body, status_from_query, BoxBody, TransitionResponse,
};
use crate::achievements::{AchievementInput, Outcome};
use crate::auth::perms;
use crate::server::AppState;
use crate::types::{LaurelError, Result};

#[derive(Debug, Deserialize)]
struct RejectRequest {
    rejection_note: String,
}

fn transition_response(status: &'static str, outcome: Outcome<()>) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &TransitionResponse {
            status,
            warnings: outcome.warnings().to_vec(),
        },
    )
}

/// Dispatch `/achievements/*` requests. Returns `None` for unknown paths.
pub async fn handle_achievement_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["achievements"]) => handle_list(req, state).await,
        (&Method::POST, ["achievements"]) => handle_create(req, state).await,
        (&Method::GET, ["achievements", id]) => handle_detail(req, state, id).await,
        (&Method::PUT, ["achievements", id]) => handle_update(req, state, id).await,
        (&Method::DELETE, ["achievements", id]) => handle_delete(req, state, id).await,
        (&Method::POST, ["achievements", id, "submit"]) => handle_submit(req, state, id).await,
        (&Method::POST, ["achievements", id, "verify"]) => handle_verify(req, state, id).await,
        (&Method::POST, ["achievements", id, "reject"]) => handle_reject(req, state, id).await,
        (&Method::GET, ["achievements", id, "history"]) => handle_history(req, state, id).await,
        (&Method::POST, ["achievements", id, "attachments"]) => {
            handle_attach(req, state, id).await
        }
        _ => return None,
    };

    Some(response.unwrap_or_else(error_response))
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_READ)?;

    let status = status_from_query(&req)?;
    let page = page_from_query(&req);

    let listing = state
        .engine
        .list_for_principal(&principal, status, page)
        .await?;
    Ok(json_response(StatusCode::OK, &listing))
}

async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_CREATE)?;

    let input: AchievementInput = parse_json_body(req, state.args.max_body_bytes).await?;
    let reference = state.engine.create(principal.user_id, input).await?;
    Ok(json_response(StatusCode::CREATED, &reference))
}

async fn handle_detail(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_READ)?;

    let detail = state.engine.get_detail(parse_id(id)?).await?;
    Ok(json_response(StatusCode::OK, &detail))
}

async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_UPDATE)?;
    let id = parse_id(id)?;

    let input: AchievementInput = parse_json_body(req, state.args.max_body_bytes).await?;
    state.engine.update(id, input).await?;
    Ok(json_response(
        StatusCode::OK,
        &TransitionResponse {
            status: "updated",
            warnings: Vec::new(),
        },
    ))
}

async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_DELETE)?;

    let outcome = state
        .engine
        .delete(parse_id(id)?, principal.user_id)
        .await?;
    Ok(transition_response("deleted", outcome))
}

async fn handle_submit(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;

    let outcome = state
        .engine
        .submit(parse_id(id)?, principal.user_id)
        .await?;
    Ok(transition_response("submitted", outcome))
}

async fn handle_verify(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_reviewer()?;
    principal.require_permission(perms::ACHIEVEMENT_VERIFY)?;

    let outcome = state
        .engine
        .verify(parse_id(id)?, principal.user_id)
        .await?;
    Ok(transition_response("verified", outcome))
}

async fn handle_reject(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_reviewer()?;
    principal.require_permission(perms::ACHIEVEMENT_VERIFY)?;
    let id = parse_id(id)?;

    let body: RejectRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let outcome = state
        .engine
        .reject(id, principal.user_id, &body.rejection_note)
        .await?;
    Ok(transition_response("rejected", outcome))
}

async fn handle_history(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::ACHIEVEMENT_READ)?;

    let history = state.engine.history(parse_id(id)?).await?;
    Ok(json_response(StatusCode::OK, &history))
}

/// Raw-body upload; the file name comes from the `file_name` query parameter
/// and the MIME type from the Content-Type header.
async fn handle_attach(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    // Any authenticated caller; the engine enforces the status rule
    authenticate(&req, &state).await?;
    let id: Uuid = parse_id(id)?;

    let file_name = query_param(&req, "file_name")
        .ok_or_else(|| LaurelError::BadRequest("file_name query parameter is required".into()))?;
    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let bytes = read_body(req, state.args.max_body_bytes).await?;
    if bytes.is_empty() {
        return Err(LaurelError::BadRequest("empty upload".into()));
    }

    let file_url = state.blobs.store(&bytes, &file_name, &content_type).await?;
    let attachment = state
        .engine
        .attach(id, file_name, file_url, content_type)
        .await?;
    Ok(json_response(StatusCode::OK, &attachment))
}
