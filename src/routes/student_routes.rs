//! Student directory endpoints
//!
//! - `GET /students` — role-scoped listing (student: self, advisor: advisees,
//!   admin: everyone paginated)
//! - `GET /students/me` — own student profile
//! - `GET /students/{id}` — one student, with access check
//! - `GET /students/{id}/achievements` — one student's achievements
//! - `PUT /students/{id}/advisor` — reassign advisor (admin only)

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::helpers::{
    authenticate, error_response, json_response, page_from_query, parse_id, parse_json_body,
    status_from_query, BoxBody,
};
use crate::auth::RoleKind;
use crate::directory::RoleScope;
use crate::server::AppState;
use crate::types::{LaurelError, Paginated, Result};

#[derive(Debug, Deserialize)]
struct AssignAdvisorRequest {
    advisor_id: Uuid,
}

/// Dispatch `/students/*` requests. Returns `None` for unknown paths.
pub async fn handle_student_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["students"]) => handle_list(req, state).await,
        (&Method::GET, ["students", "me"]) => handle_me(req, state).await,
        (&Method::GET, ["students", id]) => handle_get(req, state, id).await,
        (&Method::GET, ["students", id, "achievements"]) => {
            handle_achievements(req, state, id).await
        }
        (&Method::PUT, ["students", id, "advisor"]) => handle_assign_advisor(req, state, id).await,
        _ => return None,
    };

    Some(response.unwrap_or_else(error_response))
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let page = page_from_query(&req);

    let listing = match state.scopes.resolve(&principal).await? {
        RoleScope::Own(student_id) => {
            let student = state
                .directory
                .find_student_by_id(student_id)
                .await?
                .ok_or_else(|| LaurelError::NotFound("student profile".into()))?;
            Paginated::from_full(vec![student], page)
        }
        RoleScope::Advisees(_) => {
            let lecturer = state
                .directory
                .find_lecturer_by_user_id(principal.user_id)
                .await?
                .ok_or_else(|| LaurelError::Forbidden("no lecturer profile".into()))?;
            Paginated::from_full(state.directory.advisees(lecturer.id).await?, page)
        }
        RoleScope::All => state.directory.list_students(page).await?,
    };

    Ok(json_response(StatusCode::OK, &listing))
}

async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;

    let student = state
        .directory
        .find_student_by_user_id(principal.user_id)
        .await?
        .ok_or_else(|| LaurelError::NotFound("no student profile for this account".into()))?;
    Ok(json_response(StatusCode::OK, &student))
}

async fn handle_get(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let id = parse_id(id)?;

    let student = state
        .directory
        .find_student_by_id(id)
        .await?
        .ok_or_else(|| LaurelError::NotFound(format!("student {}", id)))?;

    if !state.scopes.can_access_student(&principal, &student).await? {
        return Err(LaurelError::Forbidden(
            "not allowed to view this student".into(),
        ));
    }

    Ok(json_response(StatusCode::OK, &student))
}

async fn handle_achievements(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let id = parse_id(id)?;
    let status = status_from_query(&req)?;
    let page = page_from_query(&req);

    let listing = state
        .engine
        .list_for_student(&principal, id, status, page)
        .await?;
    Ok(json_response(StatusCode::OK, &listing))
}

async fn handle_assign_advisor(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    if principal.role != RoleKind::Admin {
        return Err(LaurelError::Forbidden(
            "only admins may reassign advisors".into(),
        ));
    }
    let student_id = parse_id(id)?;

    let body: AssignAdvisorRequest = parse_json_body(req, state.args.max_body_bytes).await?;

    state
        .directory
        .find_student_by_id(student_id)
        .await?
        .ok_or_else(|| LaurelError::NotFound(format!("student {}", student_id)))?;
    state
        .directory
        .find_lecturer_by_id(body.advisor_id)
        .await?
        .ok_or_else(|| LaurelError::NotFound(format!("lecturer {}", body.advisor_id)))?;

    state
        .directory
        .assign_advisor(student_id, body.advisor_id)
        .await?;

    let updated = state
        .directory
        .find_student_by_id(student_id)
        .await?
        .ok_or_else(|| LaurelError::NotFound(format!("student {}", student_id)))?;
    Ok(json_response(StatusCode::OK, &updated))
}
