//! User administration endpoints (admin-only via `*:users` permissions)
//!
//! - `GET    /users` — list accounts
//! - `POST   /users` — create an account
//! - `GET    /users/{id}` — one account
//! - `PUT    /users/{id}` — update an account
//! - `DELETE /users/{id}` — remove an account
//! - `PUT    /users/{id}/role` — reassign role

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::helpers::{
    authenticate, error_response, json_response, page_from_query, parse_id, parse_json_body,
    BoxBody,
};
use crate::auth::perms;
use crate::server::AppState;
use crate::types::Result;
use crate::users::{CreateUserRequest, UpdateUserRequest};

#[derive(Debug, Deserialize)]
struct SetRoleRequest {
    role_id: Uuid,
}

#[derive(Serialize)]
struct DeletedResponse {
    status: &'static str,
}

/// Dispatch `/users/*` requests. Returns `None` for unknown paths.
pub async fn handle_user_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["users"]) => handle_list(req, state).await,
        (&Method::POST, ["users"]) => handle_create(req, state).await,
        (&Method::GET, ["users", id]) => handle_get(req, state, id).await,
        (&Method::PUT, ["users", id]) => handle_update(req, state, id).await,
        (&Method::DELETE, ["users", id]) => handle_delete(req, state, id).await,
        (&Method::PUT, ["users", id, "role"]) => handle_set_role(req, state, id).await,
        _ => return None,
    };

    Some(response.unwrap_or_else(error_response))
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_READ)?;

    let page = page_from_query(&req);
    let listing = state.users.list(page).await?;
    Ok(json_response(StatusCode::OK, &listing))
}

async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_CREATE)?;

    let body: CreateUserRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let user = state.users.create(body).await?;
    Ok(json_response(StatusCode::CREATED, &user))
}

async fn handle_get(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_READ)?;

    let user = state.users.get(parse_id(id)?).await?;
    Ok(json_response(StatusCode::OK, &user))
}

async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_UPDATE)?;
    let id = parse_id(id)?;

    let body: UpdateUserRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let user = state.users.update(id, body).await?;
    Ok(json_response(StatusCode::OK, &user))
}

async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_DELETE)?;

    state.users.delete(parse_id(id)?).await?;
    Ok(json_response(StatusCode::OK, &DeletedResponse { status: "deleted" }))
}

async fn handle_set_role(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    principal.require_permission(perms::USERS_UPDATE_ROLE)?;
    let id = parse_id(id)?;

    let body: SetRoleRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let user = state.users.set_role(id, body.role_id).await?;
    Ok(json_response(StatusCode::OK, &user))
}
