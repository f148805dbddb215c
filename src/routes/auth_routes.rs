//! Authentication endpoints
//!
//! - `POST /auth/login` — username-or-email + password → token pair
//! - `POST /auth/refresh` — refresh token → rotated token pair
//! - `POST /auth/logout` — stateless acknowledgement (tokens are client-held)
//! - `GET /auth/profile` — the authenticated user's account

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::helpers::{
    authenticate, error_response, json_response, parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::types::LaurelError;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    /// Username or email
    identifier: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize)]
struct LogoutResponse {
    status: &'static str,
}

/// Dispatch `/auth/*` requests. Returns `None` for unknown paths.
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/auth/login") => Some(handle_login(req, state).await),
        (Method::POST, "/auth/refresh") => Some(handle_refresh(req, state).await),
        (Method::POST, "/auth/logout") => Some(handle_logout()),
        (Method::GET, "/auth/profile") => Some(handle_profile(req, state).await),
        _ => None,
    }
}

async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    if body.identifier.is_empty() || body.password.is_empty() {
        return error_response(LaurelError::BadRequest(
            "identifier and password are required".into(),
        ));
    }

    match state.auth.login(&body.identifier, &body.password).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}

async fn handle_refresh(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: RefreshRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.auth.refresh(&body.refresh_token).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}

fn handle_logout() -> Response<BoxBody> {
    // Tokens are stateless; logout is a client-side discard
    json_response(StatusCode::OK, &LogoutResponse { status: "logged out" })
}

async fn handle_profile(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let principal = match authenticate(&req, &state).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state.users.get(principal.user_id).await {
        Ok(user) => json_response(StatusCode::OK, &user),
        Err(e) => error_response(e),
    }
}
