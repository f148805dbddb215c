//! Shared request/response plumbing for route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::achievements::AchievementStatus;
use crate::auth::{extract_token_from_header, Principal, RoleKind};
use crate::server::AppState;
use crate::types::{LaurelError, Page, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Standard error payload
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Payload for successful lifecycle transitions. `warnings` is present only
/// when the authoritative write committed but an advisory write failed.
#[derive(Serialize)]
pub struct TransitionResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

pub fn error_response(err: LaurelError) -> Response<BoxBody> {
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &ErrorResponse { error: message })
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(full_body(Bytes::new()))
        .unwrap()
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("no route for {}", path),
        },
    )
}

/// Collect the request body, bounded by the configured size limit
pub async fn read_body(req: Request<Incoming>, max_bytes: usize) -> Result<Bytes> {
    let body = req
        .collect()
        .await
        .map_err(|e| LaurelError::BadRequest(format!("failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > max_bytes {
        return Err(LaurelError::BadRequest("request body too large".into()));
    }
    Ok(bytes)
}

pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
    max_bytes: usize,
) -> Result<T> {
    let bytes = read_body(req, max_bytes).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| LaurelError::BadRequest(format!("invalid JSON: {}", e)))
}

/// Resolve the acting principal: verify the bearer token, then load the
/// role's permission grants from the user store.
pub async fn authenticate(req: &Request<Incoming>, state: &Arc<AppState>) -> Result<Principal> {
    let auth_header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(auth_header)
        .ok_or_else(|| LaurelError::Unauthorized("missing authorization header".into()))?;

    let result = state.jwt.verify_token(token);
    let claims = result.claims.ok_or_else(|| {
        LaurelError::Unauthorized(result.error.unwrap_or_else(|| "invalid token".into()))
    })?;

    let permissions = state
        .user_store
        .permissions_for_role(claims.role_id)
        .await?;

    Ok(Principal {
        user_id: claims.user_id,
        role_id: claims.role_id,
        role: RoleKind::from_name(&claims.role_name),
        permissions,
    })
}

/// Get one query parameter from a request URI
pub fn query_param(req: &Request<Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Page/limit from query parameters, clamped
pub fn page_from_query(req: &Request<Incoming>) -> Page {
    let page = query_param(req, "page").and_then(|p| p.parse().ok());
    let limit = query_param(req, "limit").and_then(|l| l.parse().ok());
    Page::new(page, limit)
}

/// Optional status filter from query parameters
pub fn status_from_query(req: &Request<Incoming>) -> Result<Option<AchievementStatus>> {
    match query_param(req, "status") {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}

/// Parse a path segment as a UUID
pub fn parse_id(segment: &str) -> Result<Uuid> {
    Uuid::parse_str(segment).map_err(|_| LaurelError::BadRequest(format!("invalid id: {}", segment)))
}
