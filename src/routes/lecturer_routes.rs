//! Lecturer directory endpoints
//!
//! - `GET /lecturers` — role-scoped listing (advisor: self, student: own
//!   advisor, admin: everyone paginated)
//! - `GET /lecturers/{id}/advisees` — a lecturer's advisees (self or admin)

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use super::helpers::{
    authenticate, error_response, json_response, page_from_query, parse_id, BoxBody,
};
use crate::auth::RoleKind;
use crate::server::AppState;
use crate::types::{LaurelError, Paginated, Result};

/// Dispatch `/lecturers/*` requests. Returns `None` for unknown paths.
pub async fn handle_lecturer_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["lecturers"]) => handle_list(req, state).await,
        (&Method::GET, ["lecturers", id, "advisees"]) => handle_advisees(req, state, id).await,
        _ => return None,
    };

    Some(response.unwrap_or_else(error_response))
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let page = page_from_query(&req);

    let listing = match principal.role {
        RoleKind::Advisor => {
            let lecturer = state
                .directory
                .find_lecturer_by_user_id(principal.user_id)
                .await?
                .ok_or_else(|| LaurelError::Forbidden("no lecturer profile".into()))?;
            Paginated::from_full(vec![lecturer], page)
        }
        RoleKind::Student => {
            let student = state
                .directory
                .find_student_by_user_id(principal.user_id)
                .await?
                .ok_or_else(|| LaurelError::Forbidden("no student profile".into()))?;
            let advisor_id = student
                .advisor_id
                .ok_or_else(|| LaurelError::Validation("no advisor assigned".into()))?;
            let advisor = state
                .directory
                .find_lecturer_by_id(advisor_id)
                .await?
                .ok_or_else(|| LaurelError::NotFound(format!("lecturer {}", advisor_id)))?;
            Paginated::from_full(vec![advisor], page)
        }
        RoleKind::Admin => state.directory.list_lecturers(page).await?,
        RoleKind::Unknown => return Err(LaurelError::Forbidden("unrecognized role".into())),
    };

    Ok(json_response(StatusCode::OK, &listing))
}

async fn handle_advisees(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let principal = authenticate(&req, &state).await?;
    let lecturer_id = parse_id(id)?;

    let lecturer = state
        .directory
        .find_lecturer_by_id(lecturer_id)
        .await?
        .ok_or_else(|| LaurelError::NotFound(format!("lecturer {}", lecturer_id)))?;

    // Only the lecturer themselves or an admin may list advisees
    let allowed = match principal.role {
        RoleKind::Admin => true,
        RoleKind::Advisor => lecturer.user_id == principal.user_id,
        _ => false,
    };
    if !allowed {
        return Err(LaurelError::Forbidden(
            "not allowed to view this lecturer's advisees".into(),
        ));
    }

    let advisees = state.directory.advisees(lecturer_id).await?;
    Ok(json_response(StatusCode::OK, &advisees))
}
