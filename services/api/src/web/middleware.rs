//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use booknotes_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::AppError;
use crate::web::state::{AppState, SessionUser};

pub const SESSION_COOKIE: &str = "session";

/// Reads the session ID out of the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// Resolves the session cookie to a user. Any failure means "not logged in".
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let session_id = session_id_from_headers(headers)?;
    match state.db.validate_auth_session(session_id).await {
        Ok(user) => Some(SessionUser {
            username: user.username,
            email: user.email,
        }),
        Err(e) => {
            debug!("Session cookie rejected: {}", e);
            None
        }
    }
}

/// Middleware that validates the auth session cookie and resolves the user.
///
/// If valid, inserts the `SessionUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized. A failing session lookup is a 500.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Parse session ID from cookie
    let session_id = session_id_from_headers(req.headers())
        .ok_or_else(AppError::unauthorized)?
        .to_string();

    // 2. Validate auth session in database, get the user
    let user = state
        .db
        .validate_auth_session(&session_id)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                debug!("Session cookie is unknown or expired");
                AppError::unauthorized()
            }
            other => {
                error!("Failed to validate auth session: {:?}", other);
                AppError::from(other)
            }
        })?;

    // 3. Insert the user into request extensions
    req.extensions_mut().insert(SessionUser {
        username: user.username,
        email: user.email,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
