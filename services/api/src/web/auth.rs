//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use booknotes_core::ports::PortError;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    /// Either the email address or the username.
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn redirect(location: &'static str) -> (StatusCode, [(header::HeaderName, &'static str); 1]) {
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {:?}", e)))
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hashed)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {:?}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn session_cookie(session_id: &str, ttl: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        ttl.num_seconds()
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /signup - Create a new user account
#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Account created, redirect to /login"),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Email or username already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    let username = form.username.trim();
    if email.is_empty() || username.is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email, username and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    // Login accepts either identifier, so a username must never look like an email.
    if username.contains('/') || username.contains('@') || username.starts_with('.') {
        return Err(AppError::BadRequest("Invalid username".to_string()));
    }

    // 1. Hash the password
    let password_hash = hash_password(&form.password)?;

    // 2. Create user in database
    state
        .db
        .create_user(email, username, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(msg) => AppError::AuthConflict(msg),
            other => {
                error!("Failed to create user: {:?}", other);
                AppError::from(other)
            }
        })?;

    info!("New account created for {}", username);
    Ok(redirect("/login").into_response())
}

/// POST /login - Login with an existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Login successful, session cookie set"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    // 1. Get user by email or username
    let user_creds = match state.db.get_user_credentials(form.identifier.trim()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    if !verify_password(&form.password, &user_creds.hashed_password)? {
        warn!("Failed login attempt for {}", user_creds.username);
        return Err(AppError::InvalidCredentials);
    }

    // 3. Generate auth session ID and expiry
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;

    // 4. Create auth session in database
    state
        .db
        .create_auth_session(&auth_session_id, &user_creds.username, expires_at)
        .await?;

    info!("User {} logged in", user_creds.username);

    // 5. Return redirect with cookie
    let (status, location) = redirect("/");
    Ok((
        status,
        location,
        [(header::SET_COOKIE, session_cookie(&auth_session_id, ttl))],
    )
        .into_response())
}

/// GET /logout - Invalidate the session, if any, and clear the cookie
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 302, description = "Session cleared, redirect to /")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(session_id) = session_id_from_headers(&headers) {
        if let Err(e) = state.db.delete_auth_session(session_id).await {
            error!("Failed to delete auth session: {:?}", e);
        }
    }
    info!("Session cleared");

    let (status, location) = redirect("/");
    (
        status,
        location,
        [(header::SET_COOKIE, session_cookie("", Duration::zero()))],
    )
        .into_response()
}
