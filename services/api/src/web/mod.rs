pub mod auth;
pub mod content;
pub mod library;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the application router. Everything except the pages and the auth
/// forms requires a valid session cookie.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(pages::home_handler))
        .route("/signup", get(pages::signup_page).post(auth::signup_handler))
        .route("/login", get(pages::login_page).post(auth::login_handler))
        .route("/logout", get(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/upload_pdf/", post(upload::upload_pdf_handler))
        .route("/library", get(library::list_pdfs_handler))
        .route("/library/search_pdf", get(library::search_pdfs_handler))
        .route("/delete_pdf/{pdf_id}", post(library::delete_pdf_handler))
        .route("/uploads/{pdf_name}", get(library::download_pdf_handler))
        .route("/view_notes/{pdfid}", get(library::view_notes_handler))
        .route("/api/quiz/{chapter}", get(content::quiz_handler))
        .route(
            "/api/notes/{chapter}/{topic}/{subtopic}",
            get(content::notes_handler),
        )
        .route(
            "/api/topic_notes/{chapter}/{topic}",
            get(content::topic_notes_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let body_limit = app_state.config.max_upload_bytes;
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
