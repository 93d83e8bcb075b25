//! services/api/src/web/pages.rs
//!
//! The few HTML pages the service serves. These are deliberately bare forms;
//! a real frontend talks to the JSON endpoints.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse},
};
use std::sync::Arc;

use crate::web::middleware::current_user;
use crate::web::state::{AppState, SessionUser};

const SIGNUP_PAGE: &str = r#"<!doctype html>
<html><head><title>Sign up</title></head><body>
<h1>Sign up</h1>
<form method="post" action="/signup">
  <input name="email" type="email" placeholder="Email" required>
  <input name="username" placeholder="Username" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Create account</button>
</form>
<p><a href="/login">Already have an account?</a></p>
</body></html>"#;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html><head><title>Log in</title></head><body>
<h1>Log in</h1>
<form method="post" action="/login">
  <input name="identifier" placeholder="Email or username" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Log in</button>
</form>
<p><a href="/signup">Create an account</a></p>
</body></html>"#;

/// GET /signup
pub async fn signup_page() -> Html<&'static str> {
    Html(SIGNUP_PAGE)
}

/// GET /login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// GET / - greets the session user, if any.
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = current_user(&state, &headers).await;
    Html(render_home(user.as_ref()))
}

fn render_home(user: Option<&SessionUser>) -> String {
    let body = match user {
        Some(user) => format!(
            "<p>Welcome back, {} ({})!</p>\n\
             <form method=\"post\" action=\"/upload_pdf/\" enctype=\"multipart/form-data\">\n\
             <input type=\"file\" name=\"file\" accept=\"application/pdf\">\n\
             <button type=\"submit\">Upload PDF</button>\n</form>\n\
             <p><a href=\"/library\">Library</a> | <a href=\"/logout\">Log out</a></p>",
            escape_html(&user.username),
            escape_html(&user.email)
        ),
        None => "<p><a href=\"/login\">Log in</a> or <a href=\"/signup\">sign up</a> to upload a book.</p>"
            .to_string(),
    };
    format!(
        "<!doctype html>\n<html><head><title>Booknotes</title></head><body>\n<h1>Booknotes</h1>\n{}\n</body></html>",
        body
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
