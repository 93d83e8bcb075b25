mod common;

use axum::http::{header, StatusCode};
use booknotes_core::ports::DatabaseService;
use common::{form_request, session_cookie, TestApp};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn signup_redirects_to_login() {
    let app = TestApp::new();
    let (status, headers, _) = app
        .send(form_request(
            "/signup",
            "email=ann@example.com&username=ann&password=pw".to_string(),
        ))
        .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts() {
    let app = TestApp::new();
    assert_eq!(app.signup("ann@example.com", "ann", "pw").await, StatusCode::FOUND);
    assert_eq!(app.signup("ann@example.com", "other", "pw").await, StatusCode::CONFLICT);
    assert_eq!(app.signup("new@example.com", "ann", "pw").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_requires_all_fields() {
    let app = TestApp::new();
    assert_eq!(app.signup("ann@example.com", "", "pw").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_accepts_email_or_username() {
    let app = TestApp::new();
    app.signup("ann@example.com", "ann", "pw").await;

    for identifier in ["ann", "ann@example.com"] {
        let (status, headers, _) = app
            .send(form_request("/login", format!("identifier={}&password=pw", identifier)))
            .await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
        assert!(session_cookie(&headers).is_some());
    }
}

#[tokio::test]
async fn wrong_password_or_unknown_user_is_rejected() {
    let app = TestApp::new();
    app.signup("ann@example.com", "ann", "pw").await;

    for form in ["identifier=ann&password=nope", "identifier=bob&password=pw"] {
        let (status, headers, _) = app.send(form_request("/login", form.to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(session_cookie(&headers).is_none());
    }
}

#[tokio::test]
async fn home_greets_logged_in_user() {
    let app = TestApp::new();
    let cookie = app.login_as("ann").await;

    let (status, body) = app.get("/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("ann"));
    assert!(page.contains("ann@example.com"));

    let (_, body) = app.get("/", None).await;
    assert!(!String::from_utf8(body).unwrap().contains("ann@example.com"));
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = TestApp::new();
    for uri in ["/library", "/api/quiz/Basics", "/view_notes/1"] {
        let (status, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
    let (status, _) = app.get("/library", Some("session=forged")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new();
    let cookie = app.login_as("ann").await;
    assert_eq!(app.get("/library", Some(&cookie)).await.0, StatusCode::OK);

    let (status, _) = app.get("/logout", Some(&cookie)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(app.get("/library", Some(&cookie)).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn usernames_that_look_like_emails_are_rejected() {
    let app = TestApp::new();
    assert_eq!(
        app.signup("mallory@example.com", "ann@example.com", "pw").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(app.signup("ann@example.com", "ann", "pw").await, StatusCode::FOUND);
}

#[tokio::test]
async fn email_login_is_not_shadowed_by_a_matching_username() {
    let app = TestApp::new();
    // A row that predates the username rule and collides with Ann's email.
    app.db
        .create_user("mallory@example.com", "ann@example.com", "not-a-hash")
        .await
        .unwrap();
    assert_eq!(app.signup("ann@example.com", "ann", "pw").await, StatusCode::FOUND);

    let (status, headers, _) = app
        .send(form_request("/login", "identifier=ann@example.com&password=pw".to_string()))
        .await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(session_cookie(&headers).is_some());
}

#[tokio::test]
async fn unreachable_session_store_is_a_server_error() {
    let app = TestApp::new();
    let cookie = app.login_as("ann").await;
    app.db.offline.store(true, Ordering::SeqCst);

    let (status, body) = app.get("/library", Some(&cookie)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].is_string());
}
