//! Shared fixtures for the HTTP integration tests: an in-memory database, a
//! scripted model and a temp-dir backed router.

#![allow(dead_code)]

use api_lib::adapters::LocalFileStorage;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use booknotes_core::domain::{
    ChapterNotes, Pdf, PdfStatus, RemoteFile, SubtopicNotes, TopicNotes, User, UserCredentials,
};
use booknotes_core::outline::Outline;
use booknotes_core::ports::{DatabaseService, GenerativeService, PortError, PortResult};
use booknotes_core::prompts;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const OUTLINE_ANSWER: &str = r#"Here is the outline.
```json
[
  {"chapter": "Basics", "topics": [
    {"topic": "Ownership", "sub_topics": ["Moves", "Borrowing"]},
    {"topic": "Types", "sub_topics": ["Structs"]}
  ]}
]
```"#;

pub const QUIZ_ANSWER: &str = r#"```json
[
  {"question": "What does a move do?", "options": ["Copies", "Transfers ownership", "Borrows", "Drops"], "answer": "Transfers ownership"},
  {"question": "Broken entry", "options": ["Only one"], "answer": "Only one"}
]
```"#;

pub const NOTES_ANSWER: &str = "A move transfers ownership of a value.";

//=========================================================================================
// In-memory database
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (String, DateTime<Utc>)>,
    pdfs: Vec<Pdf>,
    outlines: HashMap<i32, Vec<ChapterNotes>>,
    next_pdf_id: i32,
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
    /// Makes `save_outline` fail.
    pub fail_outline_save: AtomicBool,
    /// Makes session lookups fail as if the database were unreachable.
    pub offline: AtomicBool,
}

impl InMemoryDb {
    pub fn pdf_count(&self) -> usize {
        self.tables.lock().unwrap().pdfs.len()
    }

    pub fn outline_of(&self, pdf_id: i32) -> Option<Vec<ChapterNotes>> {
        self.tables.lock().unwrap().outlines.get(&pdf_id).cloned()
    }

    pub fn has_pdf_at(&self, path: &str) -> bool {
        self.tables.lock().unwrap().pdfs.iter().any(|p| p.path == path)
    }

    pub fn status_of(&self, pdf_id: i32) -> Option<PdfStatus> {
        let tables = self.tables.lock().unwrap();
        tables.pdfs.iter().find(|p| p.id == pdf_id).map(|p| p.status)
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user(&self, email: &str, username: &str, hashed_password: &str) -> PortResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email || u.username == username) {
            return Err(PortError::Conflict("Email or username already exists".to_string()));
        }
        tables.users.push(UserCredentials {
            email: email.to_string(),
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(User {
            email: email.to_string(),
            username: username.to_string(),
        })
    }

    async fn get_user_credentials(&self, identifier: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email == identifier)
            .or_else(|| tables.users.iter().find(|u| u.username == identifier))
            .cloned()
            .ok_or_else(|| PortError::NotFound(identifier.to_string()))
    }

    async fn create_auth_session(&self, session_id: &str, username: &str, expires_at: DateTime<Utc>) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .insert(session_id.to_string(), (username.to_string(), expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<User> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        let tables = self.tables.lock().unwrap();
        let (username, expires_at) = tables.sessions.get(session_id).ok_or(PortError::Unauthorized)?;
        if *expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        tables
            .users
            .iter()
            .find(|u| &u.username == username)
            .map(|u| User {
                email: u.email.clone(),
                username: u.username.clone(),
            })
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn create_pdf(&self, username: &str, path: &str) -> PortResult<Pdf> {
        let mut tables = self.tables.lock().unwrap();
        if tables.pdfs.iter().any(|p| p.path == path) {
            return Err(PortError::Conflict(path.to_string()));
        }
        tables.next_pdf_id += 1;
        let pdf = Pdf {
            id: tables.next_pdf_id,
            path: path.to_string(),
            username: username.to_string(),
            status: PdfStatus::Uploaded,
            created_at: Utc::now(),
        };
        tables.pdfs.push(pdf.clone());
        Ok(pdf)
    }

    async fn get_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Pdf> {
        let tables = self.tables.lock().unwrap();
        tables
            .pdfs
            .iter()
            .find(|p| p.id == pdf_id && p.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("PDF {}", pdf_id)))
    }

    async fn get_pdf_by_path(&self, path: &str, username: &str) -> PortResult<Pdf> {
        let tables = self.tables.lock().unwrap();
        tables
            .pdfs
            .iter()
            .find(|p| p.path == path && p.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(path.to_string()))
    }

    async fn latest_pdf(&self, username: &str) -> PortResult<Option<Pdf>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .pdfs
            .iter()
            .filter(|p| p.username == username)
            .max_by_key(|p| p.id)
            .cloned())
    }

    async fn list_pdfs(&self, username: &str) -> PortResult<Vec<Pdf>> {
        let tables = self.tables.lock().unwrap();
        let mut pdfs: Vec<Pdf> = tables
            .pdfs
            .iter()
            .filter(|p| p.username == username)
            .cloned()
            .collect();
        pdfs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(pdfs)
    }

    async fn search_pdfs(&self, username: &str, query: &str) -> PortResult<Vec<Pdf>> {
        let query = query.to_lowercase();
        Ok(self
            .list_pdfs(username)
            .await?
            .into_iter()
            .filter(|p| p.path.to_lowercase().contains(&query))
            .collect())
    }

    async fn set_pdf_status(&self, pdf_id: i32, status: PdfStatus) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(pdf) = tables.pdfs.iter_mut().find(|p| p.id == pdf_id) {
            pdf.status = status;
        }
        Ok(())
    }

    async fn delete_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Option<Pdf>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(index) = tables
            .pdfs
            .iter()
            .position(|p| p.id == pdf_id && p.username == username)
        else {
            return Ok(None);
        };
        tables.outlines.remove(&pdf_id);
        Ok(Some(tables.pdfs.remove(index)))
    }

    async fn save_outline(&self, pdf_id: i32, outline: &Outline) -> PortResult<()> {
        if self.fail_outline_save.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("outline insert failed".to_string()));
        }
        let chapters = outline
            .chapters
            .iter()
            .map(|c| ChapterNotes {
                name: c.name.clone(),
                topics: c
                    .topics
                    .iter()
                    .map(|t| TopicNotes {
                        name: t.name.clone(),
                        subtopics: t
                            .subtopics
                            .iter()
                            .map(|s| SubtopicNotes {
                                name: s.clone(),
                                content: None,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        let mut tables = self.tables.lock().unwrap();
        tables.outlines.insert(pdf_id, chapters);
        if let Some(pdf) = tables.pdfs.iter_mut().find(|p| p.id == pdf_id) {
            pdf.status = PdfStatus::Outlined;
        }
        Ok(())
    }

    async fn set_subtopic_content(
        &self,
        pdf_id: i32,
        chapter: &str,
        topic: &str,
        subtopic: &str,
        content: &str,
    ) -> PortResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let node = tables
            .outlines
            .get_mut(&pdf_id)
            .and_then(|chapters| chapters.iter_mut().find(|c| c.name == chapter))
            .and_then(|c| c.topics.iter_mut().find(|t| t.name == topic))
            .and_then(|t| t.subtopics.iter_mut().find(|s| s.name == subtopic));
        match node {
            Some(node) => {
                node.content = Some(content.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_outline_notes(&self, pdf_id: i32) -> PortResult<Vec<ChapterNotes>> {
        Ok(self.outline_of(pdf_id).unwrap_or_default())
    }
}

//=========================================================================================
// Scripted model
//=========================================================================================

/// Answers by request kind. A `None` answer fails the call. Queued notes
/// answers are used up first, one per call.
pub struct ScriptedModel {
    pub outline: Option<String>,
    pub quiz: Option<String>,
    pub notes: Option<String>,
    pub notes_queue: Mutex<VecDeque<String>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self {
            outline: Some(OUTLINE_ANSWER.to_string()),
            quiz: Some(QUIZ_ANSWER.to_string()),
            notes: Some(NOTES_ANSWER.to_string()),
            notes_queue: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl GenerativeService for ScriptedModel {
    async fn upload_file(&self, path: &Path, mime_type: &str) -> PortResult<RemoteFile> {
        if !path.exists() {
            return Err(PortError::NotFound(path.display().to_string()));
        }
        Ok(RemoteFile {
            uri: format!("test://{}", path.display()),
            mime_type: mime_type.to_string(),
            display_name: path.display().to_string(),
        })
    }

    async fn generate(&self, _file: &RemoteFile, system_instruction: Option<&str>, _prompt: &str) -> PortResult<String> {
        let answer = match system_instruction {
            Some(s) if s == prompts::OUTLINE_SYSTEM_INSTRUCTIONS => self.outline.clone(),
            Some(s) if s == prompts::QUIZ_SYSTEM_INSTRUCTIONS => self.quiz.clone(),
            _ => {
                let queued = self.notes_queue.lock().unwrap().pop_front();
                queued.or_else(|| self.notes.clone())
            }
        };
        answer
            .ok_or_else(|| PortError::External("model unavailable".to_string()))
    }
}

//=========================================================================================
// Test application
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDb>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(ScriptedModel::default())
    }

    pub fn with_model(model: ScriptedModel) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let dir = upload_dir.path().display().to_string();
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://unused/test".to_string()),
            "UPLOAD_DIR" => Some(dir.clone()),
            _ => None,
        })
        .unwrap();

        let db = Arc::new(InMemoryDb::default());
        let state = AppState::new(
            db.clone(),
            Arc::new(LocalFileStorage::new(upload_dir.path())),
            Arc::new(model),
            Arc::new(config),
        );
        Self {
            router: router(Arc::new(state)),
            db,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    pub async fn signup(&self, email: &str, username: &str, password: &str) -> StatusCode {
        let form = format!("email={}&username={}&password={}", email, username, password);
        self.send(form_request("/signup", form)).await.0
    }

    /// Signs up and logs in, returning the session cookie pair.
    pub async fn login_as(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        self.signup(&email, username, "s3cret").await;
        let form = format!("identifier={}&password=s3cret", username);
        let (status, headers, _) = self.send(form_request("/login", form)).await;
        assert_eq!(status, StatusCode::FOUND);
        session_cookie(&headers).expect("login sets a session cookie")
    }

    pub async fn upload(&self, cookie: &str, file_name: &str, content_type: &str) -> (StatusCode, serde_json::Value) {
        self.upload_bytes(cookie, file_name, content_type, b"%PDF-1.4 test").await
    }

    pub async fn upload_bytes(
        &self,
        cookie: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = self
            .send(multipart_request("/upload_pdf/", cookie, file_name, content_type, data))
            .await;
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (status, _, body) = self.send(builder.body(Body::empty()).unwrap()).await;
        (status, body)
    }

    pub async fn get_json(&self, uri: &str, cookie: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.get(uri, Some(cookie)).await;
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    pub async fn post_json(&self, uri: &str, cookie: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }
}

pub fn form_request(uri: &str, form: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

pub fn multipart_request(
    uri: &str,
    cookie: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let boundary = "booknotes-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: {c}\r\n\r\n",
            b = boundary,
            f = file_name,
            c = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A multipart body whose only part is a plain text field.
pub fn multipart_without_file(uri: &str, cookie: &str) -> Request<Body> {
    let boundary = "booknotes-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nRust\r\n--{b}--\r\n",
        b = boundary
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Extracts `session=<id>` from a `Set-Cookie` header.
pub fn session_cookie(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| {
            let pair = v.split(';').next()?.trim();
            (pair.starts_with("session=") && pair.len() > "session=".len()).then(|| pair.to_string())
        })
}
