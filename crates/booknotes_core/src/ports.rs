//! crates/booknotes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::domain::{ChapterNotes, Pdf, PdfStatus, RemoteFile, User, UserCredentials};
use crate::outline::Outline;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("External service error: {0}")]
    External(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---

    /// Fails with `PortError::Conflict` when the email or username is taken.
    async fn create_user(&self, email: &str, username: &str, hashed_password: &str)
        -> PortResult<User>;

    /// Looks a user up by email or username. An email match wins over a username match.
    async fn get_user_credentials(&self, identifier: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired session to its user, or `PortError::Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<User>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- PDF Management ---
    /// Fails with `PortError::Conflict` when the path is already registered.
    async fn create_pdf(&self, username: &str, path: &str) -> PortResult<Pdf>;

    /// Fetches a PDF owned by `username`; other users' PDFs are `NotFound`.
    async fn get_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Pdf>;

    async fn get_pdf_by_path(&self, path: &str, username: &str) -> PortResult<Pdf>;

    async fn latest_pdf(&self, username: &str) -> PortResult<Option<Pdf>>;

    async fn list_pdfs(&self, username: &str) -> PortResult<Vec<Pdf>>;

    /// Case-insensitive substring match on the stored path.
    async fn search_pdfs(&self, username: &str, query: &str) -> PortResult<Vec<Pdf>>;

    async fn set_pdf_status(&self, pdf_id: i32, status: PdfStatus) -> PortResult<()>;

    /// Deletes the PDF and its whole outline. Returns `None` when the PDF does
    /// not exist or belongs to someone else.
    async fn delete_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Option<Pdf>>;

    // --- Outline Management ---

    /// Persists the outline atomically and moves the PDF to `Outlined`.
    async fn save_outline(&self, pdf_id: i32, outline: &Outline) -> PortResult<()>;

    /// Overwrites the content of one subtopic. Returns `false` if no such node exists.
    async fn set_subtopic_content(
        &self,
        pdf_id: i32,
        chapter: &str,
        topic: &str,
        subtopic: &str,
        content: &str,
    ) -> PortResult<bool>;

    async fn get_outline_notes(&self, pdf_id: i32) -> PortResult<Vec<ChapterNotes>>;
}

/// Raw PDF bytes on disk, addressed by storage path.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Writes the bytes and returns the absolute location.
    async fn save(&self, path: &str, data: &[u8]) -> PortResult<PathBuf>;

    async fn read(&self, path: &str) -> PortResult<Vec<u8>>;

    /// Removing a missing file is not an error.
    async fn remove(&self, path: &str) -> PortResult<()>;

    fn locate(&self, path: &str) -> PathBuf;
}

#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Makes a local file readable by the model.
    async fn upload_file(&self, path: &Path, mime_type: &str) -> PortResult<RemoteFile>;

    /// Sends a prompt scoped to an uploaded file and returns the model's text.
    async fn generate(
        &self,
        file: &RemoteFile,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> PortResult<String>;
}
