//! crates/booknotes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub email: String,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
}

/// Where a PDF sits in its lifecycle. Deleted PDFs have no row at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfStatus {
    Uploaded,
    Outlined,
    Annotated,
}

impl PdfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfStatus::Uploaded => "uploaded",
            PdfStatus::Outlined => "outlined",
            PdfStatus::Annotated => "annotated",
        }
    }

    /// Unknown values read back from storage are treated as freshly uploaded.
    pub fn parse(value: &str) -> Self {
        match value {
            "outlined" => PdfStatus::Outlined,
            "annotated" => PdfStatus::Annotated,
            _ => PdfStatus::Uploaded,
        }
    }
}

/// A PDF book registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pdf {
    pub id: i32,
    /// Storage path relative to the upload directory, `<username>/<file name>`.
    pub path: String,
    pub username: String,
    pub status: PdfStatus,
    pub created_at: DateTime<Utc>,
}

impl Pdf {
    /// The bare file name, without the per-user namespace.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A persisted subtopic together with its generated notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtopicNotes {
    pub name: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicNotes {
    pub name: String,
    pub subtopics: Vec<SubtopicNotes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterNotes {
    pub name: String,
    pub topics: Vec<TopicNotes>,
}

/// One multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// A handle to a file the generative service can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
}
