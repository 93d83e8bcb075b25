//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use booknotes_core::domain::{
    ChapterNotes, Pdf, PdfStatus, SubtopicNotes, TopicNotes, User, UserCredentials,
};
use booknotes_core::outline::Outline;
use booknotes_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Unique-constraint violations become `Conflict`; everything else is unexpected.
fn conflict_or_unexpected(e: sqlx::Error, conflict: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PortError::Conflict(conflict.to_string())
        }
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    emailid: String,
    username: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            email: self.emailid,
            username: self.username,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    emailid: String,
    username: String,
    password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            email: self.emailid,
            username: self.username,
            hashed_password: self.password,
        }
    }
}

#[derive(FromRow)]
struct PdfRecord {
    id: i32,
    path: String,
    username: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl PdfRecord {
    fn to_domain(self) -> Pdf {
        Pdf {
            id: self.id,
            path: self.path,
            username: self.username,
            status: PdfStatus::parse(&self.status),
            created_at: self.created_at,
        }
    }
}

/// One row of the flattened chapter ⟕ topic ⟕ subtopic join.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct OutlineRow {
    pub chapter_id: i32,
    pub chapter_name: String,
    pub topic_id: Option<i32>,
    pub topic_name: Option<String>,
    pub subtopic_name: Option<String>,
    pub content: Option<String>,
}

/// Folds ordered join rows back into the outline tree.
pub(crate) fn assemble_outline(rows: Vec<OutlineRow>) -> Vec<ChapterNotes> {
    let mut chapters: Vec<(i32, ChapterNotes)> = Vec::new();
    let mut last_topic: Option<i32> = None;

    for row in rows {
        if chapters.last().map(|(id, _)| *id) != Some(row.chapter_id) {
            chapters.push((
                row.chapter_id,
                ChapterNotes {
                    name: row.chapter_name,
                    topics: Vec::new(),
                },
            ));
            last_topic = None;
        }
        let Some((_, chapter)) = chapters.last_mut() else {
            continue;
        };
        let (Some(topic_id), Some(topic_name)) = (row.topic_id, row.topic_name) else {
            continue;
        };
        if last_topic != Some(topic_id) {
            chapter.topics.push(TopicNotes {
                name: topic_name,
                subtopics: Vec::new(),
            });
            last_topic = Some(topic_id);
        }
        if let (Some(topic), Some(name)) = (chapter.topics.last_mut(), row.subtopic_name) {
            topic.subtopics.push(SubtopicNotes {
                name,
                content: row.content,
            });
        }
    }

    chapters.into_iter().map(|(_, chapter)| chapter).collect()
}

// Every statement below yields the columns of `PdfRecord`.
const INSERT_PDF: &str =
    "INSERT INTO pdfs (path, username, status) VALUES ($1, $2, $3) \
     RETURNING id, path, username, status, created_at";
const SELECT_PDF_BY_ID: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE id = $1 AND username = $2";
const SELECT_PDF_BY_PATH: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE path = $1 AND username = $2";
const SELECT_LATEST_PDF: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE username = $1 ORDER BY created_at DESC, id DESC LIMIT 1";
const SELECT_PDFS: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE username = $1 ORDER BY created_at DESC, id DESC";
const SEARCH_PDFS: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE username = $1 AND strpos(lower(path), lower($2)) > 0 \
     ORDER BY created_at DESC, id DESC";
const LOCK_OWNED_PDF: &str = "SELECT id, path, username, status, created_at FROM pdfs \
     WHERE id = $1 AND username = $2 FOR UPDATE";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, email: &str, username: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO authentication (emailid, username, password) VALUES ($1, $2, $3) RETURNING emailid, username",
        )
        .bind(email)
        .bind(username)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "Email or Username already exists"))?;
        Ok(record.to_domain())
    }

    async fn get_user_credentials(&self, identifier: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT emailid, username, password FROM authentication \
             WHERE emailid = $1 OR username = $1 \
             ORDER BY (emailid = $1) DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", identifier)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, username, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(username)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT a.emailid, a.username FROM auth_sessions s \
             JOIN authentication a ON a.username = s.username \
             WHERE s.id = $1 AND s.expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;
        Ok(record.to_domain())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_pdf(&self, username: &str, path: &str) -> PortResult<Pdf> {
        let record = sqlx::query_as::<_, PdfRecord>(INSERT_PDF)
            .bind(path)
            .bind(username)
            .bind(PdfStatus::Uploaded.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_unexpected(e, "This file has already been uploaded"))?;
        Ok(record.to_domain())
    }

    async fn get_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Pdf> {
        let record = sqlx::query_as::<_, PdfRecord>(SELECT_PDF_BY_ID)
            .bind(pdf_id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("PDF {} not found", pdf_id)))?;
        Ok(record.to_domain())
    }

    async fn get_pdf_by_path(&self, path: &str, username: &str) -> PortResult<Pdf> {
        let record = sqlx::query_as::<_, PdfRecord>(SELECT_PDF_BY_PATH)
            .bind(path)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("PDF {} not found", path)))?;
        Ok(record.to_domain())
    }

    async fn latest_pdf(&self, username: &str) -> PortResult<Option<Pdf>> {
        let record = sqlx::query_as::<_, PdfRecord>(SELECT_LATEST_PDF)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(PdfRecord::to_domain))
    }

    async fn list_pdfs(&self, username: &str) -> PortResult<Vec<Pdf>> {
        let records = sqlx::query_as::<_, PdfRecord>(SELECT_PDFS)
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_pdfs(&self, username: &str, query: &str) -> PortResult<Vec<Pdf>> {
        let records = sqlx::query_as::<_, PdfRecord>(SEARCH_PDFS)
            .bind(username)
            .bind(query)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_pdf_status(&self, pdf_id: i32, status: PdfStatus) -> PortResult<()> {
        sqlx::query("UPDATE pdfs SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(pdf_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_pdf(&self, pdf_id: i32, username: &str) -> PortResult<Option<Pdf>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let owned = sqlx::query_as::<_, PdfRecord>(LOCK_OWNED_PDF)
            .bind(pdf_id)
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;

        let Some(record) = owned else {
            debug!("PDF {} is not owned by {}, nothing deleted", pdf_id, username);
            return Ok(None);
        };

        sqlx::query(
            "DELETE FROM subtopics WHERE topic_id IN \
             (SELECT t.id FROM topics t JOIN chapters c ON c.id = t.chapter_id WHERE c.pdf_id = $1)",
        )
        .bind(pdf_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("DELETE FROM topics WHERE chapter_id IN (SELECT id FROM chapters WHERE pdf_id = $1)")
            .bind(pdf_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        sqlx::query("DELETE FROM chapters WHERE pdf_id = $1")
            .bind(pdf_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        sqlx::query("DELETE FROM pdfs WHERE id = $1")
            .bind(pdf_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        info!("Deleted PDF {} and its outline", pdf_id);
        Ok(Some(record.to_domain()))
    }

    async fn save_outline(&self, pdf_id: i32, outline: &Outline) -> PortResult<()> {
        // Dropping the transaction on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        for (chapter_pos, chapter) in outline.chapters.iter().enumerate() {
            let chapter_id = sqlx::query_scalar::<_, i32>(
                "INSERT INTO chapters (pdf_id, position, chapter_name) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(pdf_id)
            .bind(chapter_pos as i32)
            .bind(&chapter.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

            for (topic_pos, topic) in chapter.topics.iter().enumerate() {
                let topic_id = sqlx::query_scalar::<_, i32>(
                    "INSERT INTO topics (chapter_id, position, topic_name) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(chapter_id)
                .bind(topic_pos as i32)
                .bind(&topic.name)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;

                for (sub_pos, subtopic) in topic.subtopics.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO subtopics (topic_id, position, subtopic_name) VALUES ($1, $2, $3)",
                    )
                    .bind(topic_id)
                    .bind(sub_pos as i32)
                    .bind(subtopic)
                    .execute(&mut *tx)
                    .await
                    .map_err(unexpected)?;
                }
            }
        }

        sqlx::query("UPDATE pdfs SET status = $1 WHERE id = $2")
            .bind(PdfStatus::Outlined.as_str())
            .bind(pdf_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
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
        let result = sqlx::query(
            "UPDATE subtopics s SET content = $5 FROM topics t, chapters c \
             WHERE s.topic_id = t.id AND t.chapter_id = c.id \
             AND c.pdf_id = $1 AND c.chapter_name = $2 AND t.topic_name = $3 AND s.subtopic_name = $4",
        )
        .bind(pdf_id)
        .bind(chapter)
        .bind(topic)
        .bind(subtopic)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_outline_notes(&self, pdf_id: i32) -> PortResult<Vec<ChapterNotes>> {
        let rows = sqlx::query_as::<_, OutlineRow>(
            "SELECT c.id AS chapter_id, c.chapter_name, t.id AS topic_id, t.topic_name, \
                    s.subtopic_name, s.content \
             FROM chapters c \
             LEFT JOIN topics t ON t.chapter_id = c.id \
             LEFT JOIN subtopics s ON s.topic_id = t.id \
             WHERE c.pdf_id = $1 \
             ORDER BY c.position, c.id, t.position, t.id, s.position, s.id",
        )
        .bind(pdf_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(assemble_outline(rows))
    }
}
