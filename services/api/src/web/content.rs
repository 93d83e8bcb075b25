//! services/api/src/web/content.rs
//!
//! On-demand notes and quizzes for a node of a book's outline.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use booknotes_core::domain::{Pdf, PdfStatus, QuizQuestion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::web::state::{AppState, SessionUser};

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// Selects the book a content request is about.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PdfScope {
    /// Defaults to the user's most recent upload.
    pub pdf_id: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl From<QuizQuestion> for QuizItem {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question: q.question,
            options: q.options,
            answer: q.answer,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    pub pdf_id: i32,
    pub chapter: String,
    pub questions: Vec<QuizItem>,
}

#[derive(Serialize, ToSchema)]
pub struct NotesResponse {
    pub pdf_id: i32,
    pub chapter: String,
    pub topic: String,
    /// Absent for topic-level notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub notes: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn resolve_pdf(state: &AppState, user: &SessionUser, scope: &PdfScope) -> Result<Pdf, AppError> {
    match scope.pdf_id {
        Some(id) => Ok(state.db.get_pdf(id, &user.username).await?),
        None => state
            .db
            .latest_pdf(&user.username)
            .await?
            .ok_or_else(|| AppError::NotFound("No PDF uploaded yet".to_string())),
    }
}

async fn mark_annotated(state: &AppState, pdf: &Pdf) -> Result<(), AppError> {
    if pdf.status != PdfStatus::Annotated {
        state.db.set_pdf_status(pdf.id, PdfStatus::Annotated).await?;
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a multiple-choice quiz for a chapter.
#[utoipa::path(
    get,
    path = "/api/quiz/{chapter}",
    params(("chapter" = String, Path, description = "Chapter name."), PdfScope),
    responses(
        (status = 200, description = "Quiz questions, never empty", body = QuizResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such PDF")
    )
)]
pub async fn quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(chapter): Path<String>,
    Query(scope): Query<PdfScope>,
) -> Result<Json<QuizResponse>, AppError> {
    let pdf = resolve_pdf(&state, &user, &scope).await?;
    let location = state.storage.locate(&pdf.path);

    let questions = state
        .content_generator
        .generate_quiz(&chapter, &location)
        .await;
    info!(
        "Generated {} quiz questions for '{}' of PDF {}",
        questions.len(),
        chapter,
        pdf.id
    );

    Ok(Json(QuizResponse {
        pdf_id: pdf.id,
        chapter,
        questions: questions.into_iter().map(QuizItem::from).collect(),
    }))
}

/// Generate and store notes for one subtopic.
#[utoipa::path(
    get,
    path = "/api/notes/{chapter}/{topic}/{subtopic}",
    params(
        ("chapter" = String, Path, description = "Chapter name."),
        ("topic" = String, Path, description = "Topic name."),
        ("subtopic" = String, Path, description = "Subtopic name."),
        PdfScope
    ),
    responses(
        (status = 200, description = "Generated notes", body = NotesResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such PDF"),
        (status = 502, description = "The AI service failed")
    )
)]
pub async fn notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path((chapter, topic, subtopic)): Path<(String, String, String)>,
    Query(scope): Query<PdfScope>,
) -> Result<Json<NotesResponse>, AppError> {
    let pdf = resolve_pdf(&state, &user, &scope).await?;
    let location = state.storage.locate(&pdf.path);

    let notes = state
        .content_generator
        .generate_notes(&chapter, &topic, &subtopic, &location)
        .await?;

    let stored = state
        .db
        .set_subtopic_content(pdf.id, &chapter, &topic, &subtopic, &notes)
        .await?;
    if !stored {
        warn!(
            "PDF {} has no subtopic {} / {} / {}; notes were not stored",
            pdf.id, chapter, topic, subtopic
        );
    }
    mark_annotated(&state, &pdf).await?;

    Ok(Json(NotesResponse {
        pdf_id: pdf.id,
        chapter,
        topic,
        subtopic: Some(subtopic),
        notes,
    }))
}

/// Generate notes for a whole topic. These are not stored.
#[utoipa::path(
    get,
    path = "/api/topic_notes/{chapter}/{topic}",
    params(
        ("chapter" = String, Path, description = "Chapter name."),
        ("topic" = String, Path, description = "Topic name."),
        PdfScope
    ),
    responses(
        (status = 200, description = "Generated notes", body = NotesResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such PDF"),
        (status = 502, description = "The AI service failed")
    )
)]
pub async fn topic_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path((chapter, topic)): Path<(String, String)>,
    Query(scope): Query<PdfScope>,
) -> Result<Json<NotesResponse>, AppError> {
    let pdf = resolve_pdf(&state, &user, &scope).await?;
    let location = state.storage.locate(&pdf.path);

    let notes = state
        .content_generator
        .generate_topic_notes(&chapter, &topic, &location)
        .await?;
    mark_annotated(&state, &pdf).await?;

    Ok(Json(NotesResponse {
        pdf_id: pdf.id,
        chapter,
        topic,
        subtopic: None,
        notes,
    }))
}
