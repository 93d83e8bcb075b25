//! services/api/src/web/library.rs
//!
//! The user's book library: listing, searching, deleting, raw downloads and
//! the aggregated notes view.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use booknotes_core::domain::Pdf;
use booknotes_core::render::render_notes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::web::state::{AppState, SessionUser};
use crate::web::upload::storage_path;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct PdfSummary {
    pub id: i32,
    pub file_name: String,
    pub path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Pdf> for PdfSummary {
    fn from(pdf: Pdf) -> Self {
        Self {
            id: pdf.id,
            file_name: pdf.file_name().to_string(),
            status: pdf.status.as_str().to_string(),
            path: pdf.path,
            created_at: pdf.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the stored `<username>/<file name>` path.
    #[serde(default)]
    pub query: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the session user's PDFs, newest first.
#[utoipa::path(
    get,
    path = "/library",
    responses(
        (status = 200, description = "The user's PDFs", body = [PdfSummary]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_pdfs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Vec<PdfSummary>>, AppError> {
    let pdfs = state.db.list_pdfs(&user.username).await?;
    Ok(Json(pdfs.into_iter().map(PdfSummary::from).collect()))
}

/// Search the session user's PDFs by stored path.
#[utoipa::path(
    get,
    path = "/library/search_pdf",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching PDFs", body = [PdfSummary]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn search_pdfs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PdfSummary>>, AppError> {
    let pdfs = state
        .db
        .search_pdfs(&user.username, params.query.trim())
        .await?;
    Ok(Json(pdfs.into_iter().map(PdfSummary::from).collect()))
}

/// Delete a PDF and its whole outline. Deleting someone else's PDF does nothing.
#[utoipa::path(
    post,
    path = "/delete_pdf/{pdf_id}",
    params(("pdf_id" = i32, Path, description = "The PDF to delete.")),
    responses(
        (status = 200, description = "Delete processed", body = DeleteResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn delete_pdf_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(pdf_id): Path<i32>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Some(pdf) = state.db.delete_pdf(pdf_id, &user.username).await? else {
        return Ok(Json(DeleteResponse {
            message: "Nothing to delete".to_string(),
            deleted: false,
        }));
    };

    if let Err(e) = state.storage.remove(&pdf.path).await {
        warn!("PDF {} deleted but its file could not be removed: {:?}", pdf.id, e);
    }
    info!("User {} deleted PDF {}", user.username, pdf.id);

    Ok(Json(DeleteResponse {
        message: format!("Deleted {}", pdf.file_name()),
        deleted: true,
    }))
}

/// Download one of the session user's PDFs.
#[utoipa::path(
    get,
    path = "/uploads/{pdf_name}",
    params(("pdf_name" = String, Path, description = "The PDF's file name.")),
    responses(
        (status = 200, description = "The raw PDF", content_type = "application/pdf"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such PDF")
    )
)]
pub async fn download_pdf_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(pdf_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = state
        .db
        .get_pdf_by_path(&storage_path(&user.username, &pdf_name), &user.username)
        .await?;
    let data = state.storage.read(&pdf.path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", pdf.file_name()),
            ),
        ],
        data,
    ))
}

/// All stored notes of one PDF as a markdown document.
#[utoipa::path(
    get,
    path = "/view_notes/{pdfid}",
    params(("pdfid" = i32, Path, description = "The PDF whose notes to show.")),
    responses(
        (status = 200, description = "Markdown notes", content_type = "text/markdown"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such PDF")
    )
)]
pub async fn view_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(pdf_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = state.db.get_pdf(pdf_id, &user.username).await?;
    let chapters = state.db.get_outline_notes(pdf.id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_notes(pdf.file_name(), &chapters),
    ))
}
