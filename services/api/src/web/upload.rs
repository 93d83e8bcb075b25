//! services/api/src/web/upload.rs
//!
//! The PDF upload endpoint: validate, register, store, then outline.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use booknotes_core::domain::Pdf;
use booknotes_core::outline::Outline;
use booknotes_core::ports::PortError;
use booknotes_core::PDF_MIME_TYPE;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::web::state::{AppState, SessionUser};

const DEFAULT_FILE_NAME: &str = "upload.pdf";

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The response payload sent after a successful upload.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub pdf_id: i32,
    /// The outline exactly as the model returned it.
    #[schema(value_type = Object)]
    pub topics: Value,
}

struct PdfUpload {
    file_name: String,
    data: Bytes,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Keeps only the final path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Deterministic storage path, namespaced per user.
pub fn storage_path(username: &str, file_name: &str) -> String {
    format!("{}/{}", username, sanitize_file_name(file_name))
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME_TYPE))
        .unwrap_or(false)
}

/// Pulls the `file` part (or the first part carrying a file name) out of the form.
async fn read_pdf_field(multipart: &mut Multipart) -> Result<PdfUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        if !is_pdf(field.content_type()) {
            return Err(AppError::BadRequest("Only PDF files are allowed".to_string()));
        }
        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file bytes: {}", e)))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        return Ok(PdfUpload { file_name, data });
    }
    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// Removes a half-finished upload: its row, any outline rows and the stored file.
async fn discard_upload(state: &AppState, pdf: &Pdf) {
    if let Err(cleanup) = state.db.delete_pdf(pdf.id, &pdf.username).await {
        warn!("Failed to unregister PDF {}: {:?}", pdf.id, cleanup);
    }
    if let Err(cleanup) = state.storage.remove(&pdf.path).await {
        warn!("Failed to remove upload {}: {:?}", pdf.path, cleanup);
    }
}

//=========================================================================================
// Handler
//=========================================================================================

/// Upload a PDF book and generate its outline.
///
/// Accepts a multipart/form-data request with a `file` part of type `application/pdf`.
#[utoipa::path(
    post,
    path = "/upload_pdf/",
    request_body(content_type = "multipart/form-data", description = "The PDF to upload."),
    responses(
        (status = 200, description = "Uploaded and outlined", body = UploadResponse),
        (status = 400, description = "Missing file or not a PDF"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "File already uploaded"),
        (status = 502, description = "The AI service failed")
    )
)]
pub async fn upload_pdf_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_pdf_field(&mut multipart).await?;
    let file_name = sanitize_file_name(&upload.file_name);
    let path = storage_path(&user.username, &file_name);

    // 1. Claim the path; the unique constraint settles concurrent uploads
    let pdf = state
        .db
        .create_pdf(&user.username, &path)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => {
                AppError::Conflict("This file has already been uploaded".to_string())
            }
            other => other.into(),
        })?;

    // 2. Persist the bytes; a failed write releases the claim
    let location = match state.storage.save(&path, &upload.data).await {
        Ok(location) => location,
        Err(e) => {
            error!("Failed to store {}: {:?}", path, e);
            if let Err(cleanup) = state.db.delete_pdf(pdf.id, &user.username).await {
                warn!("Failed to unregister PDF {}: {:?}", pdf.id, cleanup);
            }
            return Err(e.into());
        }
    };
    info!("Registered PDF {} at {}", pdf.id, pdf.path);

    // 3. Outline the book; a failed model call undoes the registration
    let topics = match state.outline_generator.outline_pdf(&location).await {
        Ok(topics) => topics,
        Err(e) => {
            error!("Outline generation failed for {}: {:?}", pdf.path, e);
            discard_upload(&state, &pdf).await;
            return Err(e.into());
        }
    };

    // 4. Persist the outline tree
    let outline = Outline::from_json(&topics, pdf.file_name());
    let message = if outline.is_empty() {
        warn!("No outline could be stored for PDF {}", pdf.id);
        "File uploaded, but no outline could be generated".to_string()
    } else {
        if let Err(e) = state.db.save_outline(pdf.id, &outline).await {
            error!("Failed to store the outline of PDF {}: {:?}", pdf.id, e);
            discard_upload(&state, &pdf).await;
            return Err(e.into());
        }
        info!(
            "Stored outline for PDF {}: {} chapters, {} topics",
            pdf.id,
            outline.chapters.len(),
            outline.topic_count()
        );
        "File uploaded and outlined successfully".to_string()
    };

    Ok(Json(UploadResponse {
        message,
        file_name,
        pdf_id: pdf.id,
        topics,
    }))
}
