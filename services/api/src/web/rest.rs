//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{auth, content, library, upload};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        upload::upload_pdf_handler,
        library::list_pdfs_handler,
        library::search_pdfs_handler,
        library::delete_pdf_handler,
        library::download_pdf_handler,
        library::view_notes_handler,
        content::quiz_handler,
        content::notes_handler,
        content::topic_notes_handler,
    ),
    components(
        schemas(
            auth::SignupForm,
            auth::LoginForm,
            upload::UploadResponse,
            library::PdfSummary,
            library::DeleteResponse,
            content::QuizItem,
            content::QuizResponse,
            content::NotesResponse,
        )
    ),
    tags(
        (name = "Booknotes API", description = "Upload PDF books, outline them and generate notes and quizzes.")
    )
)]
pub struct ApiDoc;
