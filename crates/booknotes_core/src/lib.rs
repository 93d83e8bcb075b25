pub mod domain;
pub mod fenced;
pub mod generator;
pub mod outline;
pub mod ports;
pub mod prompts;
pub mod quiz;
pub mod render;

pub use domain::{
    ChapterNotes, Pdf, PdfStatus, QuizQuestion, RemoteFile, SubtopicNotes,
    TopicNotes, User, UserCredentials,
};
pub use fenced::{extract_fenced_json, ExtractError};
pub use generator::{ContentGenerator, OutlineGenerator, NO_NOTES_MESSAGE, PDF_MIME_TYPE};
pub use outline::{Outline, OutlineChapter, OutlineTopic};
pub use ports::{DatabaseService, FileStorage, GenerativeService, PortError, PortResult};
