pub mod db;
pub mod gemini;
pub mod openai;
pub mod storage;

pub use db::DbAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use storage::LocalFileStorage;
