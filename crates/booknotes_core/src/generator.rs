//! crates/booknotes_core/src/generator.rs
//!
//! The outline and content workflows, written against the `GenerativeService`
//! port so they can run against any model backend.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{QuizQuestion, RemoteFile};
use crate::fenced::extract_fenced_json;
use crate::ports::{GenerativeService, PortResult};
use crate::prompts;
use crate::quiz::{fallback_quiz, parse_quiz, QUIZ_LENGTH};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Returned in place of an empty model answer.
pub const NO_NOTES_MESSAGE: &str = "No notes generated.";

//=========================================================================================
// Outline Generator
//=========================================================================================

/// Extracts a chapter/topic/subtopic outline from a book.
#[derive(Clone)]
pub struct OutlineGenerator {
    ai: Arc<dyn GenerativeService>,
}

impl OutlineGenerator {
    pub fn new(ai: Arc<dyn GenerativeService>) -> Self {
        Self { ai }
    }

    /// Uploads the book and asks for its outline.
    pub async fn outline_pdf(&self, path: &Path) -> PortResult<Value> {
        let file = self.ai.upload_file(path, PDF_MIME_TYPE).await?;
        self.generate_topics(&file).await
    }

    /// Returns the parsed JSON block from the model's answer, unchanged.
    ///
    /// A response without a usable fenced block yields an empty list; only a
    /// failed call to the model is an error.
    pub async fn generate_topics(&self, file: &RemoteFile) -> PortResult<Value> {
        let response = self
            .ai
            .generate(
                file,
                Some(prompts::OUTLINE_SYSTEM_INSTRUCTIONS),
                prompts::OUTLINE_REQUEST,
            )
            .await?;

        match extract_fenced_json(&response) {
            Ok(topics) => {
                info!("Outline extracted for '{}'", file.display_name);
                Ok(topics)
            }
            Err(e) => {
                warn!(
                    "No outline could be extracted for '{}': {}",
                    file.display_name, e
                );
                Ok(Value::Array(Vec::new()))
            }
        }
    }
}

//=========================================================================================
// Content Generator
//=========================================================================================

/// Produces notes and quizzes scoped to one node of a book's outline.
#[derive(Clone)]
pub struct ContentGenerator {
    ai: Arc<dyn GenerativeService>,
}

impl ContentGenerator {
    pub fn new(ai: Arc<dyn GenerativeService>) -> Self {
        Self { ai }
    }

    pub async fn generate_notes(
        &self,
        chapter: &str,
        topic: &str,
        subtopic: &str,
        path: &Path,
    ) -> PortResult<String> {
        let prompt = prompts::notes_request(chapter, topic, subtopic);
        self.prose(path, &prompt).await
    }

    pub async fn generate_topic_notes(
        &self,
        chapter: &str,
        topic: &str,
        path: &Path,
    ) -> PortResult<String> {
        let prompt = prompts::topic_notes_request(chapter, topic);
        self.prose(path, &prompt).await
    }

    /// Never returns an empty quiz: any failure along the way yields the
    /// fallback question set.
    pub async fn generate_quiz(&self, chapter: &str, path: &Path) -> Vec<QuizQuestion> {
        let prompt = prompts::quiz_request(chapter, QUIZ_LENGTH);
        let response = async {
            let file = self.ai.upload_file(path, PDF_MIME_TYPE).await?;
            self.ai
                .generate(&file, Some(prompts::QUIZ_SYSTEM_INSTRUCTIONS), &prompt)
                .await
        }
        .await;

        match response {
            Ok(text) => parse_quiz(&text),
            Err(e) => {
                error!("Quiz generation failed for chapter '{}': {:?}", chapter, e);
                fallback_quiz()
            }
        }
    }

    async fn prose(&self, path: &Path, prompt: &str) -> PortResult<String> {
        let file = self.ai.upload_file(path, PDF_MIME_TYPE).await?;
        let text = self.ai.generate(&file, None, prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            warn!("Model returned no notes for '{}'", file.display_name);
            return Ok(NO_NOTES_MESSAGE.to_string());
        }
        Ok(text.to_string())
    }
}
