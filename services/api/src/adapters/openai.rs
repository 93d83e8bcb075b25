//! services/api/src/adapters/openai.rs
//!
//! This module contains the adapter for OpenAI-compatible chat models.
//! It implements the `GenerativeService` port from the `core` crate.
//!
//! Chat completions cannot reference uploaded files, so "uploading" here means
//! extracting the PDF's text locally; the text is inlined into each prompt.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use booknotes_core::domain::RemoteFile;
use booknotes_core::ports::{GenerativeService, PortError, PortResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on inlined book text, in characters.
const MAX_BOOK_CHARS: usize = 400_000;

const LOCAL_SCHEME: &str = "file://";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdapter {
    /// Creates a new `OpenAiAdapter` whose requests give up after `timeout`.
    pub fn new(api_key: &str, model: String, timeout: Duration) -> PortResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key))
            .with_http_client(http_client);
        Ok(Self { client, model })
    }

    fn local_path(file: &RemoteFile) -> PortResult<PathBuf> {
        file.uri
            .strip_prefix(LOCAL_SCHEME)
            .map(PathBuf::from)
            .ok_or_else(|| PortError::BadRequest(format!("Not a local file handle: {}", file.uri)))
    }

    async fn extract_text(path: PathBuf) -> PortResult<String> {
        let shown = path.display().to_string();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path).map_err(|e| e.to_string()))
            .await
            .map_err(|e| PortError::Unexpected(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| PortError::Unexpected(format!("Cannot extract text from {}: {}", shown, e)))?;

        if text.chars().count() > MAX_BOOK_CHARS {
            warn!("Book text of {} truncated to {} characters", shown, MAX_BOOK_CHARS);
            return Ok(text.chars().take(MAX_BOOK_CHARS).collect());
        }
        Ok(text)
    }
}

fn build_error(e: OpenAIError) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `GenerativeService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeService for OpenAiAdapter {
    async fn upload_file(&self, path: &Path, mime_type: &str) -> PortResult<RemoteFile> {
        let absolute = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| PortError::NotFound(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok(RemoteFile {
            uri: format!("{}{}", LOCAL_SCHEME, absolute.display()),
            mime_type: mime_type.to_string(),
            display_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }

    async fn generate(
        &self,
        file: &RemoteFile,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> PortResult<String> {
        let book_text = Self::extract_text(Self::local_path(file)?).await?;

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        if let Some(system) = system_instruction {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(build_error)?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "BOOK ({}):\n---\n{}\n---\n\n{}",
                    file.display_name, book_text, prompt
                ))
                .build()
                .map_err(build_error)?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::External(e.to_string()))?;

        info!("OpenAI answered for '{}' using {}", file.display_name, self.model);

        // An empty choice list is passed on as empty text; callers decide what that means.
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
