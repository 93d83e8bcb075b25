//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's Gemini API.
//! It implements the `GenerativeService` port from the `core` crate: books are
//! pushed through the Files API and referenced by URI in `generateContent` calls.

use async_trait::async_trait;
use booknotes_core::domain::RemoteFile;
use booknotes_core::ports::{GenerativeService, PortError, PortResult};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeService` using the Gemini REST API.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapter` whose requests give up after `timeout`.
    pub fn new(api_key: String, model: String, timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build the request body for the generateContent API.
    fn build_request_body(file: &RemoteFile, system_instruction: Option<&str>, prompt: &str) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "file_data": { "mime_type": file.mime_type, "file_uri": file.uri } },
                    { "text": prompt },
                ],
            }],
            "generationConfig": {
                "temperature": 0.5,
                "topP": 0.95,
                "topK": 64,
                "maxOutputTokens": 8192,
                "responseMimeType": "text/plain",
            },
        });

        if let Some(system) = system_instruction {
            body["system_instruction"] = json!({
                "parts": [{ "text": system }],
            });
        }

        body
    }

    /// Joins the text parts of the first candidate.
    fn response_text(resp: &Value) -> PortResult<String> {
        let candidate = resp["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| {
                let reason = resp["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("no candidates returned");
                PortError::External(format!("Gemini returned no answer: {}", reason))
            })?;

        let text = candidate["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(text)
    }

    async fn check(response: reqwest::Response) -> PortResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PortError::External(format!("Gemini API error {}: {}", status.as_u16(), body)))
    }
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::External(format!("Gemini request failed: {}", e))
}

//=========================================================================================
// `GenerativeService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeService for GeminiAdapter {
    /// Uploads a file with the resumable upload protocol (start, then upload+finalize).
    async fn upload_file(&self, path: &Path, mime_type: &str) -> PortResult<RemoteFile> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            PortError::NotFound(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(transport)?;
        let start = Self::check(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| PortError::External("Gemini did not return an upload URL".to_string()))?
            .to_string();

        let finished = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await
            .map_err(transport)?;
        let body: Value = Self::check(finished).await?.json().await.map_err(transport)?;

        let uri = body["file"]["uri"]
            .as_str()
            .ok_or_else(|| PortError::External("Gemini upload response has no file uri".to_string()))?
            .to_string();
        info!("Uploaded '{}' to Gemini as {}", display_name, uri);

        Ok(RemoteFile {
            uri,
            mime_type: body["file"]["mimeType"]
                .as_str()
                .unwrap_or(mime_type)
                .to_string(),
            display_name,
        })
    }

    async fn generate(
        &self,
        file: &RemoteFile,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> PortResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = Self::build_request_body(file, system_instruction, prompt);

        debug!("Gemini request to model={} for '{}'", self.model, file.display_name);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let resp: Value = Self::check(response).await?.json().await.map_err(transport)?;

        Self::response_text(&resp)
    }
}
