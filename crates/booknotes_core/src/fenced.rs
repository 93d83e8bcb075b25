//! crates/booknotes_core/src/fenced.rs
//!
//! Locates structured data inside free-text model output. Models are asked to
//! wrap JSON in a markdown code block tagged `json`; everything around it is prose.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("response contains no ```json fenced block")]
    NoFencedBlock,
    #[error("fenced block is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n?[ \t]*```").expect("fence pattern is valid")
    })
}

/// Returns the body of the first ```json block, untouched.
pub fn find_fenced_json(text: &str) -> Option<&str> {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses the first ```json block of `text`.
pub fn extract_fenced_json(text: &str) -> Result<Value, ExtractError> {
    let body = find_fenced_json(text).ok_or(ExtractError::NoFencedBlock)?;
    Ok(serde_json::from_str(body)?)
}
