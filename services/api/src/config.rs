//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which generative-AI backend serves outline and content requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAi,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(format!("'{}' is not a supported LLM provider", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
    pub session_ttl_days: i64,
    pub max_upload_bytes: usize,
    pub llm_provider: LlmProvider,
    pub llm_timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:3000"))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let upload_dir = PathBuf::from(var_or("UPLOAD_DIR", "./uploads"));
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");
        let session_ttl_days: i64 = parse_var("SESSION_TTL_DAYS", &var_or("SESSION_TTL_DAYS", "30"))?;
        let max_upload_bytes: usize =
            parse_var("MAX_UPLOAD_BYTES", &var_or("MAX_UPLOAD_BYTES", "26214400"))?;

        // --- Load LLM Settings ---
        let llm_provider: LlmProvider = parse_var("LLM_PROVIDER", &var_or("LLM_PROVIDER", "gemini"))?;
        let llm_timeout_secs: u64 = parse_var("LLM_TIMEOUT_SECS", &var_or("LLM_TIMEOUT_SECS", "120"))?;

        // --- Load API Keys (as optional) ---
        let gemini_api_key = lookup("GEMINI_API_KEY");
        let openai_api_key = lookup("OPENAI_API_KEY");
        let gemini_model = var_or("GEMINI_MODEL", "gemini-1.5-flash");
        let openai_model = var_or("OPENAI_MODEL", "gpt-4o-mini");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            upload_dir,
            cors_origin,
            session_ttl_days,
            max_upload_bytes,
            llm_provider,
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            gemini_api_key,
            gemini_model,
            openai_api_key,
            openai_model,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
