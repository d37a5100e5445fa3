use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::embedding::EmbeddingBackend;

pub const DEFAULT_EMBEDDING_MODEL: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub embedding_api_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub model_cache_dir: Option<PathBuf>,
    /// Threshold applied when a request omits one. The desktop client sends its own (50).
    pub default_threshold: i64,
    pub max_concurrent_documents: usize,
    pub max_upload_bytes: usize,
    pub taxonomy_path: Option<PathBuf>,
    pub work_dir: PathBuf,
    /// When set, a job posting without extractable text rejects the batch instead of scoring 0.0.
    pub require_job_posting_text: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            rust_log: "info".to_string(),
            embedding_backend: EmbeddingBackend::Local,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_url: None,
            embedding_api_key: None,
            model_cache_dir: None,
            default_threshold: 70,
            max_concurrent_documents: 4,
            max_upload_bytes: 50 * 1024 * 1024,
            taxonomy_path: None,
            work_dir: std::env::temp_dir(),
            require_job_posting_text: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let embedding_backend = match optional_env("EMBEDDING_BACKEND") {
            Some(raw) => raw.parse::<EmbeddingBackend>()?,
            None => defaults.embedding_backend,
        };
        let embedding_api_url = optional_env("EMBEDDING_API_URL");
        if embedding_backend == EmbeddingBackend::Http && embedding_api_url.is_none() {
            bail!("EMBEDDING_API_URL is required when EMBEDDING_BACKEND=http");
        }

        let max_concurrent_documents =
            parse_env("MAX_CONCURRENT_DOCUMENTS", defaults.max_concurrent_documents)?;
        if max_concurrent_documents == 0 {
            bail!("MAX_CONCURRENT_DOCUMENTS must be at least 1");
        }

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding_backend,
            embedding_model: optional_env("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_api_url,
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            model_cache_dir: optional_env("MODEL_CACHE_DIR").map(PathBuf::from),
            default_threshold: parse_env("DEFAULT_THRESHOLD", defaults.default_threshold)?,
            max_concurrent_documents,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            taxonomy_path: optional_env("TAXONOMY_PATH").map(PathBuf::from),
            work_dir: optional_env("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            require_job_posting_text: parse_env(
                "REQUIRE_JOB_POSTING_TEXT",
                defaults.require_job_posting_text,
            )?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
