//! Sentence embeddings: pluggable, trait-based backends.
//!
//! Default: `LocalEmbedder` (fastembed ONNX model, multilingual paraphrase MiniLM).
//! Alternative: `HttpEmbedder` (OpenAI-compatible `/embeddings` endpoint).
//!
//! `load_embedder` yields `None` when the model fails to load; `AppState` then
//! carries no `BatchRanker` and every scoring request is rejected as unavailable.

pub mod http;
pub mod local;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;

pub use http::HttpEmbedder;
pub use local::LocalEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding backend returned no vector")]
    Empty,

    #[error("Embedding worker failed: {0}")]
    Worker(String),
}

/// Which embedding implementation to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Local,
    Http,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "http" => Ok(Self::Http),
            other => Err(anyhow!(
                "Unknown EMBEDDING_BACKEND '{other}' (expected 'local' or 'http')"
            )),
        }
    }
}

/// Encodes a single text into a fixed-dimension vector.
///
/// Implementations must be safe for concurrent read-only use; the scorer
/// calls `embed` from several worker tasks at once.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    fn model_name(&self) -> &str;
}

/// Builds the configured backend. A failure is logged and reported as `None`
/// so the service still starts and answers with "model unavailable".
pub async fn load_embedder(config: &Config) -> Option<Arc<dyn Embedder>> {
    let result: Result<Arc<dyn Embedder>> = match config.embedding_backend {
        EmbeddingBackend::Local => {
            let model_name = config.embedding_model.clone();
            let cache_dir = config.model_cache_dir.clone();
            tokio::task::spawn_blocking(move || LocalEmbedder::new(&model_name, cache_dir))
                .await
                .map_err(|e| anyhow!("model loader task failed: {e}"))
                .and_then(|loaded| loaded)
                .map(|embedder| Arc::new(embedder) as Arc<dyn Embedder>)
        }
        EmbeddingBackend::Http => HttpEmbedder::from_config(config)
            .map(|embedder| Arc::new(embedder) as Arc<dyn Embedder>),
    };

    match result {
        Ok(embedder) => {
            info!("Embedding model loaded ({})", embedder.model_name());
            Some(embedder)
        }
        Err(e) => {
            error!("Embedding model failed to load, scoring disabled: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parses_case_insensitively() {
        assert_eq!("LOCAL".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Local);
        assert_eq!(" http ".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Http);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!("onnx-gpu".parse::<EmbeddingBackend>().is_err());
    }
}
