use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbedError, Embedder};

/// In-process ONNX sentence-embedding model.
///
/// The model is loaded once and shared; inference runs on the blocking pool
/// so it never stalls the async runtime.
pub struct LocalEmbedder {
    model: Arc<TextEmbedding>,
    model_name: String,
}

impl LocalEmbedder {
    /// Loads (downloading on first use) the named model. Blocking.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let model = resolve_model(model_name)?;

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options)?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }
}

/// Maps the configured model name onto a fastembed model. Only the
/// multilingual paraphrase MiniLM family is accepted: résumés and postings
/// are frequently not in English.
fn resolve_model(name: &str) -> Result<EmbeddingModel> {
    let short = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    match short.as_str() {
        "paraphrase-multilingual-minilm-l12-v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        "paraphrase-multilingual-minilm-l12-v2-q" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2Q),
        "paraphrase-multilingual-mpnet-base-v2" => Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2),
        _ => bail!("Unsupported local embedding model '{name}'"),
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let model = Arc::clone(&self.model);
        let input = vec![text.to_string()];

        let embeddings = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| EmbedError::Worker(e.to_string()))?
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        embeddings.into_iter().next().ok_or(EmbedError::Empty)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
