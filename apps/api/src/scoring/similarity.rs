//! Similarity Scorer: cosine similarity of sentence embeddings mapped to 0–100.

use std::sync::Arc;

use crate::embedding::{EmbedError, Embedder};

/// Shared, read-only scorer. Cloning is cheap; the model sits behind an `Arc`.
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embeds a text, or returns `None` for empty input without touching the model.
    pub async fn embed_text(&self, text: &str) -> Result<Option<Vec<f32>>, EmbedError> {
        if text.is_empty() {
            return Ok(None);
        }
        self.embedder.embed(text).await.map(Some)
    }

    /// Scores `resume_text` against an already-embedded job posting.
    /// An absent posting vector or an empty résumé scores 0.0.
    pub async fn score_against(
        &self,
        posting: Option<&[f32]>,
        resume_text: &str,
    ) -> Result<f64, EmbedError> {
        let Some(posting) = posting else {
            return Ok(0.0);
        };
        let Some(resume) = self.embed_text(resume_text).await? else {
            return Ok(0.0);
        };
        Ok(similarity_to_score(cosine_similarity(posting, &resume)))
    }

    /// Scores a job posting against a résumé, both as raw text.
    /// The batch path embeds the posting once and uses `score_against`.
    #[cfg(test)]
    pub async fn score(&self, posting_text: &str, resume_text: &str) -> Result<f64, EmbedError> {
        if posting_text.is_empty() || resume_text.is_empty() {
            return Ok(0.0);
        }
        let posting = self.embed_text(posting_text).await?;
        self.score_against(posting.as_deref(), resume_text).await
    }
}

/// Cosine similarity; 0.0 for mismatched dimensions or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// `similarity * 100` rounded to two decimals, clamped to `0.0..=100.0`.
pub fn similarity_to_score(similarity: f32) -> f64 {
    round2(similarity as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{CountingEmbedder, HashingEmbedder};

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(Arc::new(HashingEmbedder::default()))
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_mismatched_dimensions() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_score_rounds_to_two_decimals() {
        assert_eq!(similarity_to_score(0.123456), 12.35);
        assert_eq!(similarity_to_score(0.5), 50.0);
    }

    #[test]
    fn test_score_clamped() {
        assert_eq!(similarity_to_score(-0.2), 0.0);
        assert_eq!(similarity_to_score(1.0000001), 100.0);
    }

    #[tokio::test]
    async fn test_empty_posting_scores_zero_without_encoding() {
        let counting = Arc::new(CountingEmbedder::default());
        let scorer = SimilarityScorer::new(counting.clone());

        let score = scorer.score("", "Rust developer").await.unwrap();

        assert_eq!(score, 0.0);
        assert_eq!(counting.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_resume_scores_zero() {
        assert_eq!(scorer().score("Rust developer", "").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_identical_texts_score_100() {
        let text = "python django postgresql";
        assert_eq!(scorer().score(text, text).await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn test_scoring_is_idempotent() {
        let scorer = scorer();
        let first = scorer
            .score("python django postgresql", "Python developer using Django")
            .await
            .unwrap();
        let second = scorer
            .score("python django postgresql", "Python developer using Django")
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_score_against_absent_posting() {
        let score = scorer().score_against(None, "anything").await.unwrap();
        assert_eq!(score, 0.0);
    }
}
