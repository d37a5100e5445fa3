use std::sync::Arc;

use crate::config::Config;
use crate::scoring::ranker::BatchRanker;
use crate::scoring::skills::SkillTaxonomy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Immutable skill taxonomy, built once at startup.
    pub taxonomy: Arc<SkillTaxonomy>,
    /// `None` when the embedding model failed to load; scoring then answers 503
    /// until the process is restarted.
    pub ranker: Option<BatchRanker>,
}
