use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and whether the embedding model is loaded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let model = state.ranker.as_ref().map(|r| r.model_name().to_string());
    Json(json!({
        "status": if model.is_some() { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvscore-api",
        "model_loaded": model.is_some(),
        "model": model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::scoring::skills::SkillTaxonomy;

    #[tokio::test]
    async fn test_health_reports_missing_model() {
        let state = AppState {
            config: Config::default(),
            taxonomy: Arc::new(SkillTaxonomy::builtin()),
            ranker: None,
        };
        let Json(body) = health_handler(State(state)).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["model_loaded"], false);
    }
}
