mod config;
mod embedding;
mod errors;
mod extraction;
mod models;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::load_embedder;
use crate::routes::build_router;
use crate::scoring::ranker::{BatchRanker, RankerOptions};
use crate::scoring::similarity::SimilarityScorer;
use crate::scoring::skills::SkillTaxonomy;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV scoring API v{}", env!("CARGO_PKG_VERSION"));

    // Skill taxonomy: built-in unless a file overrides it (a broken file is fatal)
    let taxonomy = match &config.taxonomy_path {
        Some(path) => SkillTaxonomy::from_file(path)
            .with_context(|| format!("Failed to load taxonomy from {}", path.display()))?,
        None => SkillTaxonomy::builtin(),
    };
    info!(
        "Skill taxonomy loaded: {}",
        taxonomy.category_names().collect::<Vec<_>>().join(", ")
    );
    let taxonomy = Arc::new(taxonomy);

    // Embedding model (a load failure leaves the service up but unable to score)
    let ranker = load_embedder(&config).await.map(|embedder| {
        BatchRanker::new(
            SimilarityScorer::new(embedder),
            taxonomy.clone(),
            RankerOptions {
                work_dir: config.work_dir.clone(),
                max_concurrent_documents: config.max_concurrent_documents,
                require_job_posting_text: config.require_job_posting_text,
            },
        )
    });

    let state = AppState {
        config: config.clone(),
        taxonomy,
        ranker,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
