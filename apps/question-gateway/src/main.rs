use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_questions::{
    ApiDoc, OpenAIProvider, PineconeStore, ProvisionOutcome, QuestionService, ensure_index,
    handlers,
};
use eyre::WrapErr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod config;
mod health;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Optional .env file, reported once tracing is up
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let store = PineconeStore::new(config.pinecone.clone())
        .wrap_err("Failed to build the Pinecone client")?;

    // Provisioning failure is fatal, before the listener is bound
    let outcome = ensure_index(&store, &config.provisioning)
        .await
        .wrap_err_with(|| format!("Failed to provision index '{}'", store.index_name()))?;
    if outcome == ProvisionOutcome::AlreadyExists {
        info!("Using existing index '{}'", store.index_name());
    }

    let embedder = Arc::new(
        OpenAIProvider::new(config.openai.clone())
            .wrap_err("Failed to build the OpenAI client")?,
    );

    let index_name = store.index_name().to_string();
    let service = Arc::new(
        QuestionService::new(store, embedder, index_name).with_model(config.embedding_model),
    );

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<ApiDoc>(handlers::router(service.clone())).await?;

    // - /health: liveness check with app name/version
    // - /ready: the index can be described and reports ready
    let app = router
        .merge(health_router(config.app))
        .merge(health::ready_router(service));

    info!(
        model = %config.embedding_model,
        environment = ?config.environment,
        "Starting {} v{}",
        config.app.name,
        config.app.version
    );

    create_production_app(app, &config.server, Duration::from_secs(10), async {
        info!("Shutting down: no open connections to close");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Question gateway shutdown complete");
    Ok(())
}
