// Main entry point for the fan-out analyzer API server

use std::sync::Arc;

use anyhow::{Context, Result};
use fanout_core::domains::analysis::activities::fail_interrupted_analyses;
use fanout_core::kernel::{
    HttpContentSource, MemoryStore, OpenAiJudge, PostgresStore, RecordStore, ServerDeps,
};
use fanout_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fanout_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Query Fan-Out Analyzer API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            Arc::new(PostgresStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let content_source = HttpContentSource::new(config.fetch_timeout)
        .context("Failed to build HTTP client")?;
    let judge = OpenAiJudge::new(config.openai_api_key, config.openai_model)
        .with_base_url(config.openai_base_url);

    let deps = Arc::new(
        ServerDeps::new(store, Arc::new(content_source), Arc::new(judge))
            .with_stage_timeout(config.stage_timeout),
    );

    // Runs left mid-pipeline by a previous process will never finish
    fail_interrupted_analyses(&deps)
        .await
        .context("Failed to reconcile interrupted analyses")?;

    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
