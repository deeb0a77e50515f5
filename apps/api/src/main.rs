mod admin;
mod assess;
mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod recommendations;
mod routes;
mod scoring;
mod state;
mod store;
mod survey;
mod teacher;
mod uploads;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::recommendations::RecommendationGateway;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting InsightEd API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client behind the recommendation gateway
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_api_base)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let recommendations = RecommendationGateway::new(Arc::new(llm));

    info!(
        "Band thresholds: low <= {}, moderate <= {}",
        config.bands.low_max, config.bands.moderate_max
    );

    let state = AppState::new(db, config.clone(), recommendations);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the dashboard origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
