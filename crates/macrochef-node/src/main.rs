//! # MacroChef Node
//!
//! Recipe job API server.

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod correlator;
mod pipeline;
mod state;

use config::NodeConfig;
use state::AppState;

/// Run the node server until it is shut down.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    info!("MacroChef node starting...");

    let state = AppState::from_config(&config).await?;
    let _sweeper = correlator::spawn_sweeper(state.results.clone(), config.purge_interval);

    let app = create_router(state);

    info!("Listening on http://{}", config.addr);

    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health_check))
        // Recipe jobs
        .route("/api/v1/recipes", post(api::recipes::submit_recipe))
        .route("/api/v1/recipes/query", post(api::recipes::submit_recipe_query))
        .route("/api/v1/recipes/:op_id", get(api::recipes::get_recipe))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env()?;
    run_server(config).await
}
