mod analysis;
mod cards;
mod config;
mod conversation;
mod errors;
mod extraction;
mod fetch;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::conversation::store::SessionStore;
use crate::extraction::parser::{FieldParser, HeuristicFieldParser, LlmFieldParser};
use crate::fetch::HttpFetcher;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on unparsable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobcards v{}", env!("CARGO_PKG_VERSION"));

    // Initialize source fetcher
    let fetcher = Arc::new(HttpFetcher::new(
        &config.fetch_user_agent,
        config.fetch_timeout,
        config.fetch_max_bytes,
    )?);
    info!(
        "Source fetcher initialized (timeout: {:?}, cap: {} bytes)",
        config.fetch_timeout, config.fetch_max_bytes
    );

    // Initialize parsing backend (LLM when a key is configured, heuristics otherwise)
    let parser: Arc<dyn FieldParser> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone(), config.backend_timeout)?;
            info!("LLM parser initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmFieldParser::new(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; using the heuristic parser");
            Arc::new(HeuristicFieldParser)
        }
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        fetcher,
        parser,
        sessions: SessionStore::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
