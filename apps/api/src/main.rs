mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod vehicle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatCompletion, LlmClient};
use crate::routes::build_router;
use crate::state::{AppState, SessionStore};
use crate::vehicle::lookup::VehicleLookup;
use crate::vehicle::registry::NhtsaClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Listing API v{}", env!("CARGO_PKG_VERSION"));

    // One connection pool shared by the registry and generation clients
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let registry = Arc::new(NhtsaClient::new(http.clone(), config.vpic_base_url.clone()));
    info!("Vehicle registry client initialized ({})", config.vpic_base_url);

    let generator: Option<Arc<dyn ChatCompletion>> = match &config.openai_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            let client = LlmClient::new(http, key.clone(), config.openai_base_url.clone());
            Some(Arc::new(client) as Arc<dyn ChatCompletion>)
        }
        None => {
            warn!("OPENAI_API_KEY is not set; description generation is disabled");
            None
        }
    };

    let session_ttl = Duration::from_secs(config.session_ttl_secs);
    let sessions = SessionStore::new(session_ttl);
    // Sweep at a fraction of the TTL so idle forms never linger much past it
    sessions.spawn_sweeper((session_ttl / 4).max(Duration::from_secs(1)));
    info!("Form sessions expire after {}s idle", config.session_ttl_secs);

    let state = AppState {
        lookup: VehicleLookup::new(registry, generator),
        sessions,
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
