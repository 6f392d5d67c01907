//! Olive of Wholeness site server

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wholeness::{
    api::{self, AppState},
    backend::Backends,
    config::Config,
    services::AnalyticsService,
    theme::TemplateEngine,
};

/// Timeout for calls to the analytics API
const ANALYTICS_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wholeness=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Olive of Wholeness site server...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Backend clients
    let backends = Backends::connect(&config)?;
    tracing::info!(url = %config.backend.url, "Backend client ready");

    // Templates
    let templates = TemplateEngine::new(config.theme.path.as_deref())?;
    match &config.theme.path {
        Some(path) => tracing::info!("Templates loaded from {}", path.display()),
        None => tracing::info!("Embedded templates loaded"),
    }

    // Analytics
    let analytics_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(ANALYTICS_TIMEOUT_SECS))
        .build()
        .context("Failed to build analytics HTTP client")?;
    let analytics = AnalyticsService::from_config(&config.analytics, analytics_http);
    tracing::info!(enabled = analytics.is_enabled(), "Analytics initialized");

    // Build application state
    let state = AppState::new(&config, backends, templates, analytics);

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
