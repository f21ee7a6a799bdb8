//! Denuncia Intake Service
//!
//! REST API receiving complaints from the "Centro de Denuncias" form

use anyhow::{Context, Result};
use intake_service::{config::Config, create_router, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Denuncia Intake Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded - listening on {}", config.api_address());

    let store = config
        .object_store()
        .context("Failed to initialize storage")?;

    match &store {
        Some(store) => info!("Storage: {}", store.describe()),
        None => warn!(
            "{} is not set; every submission will fail until it is configured",
            intake_service::config::CONNECTION_STRING_VAR
        ),
    }
    info!(
        "Limits: {} bytes per attachment, {} bytes per request",
        config.limits.max_attachment_bytes, config.limits.max_request_bytes
    );

    // Create application state
    let state = AppState::new(store, config.limits);

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Intake Service running on http://{}", config.api_address());
    info!("  POST /api/submit-denuncia - Submit a denuncia");
    info!("  GET /health - Health check");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
