//! Aula Server - HTTP API for the multimodal study assistant

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod state;

use aula_core::{Engine, EngineConfig};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aula_server=debug,aula_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aula Server");

    let config = EngineConfig::from_env();
    info!("Models directory: {:?}", config.models_dir);
    info!("Image modality backend: {:?}", config.image_backend);

    let engine = Engine::new(config)?;
    let state = AppState::new(engine);

    // The text-generation service is external; an unreachable service is a
    // warning, not a startup failure.
    if let Err(e) = state.engine.probe_text_service().await {
        warn!("Text-generation service unreachable at startup: {e}. Start it and requests will recover.");
    }

    let app = api::create_router(state.clone());

    let host = std::env::var("AULA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("AULA_PORT") {
        Ok(raw) => match raw.parse::<u16>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid AULA_PORT='{}', falling back to 8080", raw);
                8080
            }
        },
        Err(_) => 8080,
    };
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready. Press Ctrl+C to stop.");
    server.await?;

    Ok(())
}

/// Wait for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}
