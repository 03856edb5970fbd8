//! cardfold-server - HTTP server binary.

use std::net::SocketAddr;

use cardfold_core::config::CardfoldConfig;
use cardfold_server::{create_server, AppState};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Configuration from the file named by `CARDFOLD_CONFIG`, else from the environment.
fn load_config() -> Result<CardfoldConfig, Box<dyn std::error::Error>> {
    match std::env::var("CARDFOLD_CONFIG") {
        Ok(path) if !path.trim().is_empty() => {
            info!(path = %path, "Loading configuration file");
            Ok(CardfoldConfig::from_file(path.trim())?)
        }
        _ => Ok(CardfoldConfig::from_env()?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("cardfold_server=debug".parse()?),
        )
        .init();

    let config = load_config()?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Build store, categorizer and providers
    let state = AppState::from_config(config)?;
    let app = create_server(state);

    info!("Starting cardfold-server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
