use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use portfolio_api::{AppState, Config, Database, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Install the global subscriber: `RUST_LOG` filter, text or JSON output.
fn init_tracing(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.with_thread_ids(true).init();
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet; fall back to defaults so the error is visible
            init_tracing("info", "text");
            error!("Configuration error: {e}");
            return Err(exitcode::CONFIG);
        }
    };
    init_tracing(&config.log_level, &config.log_format);

    info!(
        "Starting Portfolio API v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        host = %config.host,
        port = %config.port,
        mongodb_uri = %config.redacted_mongodb_uri(),
        database = %config.database_name,
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    info!("Connecting to document store...");
    let db = Database::connect(&config).await.map_err(|e| {
        error!("Failed to connect to document store: {e}");
        exitcode::UNAVAILABLE
    })?;

    let state = AppState::new(db, config.clone());
    let app = build_router(state.clone()).map_err(|e| {
        error!("Failed to build router: {e}");
        exitcode::CONFIG
    })?;

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /api/csrf-token - Issue a CSRF token");
    info!("  POST /api/contact    - Submit the contact form");
    info!("  GET  /api/projects   - List projects");
    info!("  POST /api/projects   - Create a project");
    info!("  GET  /health         - Health check");
    info!("  GET  /ready          - Readiness check");

    // Connect info feeds the rate limiter's peer-address fallback
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("HTTP server stopped, shutting down background tasks...");
    state.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
