//! Tick OHLC Binary
//!
//! Starts the webhook ingestion and OHLC query service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tick-ohlc
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ANTENNY_SECRET`: Shared webhook signing secret
//!
//! ## Optional
//! - `TICK_OHLC_HTTP_PORT`: HTTP port (default: 8080)
//! - `TICK_OHLC_WINDOW_MS`: Bucket width in milliseconds (default: 60000)
//! - `TICK_OHLC_ALLOWED_ORIGINS`: Comma-separated CORS origins (default: *)
//! - `TICK_OHLC_REQUEST_TIMEOUT_SECS`: Per-request budget (default: 30)
//! - `TICK_OHLC_MAX_BODY_BYTES`: Webhook body limit (default: 1048576)
//! - `TICK_OHLC_STORE_URL`: sqlx store URL (default: `sqlite://tick-ohlc.db?mode=rwc`)
//! - `TICK_OHLC_STORE_MAX_CONNECTIONS`: Store pool size (default: 5)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: tick-ohlc)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tick_ohlc::infrastructure::telemetry;
use tick_ohlc::{
    AppState, HttpServer, ServiceConfig, SignatureVerifier, SqlTradeStore, SystemClock,
    TimeBucketer, create_router, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting Tick OHLC");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = ServiceConfig::from_env()?;
    log_config(&config);

    let bucketer = TimeBucketer::new(config.window_ms)?;
    let verifier = SignatureVerifier::new(&config.webhook_secret)?;

    // One store pool shared by every handler
    let store = Arc::new(
        SqlTradeStore::connect(&config.store.url, config.store.max_connections)
            .await
            .context("failed to connect to trade store")?,
    );
    let state = AppState::new(Arc::clone(&store), Arc::new(SystemClock), bucketer, verifier);
    let router = create_router(state, &config.server);

    let shutdown_token = CancellationToken::new();
    let server = HttpServer::new(config.server.http_port, router, shutdown_token.clone());
    let server_task = tokio::spawn(server.run());

    tracing::info!("Tick OHLC ready");

    await_shutdown(shutdown_token).await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, server_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task panicked"),
        Err(_) => tracing::warn!("Graceful shutdown timed out"),
    }

    store.close().await;

    tracing::info!("Tick OHLC stopped");
    Ok(())
}

/// Load .env from the current directory or the nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        window_ms = config.window_ms,
        request_timeout_secs = config.server.request_timeout.as_secs(),
        max_body_bytes = config.server.max_body_bytes,
        allowed_origins = ?config.server.allowed_origins,
        store_backend = config.store.url.split(':').next().unwrap_or_default(),
        store_max_connections = config.store.max_connections,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
