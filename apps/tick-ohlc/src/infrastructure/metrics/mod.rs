//! Prometheus Metrics Module
//!
//! Exposes ingestion and query metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Webhooks**: deliveries by outcome, aborted batches
//! - **Ticks**: ticks written and ticks skipped as invalid
//! - **Queries**: OHLC queries by outcome and their latency
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server. Recording is a
//! no-op until `init_metrics` installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first.
///
/// # Errors
///
/// Returns `BuildError` if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "tick_ohlc_webhooks_total",
        "Webhook deliveries by outcome"
    );
    describe_counter!(
        "tick_ohlc_batches_aborted_total",
        "Batches cut short by a store write failure"
    );
    describe_counter!(
        "tick_ohlc_ticks_written_total",
        "Trade ticks persisted to the store"
    );
    describe_counter!(
        "tick_ohlc_ticks_skipped_total",
        "Trade ticks dropped as invalid"
    );
    describe_counter!("tick_ohlc_queries_total", "OHLC queries by outcome");
    describe_histogram!(
        "tick_ohlc_query_duration_seconds",
        "Time to assemble an OHLC snapshot"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Batch processed (possibly with skipped ticks).
    Processed,
    /// Non-trade event acknowledged.
    Ignored,
    /// Signature check failed.
    Unauthorized,
    /// Envelope could not be decoded.
    Invalid,
    /// Store failure stopped the batch partway.
    Aborted,
}

impl WebhookOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Ignored => "ignored",
            Self::Unauthorized => "unauthorized",
            Self::Invalid => "invalid",
            Self::Aborted => "aborted",
        }
    }
}

/// Record a webhook delivery outcome.
pub fn record_webhook(outcome: WebhookOutcome) {
    counter!("tick_ohlc_webhooks_total", "outcome" => outcome.as_str()).increment(1);
    if outcome == WebhookOutcome::Aborted {
        counter!("tick_ohlc_batches_aborted_total").increment(1);
    }
}

/// Record ticks written and skipped for one batch.
pub fn record_ticks(written: usize, skipped: usize) {
    counter!("tick_ohlc_ticks_written_total").increment(written as u64);
    counter!("tick_ohlc_ticks_skipped_total").increment(skipped as u64);
}

/// Record an OHLC query and how long it took.
pub fn record_query(success: bool, duration: Duration) {
    let outcome = if success { "ok" } else { "error" };
    counter!("tick_ohlc_queries_total", "outcome" => outcome).increment(1);
    histogram!("tick_ohlc_query_duration_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
