//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the driving HTTP adapter.

/// Configuration and dependency injection.
pub mod config;

/// Webhook feed: signature verification and envelope decoding.
pub mod feed;

/// HTTP API (axum router, handlers, server).
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Trade store adapters.
pub mod persistence;

/// OpenTelemetry tracing integration.
pub mod telemetry;
