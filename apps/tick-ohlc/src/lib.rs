#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::significant_drop_tightening
    )
)]

//! Tick OHLC - Trade Tick Ingestion and OHLC Query Service
//!
//! Accepts signed webhook batches of trade ticks from a market-data feed,
//! partitions them into fixed one-minute windows, and answers "what is the
//! OHLC of the current window right now" from four concurrent index reads.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types
//!   - `bucket`: Window arithmetic and `BucketKey`
//!   - `trade`: Validated ticks and persisted records
//!   - `ohlc`: The snapshot returned by the view
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Trade store and clock interfaces
//!   - `dto`: Loosely typed tick as delivered by the feed
//!   - `use_cases`: Trade ingestion and OHLC query
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: Webhook signature and envelope decoding
//!   - `persistence`: SQL and in-memory partitioned stores with a price index
//!   - `http`: axum routes `/health`, `/view`, `/endpoint`, `/metrics`
//!   - `config`, `telemetry`, `metrics`: Ambient stack
//!
//! # Data Flow
//!
//! ```text
//! Feed ──POST /endpoint──► verify ─► decode ─► ingest ──put──► Store
//!                                                               │
//! Client ──GET /view──► query (open ∥ high ∥ low ∥ current) ◄───┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::bucket::{BucketError, BucketKey, ONE_MINUTE_MS, TimeBucketer};
pub use domain::ohlc::OhlcSnapshot;
pub use domain::trade::{MakerSide, TradeEvent, TradeId, TradeRecord};

// Ports and use cases
pub use application::ports::{
    Clock, FixedClock, ScanDirection, StoreError, SystemClock, TradeStorePort,
};
pub use application::use_cases::{
    BatchAborted, IngestTradesUseCase, QueryError, QueryOhlcUseCase, WriteSummary,
};

// Infrastructure config
pub use infrastructure::config::{
    AllowedOrigins, ConfigError, ServerSettings, ServiceConfig, StoreSettings,
};

// Feed
pub use infrastructure::feed::{
    SIGNATURE_HEADER, SignatureError, SignatureVerifier, WebhookSecret,
};

// HTTP
pub use infrastructure::http::{ApiError, AppState, HttpServer, HttpServerError, create_router};

// Store adapter
pub use infrastructure::persistence::{InMemoryTradeStore, SqlTradeStore};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
