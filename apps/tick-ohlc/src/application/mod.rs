//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the use cases and the port interfaces that define
//! how the domain interacts with the trade store and the clock.

/// Loosely typed inputs from the feed.
pub mod dto;

/// Port interfaces for external systems (store, clock).
pub mod ports;

/// Ingestion and OHLC query use cases.
pub mod use_cases;
