//! Domain Layer - Core trade and window types.
//!
//! Pure types with no I/O: time bucketing, trade ticks and records, and
//! the OHLC snapshot returned to consumers.

/// Fixed-width time windows and their partition keys.
pub mod bucket;

/// Trade events and persisted trade records.
pub mod trade;

/// Windowed OHLC summary.
pub mod ohlc;
