//! Trade Ticks
//!
//! `TradeEvent` is a validated tick decoded from the feed. `TradeRecord` is
//! what gets persisted: the event plus its bucket key and a creation stamp.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::bucket::BucketKey;

/// Feed-assigned trade identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeId(String);

impl TradeId {
    /// Create a trade ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side of the book that provided liquidity (`bid`, `ask`, `auction`, ...).
///
/// Kept as the feed's string; the feed may add sides this service does not
/// know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MakerSide(String);

impl MakerSide {
    /// Create a maker side.
    #[must_use]
    pub fn new(side: impl Into<String>) -> Self {
        Self(side.into())
    }

    /// Get the side as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single executed trade reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeEvent {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub amount: Decimal,
    /// Maker side.
    pub maker_side: MakerSide,
    /// Execution time in epoch milliseconds.
    pub timestamp_ms: i64,
}

/// A persisted trade.
///
/// Primary key is (`bucket_key`, `timestamp_ms`, `trade_id`); the store
/// also orders each partition by `price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    /// Window the trade falls in (partition key).
    pub bucket_key: BucketKey,
    /// Original execution time in epoch milliseconds (sort key).
    pub timestamp_ms: i64,
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub amount: Decimal,
    /// Maker side.
    pub maker_side: MakerSide,
    /// Wall-clock time the record was written. Informational only.
    pub created: DateTime<Utc>,
}

impl TradeRecord {
    /// Build a record from a validated event.
    #[must_use]
    pub fn from_event(event: TradeEvent, bucket_key: BucketKey, created: DateTime<Utc>) -> Self {
        Self {
            bucket_key,
            timestamp_ms: event.timestamp_ms,
            trade_id: event.trade_id,
            price: event.price,
            amount: event.amount,
            maker_side: event.maker_side,
            created,
        }
    }
}
