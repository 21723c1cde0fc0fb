//! OHLC Snapshot
//!
//! Response-only summary of the current window. Recomputed on every query.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Open/high/low/current prices for the current window.
///
/// `open` is the last trade of the *previous* window, so consecutive
/// windows chain close-to-open. Any field is `None` when its window has no
/// trades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OhlcSnapshot {
    /// Wall-clock time of the query.
    #[serde(serialize_with = "serialize_iso_millis")]
    pub time: DateTime<Utc>,
    /// Close of the previous window.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub open: Option<Decimal>,
    /// Highest price in the current window.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub high: Option<Decimal>,
    /// Lowest price in the current window.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub low: Option<Decimal>,
    /// Latest price in the current window.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub current: Option<Decimal>,
}

impl OhlcSnapshot {
    /// Whether the snapshot carries any price at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.open.is_none() && self.high.is_none() && self.low.is_none() && self.current.is_none()
    }
}

fn serialize_iso_millis<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}
