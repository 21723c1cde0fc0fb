//! Time Bucketing
//!
//! Maps an epoch-millisecond timestamp onto the fixed-width window that
//! contains it. The window start, rendered as an ISO-8601 UTC instant with
//! millisecond precision (`2024-05-01T12:34:00.000Z`), is the partition key
//! under which trades are stored.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Default window width: one minute.
pub const ONE_MINUTE_MS: i64 = 60_000;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced while bucketing a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketError {
    /// Window width must be strictly positive.
    #[error("window width must be positive, got {0}ms")]
    InvalidWindow(i64),

    /// The window start cannot be represented as a calendar instant.
    #[error("timestamp {0}ms is outside the representable calendar range")]
    OutOfRange(i64),
}

// =============================================================================
// Bucket Key
// =============================================================================

/// Start instant of a time window, used as the store partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(DateTime<Utc>);

impl BucketKey {
    /// Window start in epoch milliseconds.
    #[must_use]
    pub fn start_ms(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// ISO-8601 rendering used as the partition key string.
    #[must_use]
    pub fn as_iso(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_iso())
    }
}

// =============================================================================
// Time Bucketer
// =============================================================================

/// Maps timestamps to their enclosing window and the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucketer {
    window_ms: i64,
}

impl Default for TimeBucketer {
    fn default() -> Self {
        Self {
            window_ms: ONE_MINUTE_MS,
        }
    }
}

impl TimeBucketer {
    /// Create a bucketer with the given window width.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::InvalidWindow` if `window_ms` is not positive.
    pub const fn new(window_ms: i64) -> Result<Self, BucketError> {
        if window_ms <= 0 {
            return Err(BucketError::InvalidWindow(window_ms));
        }
        Ok(Self { window_ms })
    }

    /// Window start for `timestamp_ms`, floored toward negative infinity.
    ///
    /// `None` only when the floored start would underflow `i64`.
    #[must_use]
    pub const fn window_start_ms(&self, timestamp_ms: i64) -> Option<i64> {
        timestamp_ms.checked_sub(timestamp_ms.rem_euclid(self.window_ms))
    }

    /// Key of the window containing `timestamp_ms`.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::OutOfRange` if the window start cannot be
    /// rendered as a calendar instant.
    pub fn bucket_key(&self, timestamp_ms: i64) -> Result<BucketKey, BucketError> {
        let start = self
            .window_start_ms(timestamp_ms)
            .ok_or(BucketError::OutOfRange(timestamp_ms))?;
        to_key(start, timestamp_ms)
    }

    /// Key of the window immediately before the one containing `timestamp_ms`.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::OutOfRange` if the window start cannot be
    /// rendered as a calendar instant.
    pub fn previous_bucket_key(&self, timestamp_ms: i64) -> Result<BucketKey, BucketError> {
        let start = self
            .window_start_ms(timestamp_ms)
            .and_then(|start| start.checked_sub(self.window_ms))
            .ok_or(BucketError::OutOfRange(timestamp_ms))?;
        to_key(start, timestamp_ms)
    }
}

fn to_key(start_ms: i64, timestamp_ms: i64) -> Result<BucketKey, BucketError> {
    DateTime::from_timestamp_millis(start_ms)
        .map(BucketKey)
        .ok_or(BucketError::OutOfRange(timestamp_ms))
}

// =============================================================================
// Tests
// =============================================================================
