//! Query OHLC Use Case
//!
//! Builds an `OhlcSnapshot` from four concurrent single-item index reads:
//!
//! | Field     | Partition | Index     | Condition    | Order      |
//! |-----------|-----------|-----------|--------------|------------|
//! | `open`    | previous  | timestamp | `ts > 0`     | descending |
//! | `high`    | current   | price     | `price > -1` | descending |
//! | `low`     | current   | price     | `price > -1` | ascending  |
//! | `current` | current   | timestamp | `ts > 0`     | descending |
//!
//! `open` is the previous window's close. Any failing read fails the whole
//! query; no partial snapshot is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::ports::{Clock, ScanDirection, StoreError, TradeStorePort};
use crate::domain::bucket::{BucketError, BucketKey, TimeBucketer};
use crate::domain::ohlc::OhlcSnapshot;

/// Lower bound (exclusive) for timestamp index scans.
const TIMESTAMP_FLOOR_MS: i64 = 0;

/// Lower bound (exclusive) for price index scans.
const PRICE_FLOOR: Decimal = Decimal::NEGATIVE_ONE;

/// Errors from an OHLC query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// One of the index reads failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The query time could not be bucketed.
    #[error(transparent)]
    Bucket(#[from] BucketError),
}

/// Use case for computing the current window's OHLC snapshot.
pub struct QueryOhlcUseCase<S>
where
    S: TradeStorePort,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    bucketer: TimeBucketer,
}

impl<S> QueryOhlcUseCase<S>
where
    S: TradeStorePort,
{
    /// Create a new `QueryOhlcUseCase`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, bucketer: TimeBucketer) -> Self {
        Self {
            store,
            clock,
            bucketer,
        }
    }

    /// Snapshot as of the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns `QueryError` if any store read fails.
    pub async fn execute(&self) -> Result<OhlcSnapshot, QueryError> {
        self.execute_at(self.clock.now()).await
    }

    /// Snapshot as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError` if any store read fails.
    pub async fn execute_at(&self, now: DateTime<Utc>) -> Result<OhlcSnapshot, QueryError> {
        let millis = now.timestamp_millis();
        let current_bucket = self.bucketer.bucket_key(millis)?;
        let previous_bucket = self.bucketer.previous_bucket_key(millis)?;

        let (open, high, low, current) = tokio::try_join!(
            self.latest_price(previous_bucket),
            self.extreme_price(current_bucket, ScanDirection::Descending),
            self.extreme_price(current_bucket, ScanDirection::Ascending),
            self.latest_price(current_bucket),
        )?;

        let snapshot = OhlcSnapshot {
            time: now,
            open,
            high,
            low,
            current,
        };
        if snapshot.is_empty() {
            tracing::debug!(
                window_start_ms = current_bucket.start_ms(),
                "No trades in the current or previous window"
            );
        }
        Ok(snapshot)
    }

    async fn latest_price(&self, partition: BucketKey) -> Result<Option<Decimal>, StoreError> {
        let record = self
            .store
            .first_by_timestamp(partition, TIMESTAMP_FLOOR_MS, ScanDirection::Descending)
            .await?;
        Ok(record.map(|r| r.price))
    }

    async fn extreme_price(
        &self,
        partition: BucketKey,
        direction: ScanDirection,
    ) -> Result<Option<Decimal>, StoreError> {
        let record = self
            .store
            .first_by_price(partition, PRICE_FLOOR, direction)
            .await?;
        Ok(record.map(|r| r.price))
    }
}
