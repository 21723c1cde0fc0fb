//! Trade Store Port (Driven Port)
//!
//! Interface to a partitioned key-value store. Each partition is one time
//! bucket, ordered by trade timestamp on the primary index and by price on
//! a single secondary index. Reads return at most one item; writes are
//! single-item, non-transactional puts.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::bucket::BucketKey;
use crate::domain::trade::TradeRecord;

/// Direction of an index scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Smallest key first.
    Ascending,
    /// Largest key first.
    Descending,
}

/// Errors from the trade store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the request.
    #[error("store request failed: {0}")]
    RequestFailed(String),
}

/// Port for trade persistence and range lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeStorePort: Send + Sync {
    /// First trade in `partition` whose timestamp is strictly greater than
    /// `after_ms`, scanning the primary index in `direction`.
    async fn first_by_timestamp(
        &self,
        partition: BucketKey,
        after_ms: i64,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError>;

    /// First trade in `partition` whose price is strictly greater than
    /// `above`, scanning the price index in `direction`.
    async fn first_by_price(
        &self,
        partition: BucketKey,
        above: Decimal,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError>;

    /// Insert a record, replacing any record with the same primary key.
    async fn put(&self, record: TradeRecord) -> Result<(), StoreError>;
}
