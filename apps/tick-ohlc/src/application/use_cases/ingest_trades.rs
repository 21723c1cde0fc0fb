//! Ingest Trades Use Case
//!
//! Validates each candidate tick, buckets it, and writes it to the store.
//! Writes are sequential: each put completes before the next starts. An
//! invalid tick is skipped; a store failure stops the batch and leaves the
//! already-written ticks in place.

use std::sync::Arc;

use thiserror::Error;

use crate::application::dto::TradeTickDto;
use crate::application::ports::{Clock, StoreError, TradeStorePort};
use crate::domain::bucket::TimeBucketer;
use crate::domain::trade::TradeRecord;

/// Counts for a fully processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Ticks persisted.
    pub written: usize,
    /// Ticks dropped as invalid.
    pub skipped: usize,
}

/// A store write failed partway through a batch.
#[derive(Debug, Error)]
#[error("batch aborted after {written} writes ({remaining} ticks not attempted): {source}")]
pub struct BatchAborted {
    /// Ticks persisted before the failure.
    pub written: usize,
    /// Ticks dropped as invalid before the failure.
    pub skipped: usize,
    /// Ticks after the failing one that were never attempted.
    pub remaining: usize,
    /// The store error.
    #[source]
    pub source: StoreError,
}

/// Use case for persisting a batch of trade ticks.
pub struct IngestTradesUseCase<S>
where
    S: TradeStorePort,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    bucketer: TimeBucketer,
}

impl<S> IngestTradesUseCase<S>
where
    S: TradeStorePort,
{
    /// Create a new `IngestTradesUseCase`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, bucketer: TimeBucketer) -> Self {
        Self {
            store,
            clock,
            bucketer,
        }
    }

    /// Validate and write every tick in `ticks`, in order.
    ///
    /// # Errors
    ///
    /// Returns `BatchAborted` on the first store failure. Ticks after the
    /// failing one are not attempted.
    pub async fn execute(&self, ticks: Vec<TradeTickDto>) -> Result<WriteSummary, BatchAborted> {
        let total = ticks.len();
        let mut summary = WriteSummary::default();

        for (index, tick) in ticks.into_iter().enumerate() {
            let Some(record) = self.to_record(&tick) else {
                summary.skipped += 1;
                continue;
            };

            if let Err(source) = self.store.put(record).await {
                return Err(BatchAborted {
                    written: summary.written,
                    skipped: summary.skipped,
                    remaining: total - index - 1,
                    source,
                });
            }
            summary.written += 1;
        }

        tracing::debug!(
            written = summary.written,
            skipped = summary.skipped,
            "Trade batch written"
        );
        Ok(summary)
    }

    fn to_record(&self, tick: &TradeTickDto) -> Option<TradeRecord> {
        let event = tick.validate()?;
        let bucket_key = self.bucketer.bucket_key(event.timestamp_ms).ok()?;
        Some(TradeRecord::from_event(event, bucket_key, self.clock.now()))
    }
}
