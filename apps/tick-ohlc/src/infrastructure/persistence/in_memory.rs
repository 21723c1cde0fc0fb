//! In-memory trade store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::application::ports::{ScanDirection, StoreError, TradeStorePort};
use crate::domain::bucket::BucketKey;
use crate::domain::trade::{TradeId, TradeRecord};

/// Primary key within a partition: timestamp, then trade ID.
type SortKey = (i64, TradeId);

/// One bucket's records with both orderings.
#[derive(Debug, Default)]
struct Partition {
    by_time: BTreeMap<SortKey, TradeRecord>,
    by_price: BTreeSet<(Decimal, SortKey)>,
}

impl Partition {
    fn insert(&mut self, record: TradeRecord) {
        let key = (record.timestamp_ms, record.trade_id.clone());
        if let Some(previous) = self.by_time.get(&key) {
            self.by_price.remove(&(previous.price, key.clone()));
        }
        self.by_price.insert((record.price, key.clone()));
        self.by_time.insert(key, record);
    }

    fn first_by_timestamp(&self, after_ms: i64, direction: ScanDirection) -> Option<&TradeRecord> {
        // Empty trade ID sorts first, so this includes every trade at `start`.
        let start = (after_ms.checked_add(1)?, TradeId::new(""));
        let mut range = self.by_time.range(start..).map(|(_, record)| record);
        match direction {
            ScanDirection::Ascending => range.next(),
            ScanDirection::Descending => range.next_back(),
        }
    }

    fn first_by_price(&self, above: Decimal, direction: ScanDirection) -> Option<&TradeRecord> {
        let mut range = self.by_price.iter().filter(|(price, _)| *price > above);
        let (_, key) = match direction {
            ScanDirection::Ascending => range.next(),
            ScanDirection::Descending => range.next_back(),
        }?;
        self.by_time.get(key)
    }
}

/// In-memory implementation of `TradeStorePort`.
///
/// Partitions by bucket key, orders each partition by timestamp and keeps a
/// price-ordered secondary index alongside. Suitable for tests and
/// single-process deployments; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    partitions: RwLock<HashMap<BucketKey, Partition>>,
}

impl InMemoryTradeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(|p| p.by_time.len()).sum()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in `partition`, in timestamp order.
    #[must_use]
    pub fn partition(&self, partition: BucketKey) -> Vec<TradeRecord> {
        self.partitions
            .read()
            .get(&partition)
            .map(|p| p.by_time.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TradeStorePort for InMemoryTradeStore {
    async fn first_by_timestamp(
        &self,
        partition: BucketKey,
        after_ms: i64,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(&partition)
            .and_then(|p| p.first_by_timestamp(after_ms, direction))
            .cloned())
    }

    async fn first_by_price(
        &self,
        partition: BucketKey,
        above: Decimal,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(&partition)
            .and_then(|p| p.first_by_price(above, direction))
            .cloned())
    }

    async fn put(&self, record: TradeRecord) -> Result<(), StoreError> {
        self.partitions
            .write()
            .entry(record.bucket_key)
            .or_default()
            .insert(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bucket::TimeBucketer;
    use crate::domain::trade::MakerSide;
    use chrono::Utc;

    fn record(id: &str, ts: i64, price: i64) -> TradeRecord {
        TradeRecord {
            bucket_key: TimeBucketer::default().bucket_key(ts).unwrap(),
            timestamp_ms: ts,
            trade_id: TradeId::new(id),
            price: Decimal::new(price, 0),
            amount: Decimal::ONE,
            maker_side: MakerSide::new("bid"),
            created: Utc::now(),
        }
    }

    fn bucket(ts: i64) -> BucketKey {
        TimeBucketer::default().bucket_key(ts).unwrap()
    }

    #[tokio::test]
    async fn timestamp_scan_both_directions() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 5)).await.unwrap();
        store.put(record("b", 60_300, 7)).await.unwrap();
        store.put(record("c", 60_200, 6)).await.unwrap();

        let first = store
            .first_by_timestamp(bucket(60_000), 0, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        let last = store
            .first_by_timestamp(bucket(60_000), 0, ScanDirection::Descending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.trade_id.as_str(), "a");
        assert_eq!(last.trade_id.as_str(), "b");
    }

    #[tokio::test]
    async fn timestamp_condition_is_strict() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 5)).await.unwrap();

        let none = store
            .first_by_timestamp(bucket(60_000), 60_100, ScanDirection::Ascending)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn price_index_orders_by_price() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 12)).await.unwrap();
        store.put(record("b", 60_200, 3)).await.unwrap();
        store.put(record("c", 60_300, 9)).await.unwrap();

        let low = store
            .first_by_price(bucket(60_000), Decimal::NEGATIVE_ONE, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        let high = store
            .first_by_price(bucket(60_000), Decimal::NEGATIVE_ONE, ScanDirection::Descending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(low.price, Decimal::new(3, 0));
        assert_eq!(high.price, Decimal::new(12, 0));
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 5)).await.unwrap();

        let other = store
            .first_by_timestamp(bucket(120_000), 0, ScanDirection::Descending)
            .await
            .unwrap();
        assert!(other.is_none());
        assert_eq!(store.partition(bucket(60_000)).len(), 1);
    }

    #[tokio::test]
    async fn same_millisecond_distinct_trades_are_kept() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 5)).await.unwrap();
        store.put(record("b", 60_100, 8)).await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn put_with_same_key_replaces_and_reindexes() {
        let store = InMemoryTradeStore::new();
        store.put(record("a", 60_100, 5)).await.unwrap();
        store.put(record("a", 60_100, 50)).await.unwrap();

        assert_eq!(store.len(), 1);
        let low = store
            .first_by_price(bucket(60_000), Decimal::NEGATIVE_ONE, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(low.price, Decimal::new(50, 0));
    }
}
