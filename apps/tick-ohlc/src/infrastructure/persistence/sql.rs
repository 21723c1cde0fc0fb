//! SQL trade store.
//!
//! Durable `TradeStorePort` over any sqlx-supported database (`SQLite` or
//! Postgres, picked by the connection URL). One table holds every partition;
//! the primary key is `(bucket_key, timestamp_ms, trade_id)` and a secondary
//! index on `(bucket_key, price)` serves the price scans.
//!
//! Prices are kept twice: `price_exact` holds the decimal text returned to
//! callers, `price` holds a float used only for ordering and filtering.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};

use crate::application::ports::{ScanDirection, StoreError, TradeStorePort};
use crate::domain::bucket::BucketKey;
use crate::domain::trade::{MakerSide, TradeId, TradeRecord};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS trades (
    bucket_key TEXT NOT NULL,
    timestamp_ms BIGINT NOT NULL,
    trade_id TEXT NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    price_exact TEXT NOT NULL,
    amount TEXT NOT NULL,
    maker_side TEXT NOT NULL,
    created TEXT NOT NULL,
    PRIMARY KEY (bucket_key, timestamp_ms, trade_id)
)";

const CREATE_PRICE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS trades_by_price ON trades (bucket_key, price)";

const UPSERT: &str = "INSERT INTO trades
    (bucket_key, timestamp_ms, trade_id, price, price_exact, amount, maker_side, created)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (bucket_key, timestamp_ms, trade_id) DO UPDATE SET
        price = excluded.price,
        price_exact = excluded.price_exact,
        amount = excluded.amount,
        maker_side = excluded.maker_side,
        created = excluded.created";

const BY_TIMESTAMP_ASC: &str = "SELECT timestamp_ms, trade_id, price_exact, amount, maker_side, created
    FROM trades WHERE bucket_key = $1 AND timestamp_ms > $2
    ORDER BY timestamp_ms ASC, trade_id ASC LIMIT 1";

const BY_TIMESTAMP_DESC: &str = "SELECT timestamp_ms, trade_id, price_exact, amount, maker_side, created
    FROM trades WHERE bucket_key = $1 AND timestamp_ms > $2
    ORDER BY timestamp_ms DESC, trade_id DESC LIMIT 1";

const BY_PRICE_ASC: &str = "SELECT timestamp_ms, trade_id, price_exact, amount, maker_side, created
    FROM trades WHERE bucket_key = $1 AND price > $2
    ORDER BY price ASC, timestamp_ms ASC, trade_id ASC LIMIT 1";

const BY_PRICE_DESC: &str = "SELECT timestamp_ms, trade_id, price_exact, amount, maker_side, created
    FROM trades WHERE bucket_key = $1 AND price > $2
    ORDER BY price DESC, timestamp_ms DESC, trade_id DESC LIMIT 1";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::RequestFailed(err.to_string()),
        }
    }
}

/// sqlx-backed implementation of `TradeStorePort`.
#[derive(Debug, Clone)]
pub struct SqlTradeStore {
    pool: AnyPool,
}

impl SqlTradeStore {
    /// Connect to `url` and create the table and price index if missing.
    ///
    /// `sqlite::memory:` URLs get a single connection that is never
    /// recycled; each in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be reached,
    /// or `StoreError::RequestFailed` if the schema cannot be created.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();

        let options = if url.contains(":memory:") {
            AnyPoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            AnyPoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query::<Any>(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query::<Any>(CREATE_PRICE_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_first<'q>(
        &self,
        query: Query<'q, Any, AnyArguments<'q>>,
        partition: BucketKey,
    ) -> Result<Option<TradeRecord>, StoreError> {
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|row| record_from_row(&row, partition)).transpose()
    }
}

fn record_from_row(row: &AnyRow, partition: BucketKey) -> Result<TradeRecord, StoreError> {
    let timestamp_ms: i64 = row.try_get("timestamp_ms")?;
    let trade_id: String = row.try_get("trade_id")?;
    let price: String = row.try_get("price_exact")?;
    let amount: String = row.try_get("amount")?;
    let maker_side: String = row.try_get("maker_side")?;
    let created: String = row.try_get("created")?;

    Ok(TradeRecord {
        bucket_key: partition,
        timestamp_ms,
        trade_id: TradeId::new(trade_id),
        price: parse_decimal("price_exact", &price)?,
        amount: parse_decimal("amount", &amount)?,
        maker_side: MakerSide::new(maker_side),
        created: DateTime::parse_from_rfc3339(&created)
            .map_err(|e| StoreError::RequestFailed(format!("created {created:?}: {e}")))?
            .with_timezone(&Utc),
    })
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| StoreError::RequestFailed(format!("{column} {raw:?}: {e}")))
}

fn sort_price(price: Decimal) -> Result<f64, StoreError> {
    price
        .to_f64()
        .ok_or_else(|| StoreError::RequestFailed(format!("price {price} has no float form")))
}

#[async_trait]
impl TradeStorePort for SqlTradeStore {
    async fn first_by_timestamp(
        &self,
        partition: BucketKey,
        after_ms: i64,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        let sql = match direction {
            ScanDirection::Ascending => BY_TIMESTAMP_ASC,
            ScanDirection::Descending => BY_TIMESTAMP_DESC,
        };
        let query = sqlx::query::<Any>(sql)
            .bind(partition.as_iso())
            .bind(after_ms);
        self.fetch_first(query, partition).await
    }

    async fn first_by_price(
        &self,
        partition: BucketKey,
        above: Decimal,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        let sql = match direction {
            ScanDirection::Ascending => BY_PRICE_ASC,
            ScanDirection::Descending => BY_PRICE_DESC,
        };
        let above = sort_price(above)?;
        let query = sqlx::query::<Any>(sql)
            .bind(partition.as_iso())
            .bind(above);
        self.fetch_first(query, partition).await
    }

    async fn put(&self, record: TradeRecord) -> Result<(), StoreError> {
        sqlx::query::<Any>(UPSERT)
            .bind(record.bucket_key.as_iso())
            .bind(record.timestamp_ms)
            .bind(record.trade_id.as_str().to_string())
            .bind(sort_price(record.price)?)
            .bind(record.price.to_string())
            .bind(record.amount.to_string())
            .bind(record.maker_side.as_str().to_string())
            .bind(record.created.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bucket::TimeBucketer;

    const MEMORY: &str = "sqlite::memory:";

    fn bucket(ts: i64) -> BucketKey {
        TimeBucketer::default().bucket_key(ts).unwrap()
    }

    fn record(id: &str, ts: i64, price: &str) -> TradeRecord {
        TradeRecord {
            bucket_key: bucket(ts),
            timestamp_ms: ts,
            trade_id: TradeId::new(id),
            price: Decimal::from_str(price).unwrap(),
            amount: Decimal::new(25, 2),
            maker_side: MakerSide::new("ask"),
            created: DateTime::from_timestamp_millis(1_714_566_900_123).unwrap(),
        }
    }

    async fn store() -> SqlTradeStore {
        SqlTradeStore::connect(MEMORY, 5).await.unwrap()
    }

    #[tokio::test]
    async fn timestamp_scan_both_directions() {
        let store = store().await;
        store.put(record("a", 60_100, "5")).await.unwrap();
        store.put(record("b", 60_300, "7")).await.unwrap();
        store.put(record("c", 60_200, "6")).await.unwrap();

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
        let store = store().await;
        store.put(record("a", 60_100, "5")).await.unwrap();

        let none = store
            .first_by_timestamp(bucket(60_000), 60_100, ScanDirection::Ascending)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn price_index_orders_by_numeric_value() {
        let store = store().await;
        store.put(record("a", 60_100, "12")).await.unwrap();
        store.put(record("b", 60_200, "3")).await.unwrap();
        store.put(record("c", 60_300, "9.5")).await.unwrap();

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

        assert_eq!(low.trade_id.as_str(), "b");
        assert_eq!(high.trade_id.as_str(), "a");
    }

    #[tokio::test]
    async fn record_fields_survive_storage() {
        let store = store().await;
        let original = record("x-1", 60_500, "64123.456789");
        store.put(original.clone()).await.unwrap();

        let loaded = store
            .first_by_timestamp(bucket(60_000), 0, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let store = store().await;
        store.put(record("a", 60_100, "5")).await.unwrap();

        let other = store
            .first_by_price(bucket(120_000), Decimal::NEGATIVE_ONE, ScanDirection::Descending)
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn put_with_same_key_replaces_and_reindexes() {
        let store = store().await;
        store.put(record("a", 60_100, "5")).await.unwrap();
        store.put(record("b", 60_200, "20")).await.unwrap();
        store.put(record("a", 60_100, "50")).await.unwrap();

        let high = store
            .first_by_price(bucket(60_000), Decimal::NEGATIVE_ONE, ScanDirection::Descending)
            .await
            .unwrap()
            .unwrap();
        let low = store
            .first_by_price(bucket(60_000), Decimal::NEGATIVE_ONE, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(high.price, Decimal::new(50, 0));
        assert_eq!(low.trade_id.as_str(), "b");
    }

    #[tokio::test]
    async fn records_outlive_the_connection_pool() {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!(
            "tick-ohlc-{}-{nanos}.db",
            std::process::id()
        ));
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let first = SqlTradeStore::connect(&url, 2).await.unwrap();
        first.put(record("a", 60_100, "5")).await.unwrap();
        first.close().await;

        let reopened = SqlTradeStore::connect(&url, 2).await.unwrap();
        let found = reopened
            .first_by_timestamp(bucket(60_000), 0, ScanDirection::Descending)
            .await
            .unwrap();
        reopened.close().await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(found.unwrap().trade_id.as_str(), "a");
    }

    #[tokio::test]
    async fn unreachable_database_is_unavailable() {
        let result = SqlTradeStore::connect("sqlite:///nonexistent-dir/x/y.db", 1).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
