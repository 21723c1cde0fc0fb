//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use tick_ohlc::{
    AppState, BucketKey, FixedClock, InMemoryTradeStore, SIGNATURE_HEADER, ScanDirection,
    ServerSettings, SignatureVerifier, StoreError, TimeBucketer, TradeRecord, TradeStorePort,
    WebhookSecret, create_router,
};

/// Shared secret used by every fixture.
pub const SECRET: &str = "integration-secret";

/// 2024-05-01T12:34:00.000Z
pub const WINDOW: i64 = 1_714_566_840_000;

/// Query instant used by the fixed clock: 55 s into `WINDOW`.
pub const NOW: i64 = WINDOW + 55_000;

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(&WebhookSecret::new(SECRET.to_string())).unwrap()
}

pub fn router_with<S: TradeStorePort + 'static>(store: Arc<S>) -> Router {
    router_with_settings(store, &ServerSettings::default())
}

pub fn router_with_settings<S: TradeStorePort + 'static>(
    store: Arc<S>,
    settings: &ServerSettings,
) -> Router {
    let clock = Arc::new(FixedClock::new(at(NOW)));
    let state = AppState::new(store, clock, TimeBucketer::default(), verifier());
    create_router(state, settings)
}

pub fn app() -> (Router, Arc<InMemoryTradeStore>) {
    let store = Arc::new(InMemoryTradeStore::new());
    (router_with(Arc::clone(&store)), store)
}

/// A webhook body wrapping `events` the way the feed does.
pub fn delivery(event: &str, events: &Value) -> String {
    let message = json!({ "events": events }).to_string();
    json!({ "event": event, "message": message }).to_string()
}

pub fn tick(tid: u64, ts: i64, price: &str) -> Value {
    json!({
        "tid": tid,
        "price": price,
        "amount": "0.25",
        "makerSide": "bid",
        "timestampms": ts,
    })
}

pub fn signed_post(body: &str) -> Request<Body> {
    let signature = verifier().sign(body.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/endpoint")
        .header(SIGNATURE_HEADER, signature)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Store whose every call fails.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl TradeStorePort for FailingStore {
    async fn first_by_timestamp(
        &self,
        _partition: BucketKey,
        _after_ms: i64,
        _direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn first_by_price(
        &self,
        _partition: BucketKey,
        _above: Decimal,
        _direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn put(&self, _record: TradeRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Store whose writes never finish within a test's time budget.
#[derive(Debug, Default)]
pub struct StalledStore {
    inner: InMemoryTradeStore,
}

#[async_trait]
impl TradeStorePort for StalledStore {
    async fn first_by_timestamp(
        &self,
        partition: BucketKey,
        after_ms: i64,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        self.inner
            .first_by_timestamp(partition, after_ms, direction)
            .await
    }

    async fn first_by_price(
        &self,
        partition: BucketKey,
        above: Decimal,
        direction: ScanDirection,
    ) -> Result<Option<TradeRecord>, StoreError> {
        self.inner.first_by_price(partition, above, direction).await
    }

    async fn put(&self, record: TradeRecord) -> Result<(), StoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        self.inner.put(record).await
    }
}

pub fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}
