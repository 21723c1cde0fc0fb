//! HTTP Controller (Driver Adapter)
//!
//! Axum routes that delegate to the ingestion and query use cases.
//!
//! | Route       | Methods | Behaviour                                   |
//! |-------------|---------|---------------------------------------------|
//! | `/health`   | any     | 200, empty body                             |
//! | `/view`     | GET     | current OHLC snapshot as JSON               |
//! | `/endpoint` | POST    | signed webhook delivery of trade ticks      |
//! | `/metrics`  | GET     | Prometheus exposition                       |

use std::sync::Arc;
use std::time::Instant;

use axum::{
    BoxError, Json, Router,
    body::Bytes,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS},
    },
    response::IntoResponse,
    routing::{MethodRouter, any, get},
};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::cors::{AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::application::ports::{Clock, TradeStorePort};
use crate::application::use_cases::{IngestTradesUseCase, QueryOhlcUseCase};
use crate::domain::bucket::TimeBucketer;
use crate::domain::ohlc::OhlcSnapshot;
use crate::infrastructure::config::{AllowedOrigins, ServerSettings};
use crate::infrastructure::feed::{Delivery, SIGNATURE_HEADER, SignatureVerifier, decode_delivery};
use crate::infrastructure::metrics::{
    WebhookOutcome, get_metrics_handle, record_query, record_ticks, record_webhook,
};

/// Application state shared across handlers.
pub struct AppState<S>
where
    S: TradeStorePort,
{
    /// Use case for writing webhook batches.
    pub ingest_trades: Arc<IngestTradesUseCase<S>>,
    /// Use case for the OHLC view.
    pub query_ohlc: Arc<QueryOhlcUseCase<S>>,
    /// Webhook signature verifier.
    pub verifier: Arc<SignatureVerifier>,
}

impl<S> AppState<S>
where
    S: TradeStorePort,
{
    /// Wire both use cases to one store and clock.
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        bucketer: TimeBucketer,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            ingest_trades: Arc::new(IngestTradesUseCase::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                bucketer,
            )),
            query_ohlc: Arc::new(QueryOhlcUseCase::new(store, clock, bucketer)),
            verifier: Arc::new(verifier),
        }
    }
}

impl<S> Clone for AppState<S>
where
    S: TradeStorePort,
{
    fn clone(&self) -> Self {
        Self {
            ingest_trades: Arc::clone(&self.ingest_trades),
            query_ohlc: Arc::clone(&self.query_ohlc),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<S>(state: AppState<S>, settings: &ServerSettings) -> Router
where
    S: TradeStorePort + 'static,
{
    Router::new()
        .route(
            "/health",
            guarded(any(health_check), settings, AllowMethods::any(), "*"),
        )
        .route(
            "/view",
            guarded(
                any(view::<S>),
                settings,
                AllowMethods::list([Method::GET, Method::OPTIONS]),
                "GET,OPTIONS",
            ),
        )
        .route(
            "/endpoint",
            guarded(
                any(ingest::<S>),
                settings,
                AllowMethods::list([Method::POST, Method::OPTIONS]),
                "POST,OPTIONS",
            ),
        )
        .route(
            "/metrics",
            guarded(
                get(metrics_handler),
                settings,
                AllowMethods::list([Method::GET, Method::OPTIONS]),
                "GET,OPTIONS",
            ),
        )
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Route middleware, outermost first: allow-headers and allow-methods on
/// every response, CORS, then the request timeout.
fn guarded<T>(
    route: MethodRouter<T>,
    settings: &ServerSettings,
    methods: AllowMethods,
    advertised: &'static str,
) -> MethodRouter<T>
where
    T: Clone + Send + Sync + 'static,
{
    route.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(advertised),
            ))
            .layer(cors_layer(&settings.allowed_origins, methods))
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(settings.request_timeout)),
    )
}

fn cors_layer(origins: &AllowedOrigins, methods: AllowMethods) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(Any)
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

/// Liveness check; accepts any method and logs what it was sent.
async fn health_check(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    tracing::info!(
        method = %method,
        path = %uri.path(),
        headers = ?headers,
        body_bytes = body.len(),
        "Health check"
    );
    tracing::debug!(body = %String::from_utf8_lossy(&body), "Health check body");
    StatusCode::OK
}

/// Current window's OHLC snapshot.
async fn view<S>(
    State(state): State<AppState<S>>,
    method: Method,
) -> Result<Json<OhlcSnapshot>, ApiError>
where
    S: TradeStorePort,
{
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }

    let started = Instant::now();
    let result = state.query_ohlc.execute().await;
    record_query(result.is_ok(), started.elapsed());

    Ok(Json(result?))
}

/// Signed webhook delivery of trade ticks.
async fn ingest<S>(
    State(state): State<AppState<S>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError>
where
    S: TradeStorePort,
{
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = state.verifier.verify(signature, &body) {
        record_webhook(WebhookOutcome::Unauthorized);
        return Err(e.into());
    }

    let ticks = match decode_delivery(&body) {
        Ok(Delivery::Batch(ticks)) => ticks,
        Ok(Delivery::Ignored { event }) => {
            tracing::debug!(event = ?event, "Ignoring non-trade delivery");
            record_webhook(WebhookOutcome::Ignored);
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting malformed delivery");
            record_webhook(WebhookOutcome::Invalid);
            return Err(e.into());
        }
    };

    match state.ingest_trades.execute(ticks).await {
        Ok(summary) => {
            record_ticks(summary.written, summary.skipped);
            record_webhook(WebhookOutcome::Processed);
        }
        Err(aborted) => {
            tracing::error!(
                error = %aborted.source,
                written = aborted.written,
                remaining = aborted.remaining,
                "Trade batch aborted"
            );
            record_ticks(aborted.written, aborted.skipped);
            record_webhook(WebhookOutcome::Aborted);
        }
    }

    Ok(StatusCode::OK)
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}
