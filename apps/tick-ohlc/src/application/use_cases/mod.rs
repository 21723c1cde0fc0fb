//! Application Use Cases
//!
//! - `IngestTradesUseCase`: write path, one put per valid tick
//! - `QueryOhlcUseCase`: read path, four concurrent index reads

mod ingest_trades;
mod query_ohlc;

pub use ingest_trades::{BatchAborted, IngestTradesUseCase, WriteSummary};
pub use query_ohlc::{QueryError, QueryOhlcUseCase};
