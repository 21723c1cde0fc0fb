//! Application Ports (Driven)
//!
//! Ports define the interfaces the use cases need from the outside world.
//! Infrastructure adapters implement them.
//!
//! - `TradeStorePort`: partitioned trade store with a price index
//! - `Clock`: wall-clock time

mod clock_port;
mod trade_store_port;

pub use clock_port::{Clock, FixedClock, SystemClock};
pub use trade_store_port::{ScanDirection, StoreError, TradeStorePort};

#[cfg(test)]
pub use trade_store_port::MockTradeStorePort;
