//! Persistence Adapters
//!
//! Implementations of `TradeStorePort`.

pub mod in_memory;
pub mod sql;

pub use in_memory::InMemoryTradeStore;
pub use sql::SqlTradeStore;
