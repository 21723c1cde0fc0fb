//! Data Transfer Objects
//!
//! Loosely typed inputs crossing into the application layer.

mod trade_tick_dto;

pub use trade_tick_dto::TradeTickDto;
