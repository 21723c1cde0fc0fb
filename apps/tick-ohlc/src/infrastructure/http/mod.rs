//! HTTP Driver Adapter
//!
//! Router, handlers, error mapping and server lifecycle.

mod controller;
mod error;
mod server;

pub use controller::{AppState, create_router};
pub use error::ApiError;
pub use server::{HttpServer, HttpServerError};
