//! Configuration Module
//!
//! Configuration loading for the service.

mod settings;

pub use settings::{AllowedOrigins, ConfigError, ServerSettings, ServiceConfig, StoreSettings};
