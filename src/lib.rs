//! Quotagate - distributed rate limiting middleware for Axum
//!
//! Quotagate enforces a per-credential, fixed-window request quota shared
//! across any number of stateless API processes. All coordination happens
//! through a counter table (in-memory for a single process, Redis for a
//! fleet); the middleware charges each credentialed request against the
//! table, answers over-quota requests with a structured 429, and emits
//! `ratelimit-*` response headers. When the counter table is slow or
//! unavailable the middleware fails open: quota enforcement degrades, the
//! protected endpoint does not.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use quotagate::{RateLimitConfig, RateLimitLayer};
//! use quotagate::table::InMemoryTable;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     quotagate::init_tracing();
//!
//!     let table = Arc::new(InMemoryTable::new());
//!     let layer = RateLimitLayer::new(
//!         "preservation",
//!         RateLimitConfig::per_day(1000),
//!         table,
//!     );
//!
//!     let app: Router = Router::new()
//!         .route("/api/v1/preservation/check", get(|| async { "ok" }))
//!         .layer(layer);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod auth;
mod config;
mod error;
pub mod ratelimit;
pub mod table;
pub mod utils;

// Re-exports for public API
pub use config::{Config, EndpointLimits, LoggingConfig};
pub use error::{QuotagateError, Result};
pub use ratelimit::{
    build_rate_limit_layer, counter_key, CounterSnapshot, Decision, RateLimitConfig,
    RateLimitConfigBuilder, RateLimitGuard, RateLimitHeaders, RateLimitLayer,
    WindowedCounterStore,
};
pub use table::{CounterRecord, CounterTable, InMemoryTable};

#[cfg(feature = "table-redis")]
pub use table::RedisTable;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before building the router.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "quotagate=debug")
/// - `QUOTAGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("QUOTAGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
