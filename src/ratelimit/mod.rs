//! Distributed rate limiting middleware.
//!
//! Enforces a per-credential fixed-window quota shared across stateless API
//! processes through a common counter table, failing open when the table is
//! slow or unavailable.

mod config;
mod guard;
mod key;
mod layer;
mod policy;
mod store;

pub use config::{RateLimitConfig, RateLimitConfigBuilder};
pub use guard::{Decision, RateLimitGuard, RateLimitHeaders};
pub use key::counter_key;
pub use layer::{build_rate_limit_layer, RateLimitLayer, RateLimitService};
pub use policy::exempt;
pub use store::{CounterSnapshot, WindowedCounterStore};
