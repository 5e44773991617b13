//! Per-request rate limit decisions.
//!
//! The guard derives the counter key, charges the request against the
//! shared counter store under a fail-open timeout, and synthesizes the
//! response headers and 429 body. Nothing on the store path may surface
//! as a request failure: the worst outcome of a degraded store is that
//! the quota is temporarily not enforced.

use super::config::RateLimitConfig;
use super::key::counter_key;
use super::policy::exempt;
use super::store::{CounterSnapshot, WindowedCounterStore};
use crate::table::CounterTable;
use crate::utils::time::{ceil_to_secs, epoch_ms};
use axum::http::{HeaderMap, HeaderValue};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Total-limit response header.
pub const HEADER_LIMIT: &str = "ratelimit-limit";
/// Remaining-count response header.
pub const HEADER_REMAINING: &str = "ratelimit-remaining";
/// Reset-time response header, Unix seconds.
pub const HEADER_RESET: &str = "ratelimit-reset";

/// Outcome of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow {
        /// Requests left in the window, floored at 0.
        remaining: u64,
        /// Window end, Unix seconds.
        reset_at_secs: u64,
    },
    Deny {
        /// Window end, Unix seconds.
        reset_at_secs: u64,
        /// The configured per-window maximum.
        limit: u32,
    },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    pub fn reset_at_secs(&self) -> u64 {
        match self {
            Decision::Allow { reset_at_secs, .. } | Decision::Deny { reset_at_secs, .. } => {
                *reset_at_secs
            }
        }
    }
}

/// Structured 429 body returned on denial.
#[derive(Debug, Serialize)]
pub struct RateLimitExceeded {
    pub error: String,
    /// Window end, Unix seconds.
    pub reset: u64,
    /// The configured per-window maximum.
    pub limit: u32,
    #[serde(rename = "windowMs")]
    pub window_ms: u64,
}

/// Response header values for a guarded request.
///
/// `apply` recomputes the reset timestamp from the wall clock at the
/// moment headers are written, so a slow handler cannot leave a stale
/// deadline in the response.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u64,
    pub window_ms: u64,
}

impl RateLimitHeaders {
    pub fn apply(&self, headers: &mut HeaderMap) {
        let reset = ceil_to_secs(epoch_ms() + self.window_ms);

        headers.insert(HEADER_LIMIT, header_value(self.limit.to_string()));
        headers.insert(HEADER_REMAINING, header_value(self.remaining.to_string()));
        headers.insert(HEADER_RESET, header_value(reset.to_string()));
    }
}

fn header_value(value: String) -> HeaderValue {
    // Decimal integers are always valid header values
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// Guard for one logical endpoint.
///
/// Cheap to clone; clones share the same counter store.
#[derive(Clone)]
pub struct RateLimitGuard {
    endpoint: String,
    config: RateLimitConfig,
    store: WindowedCounterStore,
}

impl RateLimitGuard {
    pub fn new(
        endpoint: impl Into<String>,
        config: RateLimitConfig,
        table: Arc<dyn CounterTable>,
    ) -> Self {
        let store = WindowedCounterStore::new(table, config.window());
        Self {
            endpoint: endpoint.into(),
            config,
            store,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// The underlying counter store, for rollback paths that refund a
    /// charged request.
    pub fn store(&self) -> &WindowedCounterStore {
        &self.store
    }

    /// Charge one request against the credential's window and decide.
    ///
    /// Exempt requests (no credential) are allowed unconditionally; the
    /// authentication layer downstream owns their rejection. The counter
    /// round trip is bounded by the configured fail-open timeout; on
    /// timeout the slow call is abandoned (it may still land and count)
    /// and the request is allowed through.
    pub async fn check(&self, credential: Option<&str>) -> Decision {
        let max = u64::from(self.config.max_requests);

        if exempt(credential) {
            debug!(endpoint = %self.endpoint, "No credential present, skipping rate limit");
            return Decision::Allow {
                remaining: max,
                reset_at_secs: self.reset_at_secs_from_now(),
            };
        }

        let credential = credential.unwrap_or_default();
        let key = counter_key(&self.endpoint, credential);

        let snapshot = match tokio::time::timeout(
            self.config.fail_open_timeout(),
            self.store.increment(&key),
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(_) => {
                error!(
                    endpoint = %self.endpoint,
                    timeout_ms = self.config.fail_open_timeout_ms,
                    "Counter store timed out, failing open"
                );
                CounterSnapshot {
                    total_hits: 1,
                    reset_at_ms: epoch_ms() + self.config.window_ms,
                }
            }
        };

        // Recomputed from the wall clock rather than trusted verbatim from
        // the store, so skewed or stale store values never reach headers.
        let reset_at_secs = self.reset_at_secs_from_now();

        if snapshot.total_hits > max {
            debug!(
                endpoint = %self.endpoint,
                hits = snapshot.total_hits,
                limit = self.config.max_requests,
                "Rate limit exceeded"
            );
            Decision::Deny {
                reset_at_secs,
                limit: self.config.max_requests,
            }
        } else {
            Decision::Allow {
                remaining: max - snapshot.total_hits,
                reset_at_secs,
            }
        }
    }

    /// Header values for a decision; remaining is 0 on denial.
    pub fn headers(&self, decision: &Decision) -> RateLimitHeaders {
        let remaining = match decision {
            Decision::Allow { remaining, .. } => *remaining,
            Decision::Deny { .. } => 0,
        };
        RateLimitHeaders {
            limit: self.config.max_requests,
            remaining,
            window_ms: self.config.window_ms,
        }
    }

    /// The 429 body for a denial.
    pub fn exceeded_body(&self, decision: &Decision) -> RateLimitExceeded {
        RateLimitExceeded {
            error: "Too many requests, please try again later.".to_string(),
            reset: decision.reset_at_secs(),
            limit: self.config.max_requests,
            window_ms: self.config.window_ms,
        }
    }

    fn reset_at_secs_from_now(&self) -> u64 {
        ceil_to_secs(epoch_ms() + self.config.window_ms)
    }
}
