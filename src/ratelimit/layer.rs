//! Rate limiting layer backed by a shared counter table
//!
//! Wraps an endpoint's routes with the guard: requests bearing a
//! credential are charged against the shared fixed-window counter, denials
//! get a structured 429, and every guarded response carries the
//! `ratelimit-*` headers with the reset timestamp recomputed at write
//! time. A slow or failing counter table never blocks traffic.

use super::config::RateLimitConfig;
use super::guard::{Decision, RateLimitGuard};
use crate::auth::bearer_token;
use crate::table::CounterTable;
use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};

/// Tower layer for rate limiting one logical endpoint
#[derive(Clone)]
pub struct RateLimitLayer {
    guard: Arc<RateLimitGuard>,
}

impl RateLimitLayer {
    pub fn new(
        endpoint: impl Into<String>,
        config: RateLimitConfig,
        table: Arc<dyn CounterTable>,
    ) -> Self {
        Self {
            guard: Arc::new(RateLimitGuard::new(endpoint, config, table)),
        }
    }

    /// Build a layer around an existing guard.
    pub fn from_guard(guard: Arc<RateLimitGuard>) -> Self {
        Self { guard }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            guard: self.guard.clone(),
        }
    }
}

/// Tower service for rate limiting
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    guard: Arc<RateLimitGuard>,
}

impl<S> Service<Request> for RateLimitService<S>
where
    S: Service<Request> + Clone + Send + Sync + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let guard = self.guard.clone();
        let mut svc = self.inner.clone();

        // Skip path: no credential means no counting; authentication
        // downstream owns the rejection, and no headers are emitted.
        let token = bearer_token(req.headers());
        let Some(token) = token else {
            return Box::pin(async move {
                let response = svc.call(req).await?;
                Ok(response.into_response())
            });
        };

        Box::pin(async move {
            let decision = guard.check(Some(&token)).await;

            match decision {
                Decision::Allow { .. } => {
                    let response = svc.call(req).await?;
                    let mut response = response.into_response();
                    // Headers are written after the handler ran, so the
                    // reset value reflects the clock at send time.
                    guard.headers(&decision).apply(response.headers_mut());
                    Ok(response)
                }
                Decision::Deny { .. } => {
                    let body = guard.exceeded_body(&decision);
                    let mut response =
                        (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                    guard.headers(&decision).apply(response.headers_mut());
                    Ok(response)
                }
            }
        })
    }
}

/// Build a rate limit layer for an endpoint from a RateLimitConfig
///
/// Returns None if rate limiting is disabled.
pub fn build_rate_limit_layer(
    endpoint: impl Into<String>,
    config: &RateLimitConfig,
    table: Arc<dyn CounterTable>,
) -> Option<RateLimitLayer> {
    if !config.enabled {
        return None;
    }

    Some(RateLimitLayer::new(endpoint, config.clone(), table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::InMemoryTable;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig::builder()
            .enabled(true)
            .max_requests(5)
            .window_ms(60_000)
            .build()
    }

    #[test]
    fn test_disabled_config_builds_no_layer() {
        let config = RateLimitConfig::builder().enabled(false).build();
        let layer = build_rate_limit_layer("test", &config, Arc::new(InMemoryTable::new()));
        assert!(layer.is_none());
    }

    #[test]
    fn test_enabled_config_builds_layer() {
        let layer = build_rate_limit_layer("test", &test_config(), Arc::new(InMemoryTable::new()));
        assert!(layer.is_some());
    }

    #[tokio::test]
    async fn test_layer_shares_one_guard_across_services() {
        let layer = RateLimitLayer::new("test", test_config(), Arc::new(InMemoryTable::new()));

        // Two layered services must consult the same counters
        let a = layer.guard.clone();
        let b = layer.guard.clone();
        assert!(Arc::ptr_eq(&a, &b));

        for _ in 0..5 {
            assert!(a.check(Some("pk_123")).await.is_allow());
        }
        assert!(!b.check(Some("pk_123")).await.is_allow());
    }
}
