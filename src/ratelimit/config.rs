use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::utils::get_env_with_prefix;

/// Rate limiting configuration for one guarded endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of requests allowed per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in milliseconds, anchored to the first counted
    /// request rather than to calendar boundaries
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Upper bound on one counter-table round trip, in milliseconds.
    /// A table slower than this is treated as unavailable and the
    /// request is allowed through (fail open).
    #[serde(default = "default_fail_open_timeout_ms")]
    pub fail_open_timeout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            fail_open_timeout_ms: default_fail_open_timeout_ms(),
        }
    }
}

impl RateLimitConfig {
    /// Create a new RateLimitConfig builder
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::new()
    }

    /// Quota of `max` requests per hour
    pub fn per_hour(max: u32) -> Self {
        Self {
            enabled: true,
            max_requests: max.max(1),
            window_ms: 60 * 60 * 1000,
            ..Default::default()
        }
    }

    /// Quota of `max` requests per 24 hours
    ///
    /// The shape used for public read-only API keys: a daily allowance
    /// anchored to the credential's first request of the window.
    pub fn per_day(max: u32) -> Self {
        Self {
            enabled: true,
            max_requests: max.max(1),
            window_ms: 24 * 60 * 60 * 1000,
            ..Default::default()
        }
    }

    /// The window length as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// The fail-open bound as a Duration
    pub fn fail_open_timeout(&self) -> Duration {
        Duration::from_millis(self.fail_open_timeout_ms)
    }

    /// Load rate limit configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = get_env_with_prefix("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.parse().unwrap_or(true);
        }

        if let Some(max_requests) = get_env_with_prefix("RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(val) = max_requests.parse::<u32>() {
                if val > 0 {
                    config.max_requests = val;
                }
            }
        }

        if let Some(window) = get_env_with_prefix("RATE_LIMIT_WINDOW_MS") {
            if let Ok(val) = window.parse::<u64>() {
                if val > 0 {
                    config.window_ms = val;
                }
            }
        }

        if let Some(timeout) = get_env_with_prefix("RATE_LIMIT_FAIL_OPEN_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                if val > 0 {
                    config.fail_open_timeout_ms = val;
                }
            }
        }

        config
    }
}

/// Builder for RateLimitConfig
#[must_use = "builder does nothing until you call build()"]
pub struct RateLimitConfigBuilder {
    config: RateLimitConfig,
}

impl RateLimitConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RateLimitConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn max_requests(mut self, max: u32) -> Self {
        self.config.max_requests = max.max(1);
        self
    }

    pub fn window_ms(mut self, ms: u64) -> Self {
        self.config.window_ms = ms.max(1);
        self
    }

    pub fn window(mut self, duration: Duration) -> Self {
        self.config.window_ms = (duration.as_millis() as u64).max(1);
        self
    }

    pub fn fail_open_timeout_ms(mut self, ms: u64) -> Self {
        self.config.fail_open_timeout_ms = ms.max(1);
        self
    }

    pub fn fail_open_timeout(mut self, duration: Duration) -> Self {
        self.config.fail_open_timeout_ms = (duration.as_millis() as u64).max(1);
        self
    }

    pub fn build(self) -> RateLimitConfig {
        self.config
    }
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    1000
}

fn default_window_ms() -> u64 {
    24 * 60 * 60 * 1000 // one day
}

fn default_fail_open_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_requests, 1000);
        assert_eq!(config.window_ms, 86_400_000);
        assert_eq!(config.fail_open_timeout_ms, 5_000);
    }

    #[test]
    fn test_per_hour_preset() {
        let config = RateLimitConfig::per_hour(100);
        assert!(config.enabled);
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_ms, 3_600_000);
    }

    #[test]
    fn test_per_day_preset() {
        let config = RateLimitConfig::per_day(1000);
        assert_eq!(config.max_requests, 1000);
        assert_eq!(config.window(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_builder() {
        let config = RateLimitConfig::builder()
            .enabled(true)
            .max_requests(2)
            .window_ms(1_000)
            .fail_open_timeout(Duration::from_millis(250))
            .build();

        assert!(config.enabled);
        assert_eq!(config.max_requests, 2);
        assert_eq!(config.window_ms, 1_000);
        assert_eq!(config.fail_open_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder_clamps_zero_values() {
        let config = RateLimitConfig::builder()
            .max_requests(0)
            .window_ms(0)
            .build();

        assert_eq!(config.max_requests, 1);
        assert_eq!(config.window_ms, 1);
    }
}
