use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ratelimit::RateLimitConfig;
use crate::utils::get_env_with_prefix;

/// Main configuration for a quotagate deployment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub limits: EndpointLimits,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            config.json = json.parse().unwrap_or(false);
        }

        config
    }
}

/// Per-endpoint rate limit quotas.
///
/// Static configuration mapping a logical endpoint name to its window and
/// maximum; the application wires each entry into a layer on the matching
/// routes. Endpoints without an entry are not rate limited.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EndpointLimits {
    limits: HashMap<String, RateLimitConfig>,
}

impl EndpointLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quota for an endpoint, replacing any existing entry.
    pub fn with_limit(mut self, endpoint: impl Into<String>, config: RateLimitConfig) -> Self {
        self.limits.insert(endpoint.into(), config);
        self
    }

    /// The quota configured for an endpoint, if any.
    pub fn limit_for(&self, endpoint: &str) -> Option<&RateLimitConfig> {
        self.limits.get(endpoint)
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Iterate over (endpoint, quota) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RateLimitConfig)> {
        self.limits.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.limits.is_empty());
    }

    #[test]
    fn test_endpoint_limits() {
        let limits = EndpointLimits::new()
            .with_limit("preservation", RateLimitConfig::per_day(1000))
            .with_limit("uploads", RateLimitConfig::per_hour(100));

        assert_eq!(limits.len(), 2);
        assert_eq!(limits.limit_for("preservation").unwrap().max_requests, 1000);
        assert_eq!(limits.limit_for("uploads").unwrap().window_ms, 3_600_000);
        assert!(limits.limit_for("unknown").is_none());
    }

    #[test]
    fn test_limits_deserialize_from_table() {
        let json = r#"{
            "preservation": { "max_requests": 1000, "window_ms": 86400000 }
        }"#;
        let limits: EndpointLimits = serde_json::from_str(json).unwrap();

        let quota = limits.limit_for("preservation").unwrap();
        assert!(quota.enabled);
        assert_eq!(quota.max_requests, 1000);
        assert_eq!(quota.window_ms, 86_400_000);
    }
}
