/// Get environment variable with QUOTAGATE_ prefix, falling back to unprefixed version
///
/// This helper function checks for `QUOTAGATE_{key}` first, then falls back to `{key}`
/// for compatibility with standard environment variable naming.
///
/// # Examples
///
/// ```rust
/// use quotagate::utils::get_env_with_prefix;
///
/// // Checks QUOTAGATE_RATE_LIMIT_MAX_REQUESTS first, then RATE_LIMIT_MAX_REQUESTS
/// let max = get_env_with_prefix("RATE_LIMIT_MAX_REQUESTS");
///
/// // Checks QUOTAGATE_LOG_LEVEL first, then LOG_LEVEL
/// let level = get_env_with_prefix("LOG_LEVEL");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("QUOTAGATE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        // Test with QUOTAGATE_ prefix
        unsafe {
            std::env::set_var("QUOTAGATE_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("QUOTAGATE_TEST_VAR");
        }

        // Test with unprefixed fallback
        unsafe {
            std::env::set_var("FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("FALLBACK_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("FALLBACK_VAR");
        }

        // Test non-existent variable
        assert_eq!(get_env_with_prefix("NON_EXISTENT_VAR"), None);
    }
}
