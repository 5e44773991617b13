use crate::error::QuotagateError;
use axum::http::{HeaderMap, request::Parts};

/// Extract the bearer token from a header map, if any.
///
/// Returns `None` for a missing or non-Bearer authorization header and for
/// an empty token. This is the non-failing probe the rate limiter's skip
/// policy uses; rejecting the request is left to authentication.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

/// Extracts bearer token from request headers
pub struct TokenExtractor;

impl TokenExtractor {
    /// Extract token from Authorization header
    pub fn from_header(parts: &Parts) -> Result<String, QuotagateError> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| QuotagateError::unauthorized("Missing authorization header"))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(QuotagateError::unauthorized(
                "Invalid authorization header format. Expected: Bearer <token>",
            ));
        }

        let token = auth_header.trim_start_matches("Bearer ").to_string();

        if token.is_empty() {
            return Err(QuotagateError::unauthorized("Empty bearer token"));
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: &str) -> Parts {
        let req = Request::builder()
            .header("authorization", value)
            .body(())
            .unwrap();
        req.into_parts().0
    }

    #[test]
    fn test_extract_from_valid_bearer_header() {
        let parts = parts_with_auth("Bearer test_token_123");
        let token = TokenExtractor::from_header(&parts).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_missing_header() {
        let req = Request::builder().body(()).unwrap();
        let (parts, _) = req.into_parts();
        assert!(TokenExtractor::from_header(&parts).is_err());
    }

    #[test]
    fn test_extract_non_bearer_scheme() {
        let parts = parts_with_auth("Basic dXNlcjpwYXNz");
        assert!(TokenExtractor::from_header(&parts).is_err());
    }

    #[test]
    fn test_extract_empty_token() {
        let parts = parts_with_auth("Bearer ");
        assert!(TokenExtractor::from_header(&parts).is_err());
    }

    #[test]
    fn test_bearer_token_probe() {
        let parts = parts_with_auth("Bearer pk_123");
        assert_eq!(bearer_token(&parts.headers), Some("pk_123".to_string()));

        let parts = parts_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&parts.headers), None);

        let parts = parts_with_auth("Bearer ");
        assert_eq!(bearer_token(&parts.headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
