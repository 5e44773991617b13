//! Exemption policy: which requests bypass the limiter entirely.

/// Whether a request is exempt from rate limiting.
///
/// A request with no extractable credential is never counted; it is left
/// for the authentication layer to reject as unauthorized rather than
/// consuming quota here. Everything else is subject to limiting.
pub fn exempt(credential: Option<&str>) -> bool {
    match credential {
        Some(token) => token.is_empty(),
        None => true,
    }
}
