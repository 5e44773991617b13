//! Counter key derivation.

/// Derive the counter key for a credential on a logical endpoint.
///
/// The key is stable for the life of the credential and cannot collide
/// across endpoints because the endpoint name is part of the key.
pub fn counter_key(endpoint: &str, credential: &str) -> String {
    format!("rate-limit:{}:{}", endpoint, credential)
}
