//! Credential extraction.
//!
//! Resolving a bearer token into a credential identity is an external
//! collaborator's job; this module only pulls the raw token out of the
//! request so the limiter can key on it or skip uncredentialed requests.

pub mod token;

pub use token::{bearer_token, TokenExtractor};
