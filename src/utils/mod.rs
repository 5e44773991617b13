//! Utility functions and helpers.
//!
//! Common utilities for environment variable handling and wall-clock time.

pub mod env;
pub mod time;

pub use env::get_env_with_prefix;
