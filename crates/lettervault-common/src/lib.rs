//! Lettervault Common Library
//!
//! Shared utilities for the lettervault workspace members:
//!
//! - **Keys**: deterministic business-key digests for the vault layer
//! - **Logging**: tracing subscriber setup shared by every binary

pub mod keys;
pub mod logging;

pub use keys::hash_business_key;
