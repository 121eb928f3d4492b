//! Lettervault ETL library
//!
//! Lands the letters feed unmodified in a staging table, then transforms the
//! staged snapshot into a Data Vault 2.0 model (hubs, satellite, link) loaded
//! with concurrent bulk copies.

pub mod config;
pub mod copy;
pub mod db;
pub mod error;
pub mod model;
pub mod staging;
pub mod vault;

// Re-export commonly used types
pub use error::{EtlError, Result};
