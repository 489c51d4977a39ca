//! Configuration module for windconf
//!
//! Provides the recognized-options schema, validation with defaulting, and
//! config file loading.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
