//! Domain types
//!
//! - Newtypes for remote identifiers and normalized logical paths
//! - The process-local path cache
//! - Domain-specific error types

pub mod cache;
pub mod errors;
pub mod newtypes;

pub use cache::PathCache;
pub use errors::DomainError;
pub use newtypes::*;
