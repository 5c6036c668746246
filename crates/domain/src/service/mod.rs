//! Catalog services: orchestrate rule checks, storage and queries.
//!
//! Services hold no entity state between calls; each mutation reloads the
//! persisted entity, runs every rule check, and only then writes the whole
//! resulting entity back.

pub mod categories;
pub mod products;

pub use categories::CategoryService;
pub use products::{ProductQuery, ProductService};

use chrono::{DateTime, Utc};
use tracing::warn;

use catalog_core::CatalogError;

use crate::store::StoreError;

/// Map a failed `save`.
///
/// A unique violation here means a concurrent writer claimed the key between
/// the rule check and the write.
fn write_error(err: StoreError) -> CatalogError {
    if let StoreError::UniqueViolation(key) = &err {
        warn!(?key, "backend unique constraint rejected write after rule check");
    }
    err.into()
}

/// `updated_at` never moves backwards, even if the clock does.
fn next_updated_at(now: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous)
}
