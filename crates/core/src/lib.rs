//! `catalog-core`: foundation building blocks shared by the catalog crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, SystemClock};
pub use entity::Entity;
pub use error::{CatalogError, CatalogResult, EntityKind};
pub use id::{CategoryId, ProductId};
