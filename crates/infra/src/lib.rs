//! Infrastructure layer: storage backends, database wiring and configuration.

pub mod backend;
pub mod config;
pub mod db;
pub mod store;

pub use backend::{CatalogBackend, DynCategoryStore, DynProductStore};
pub use config::{CatalogConfig, StoreBackend};
