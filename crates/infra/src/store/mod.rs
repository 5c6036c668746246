//! Catalog storage backends.
//!
//! Both backends implement the storage port from `catalog_domain::store` and
//! must be observably identical for the same sequence of operations: same
//! conflicts, same page contents, same ordering.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::{InMemoryCategoryStore, InMemoryProductStore, InMemoryStore};
pub use sqlite::{ensure_schema, SqliteCategoryStore, SqliteProductStore};
