//! Catalog domain module.
//!
//! Business rules for products and hierarchical categories, the paginated
//! query contract, and the storage port the backends implement. No IO happens
//! here beyond calls through the port.

pub mod category;
pub mod product;
pub mod query;
pub mod rules;
pub mod service;
pub mod store;
pub mod validation;

pub use category::{Category, CategoryChanges, NewCategory};
pub use product::{NewProduct, Product, ProductChanges};
pub use query::{
    CategoryFilter, CategorySort, Page, PageRequest, ProductFilter, ProductSort, ProductSortField,
    SortDirection,
};
pub use service::{CategoryService, ProductQuery, ProductService};
pub use store::{
    CatalogRecord, CategoryStore, ProductStore, Store, StoreError, StoreResult, UniqueKey,
    Visibility,
};
