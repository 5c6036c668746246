//! Catalog error model.

use thiserror::Error;

use crate::id::CategoryId;

/// Result type used across the catalog.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// The kind of catalog entity an error refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Category,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntityKind::Product => f.write_str("product"),
            EntityKind::Category => f.write_str("category"),
        }
    }
}

/// Catalog-level error.
///
/// Every variant carries structured data only (the offending id or value).
/// Mapping to transport status codes and user-facing messages is left to the
/// boundary layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A candidate or change-set violated a domain bound (length, sign, format).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist or is hidden by the lookup policy.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Another product already uses this name (case-insensitive).
    #[error("product name already exists: {0}")]
    NameConflict(String),

    /// Another product already uses this SKU (case-insensitive).
    #[error("sku already exists: {0}")]
    SkuConflict(String),

    /// Another category in the same parent scope already uses this name.
    #[error("category name already exists in scope: {name}")]
    CategoryNameConflict {
        name: String,
        parent_id: Option<CategoryId>,
    },

    /// A category activation or parent rule was violated.
    #[error("invalid hierarchy state: {0}")]
    InvalidHierarchyState(String),

    /// The storage backend failed; surfaced unchanged, never retried here.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: EntityKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn hierarchy(msg: impl Into<String>) -> Self {
        Self::InvalidHierarchyState(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }
}
