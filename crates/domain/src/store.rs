//! Storage port: the capability contract every catalog backend implements.
//!
//! The port makes no storage assumptions. It works with the in-memory
//! concurrent map used in tests/dev and with relational tables; both must honor
//! the query contract defined in [`crate::query`].

use core::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::{CatalogError, CategoryId, Entity, EntityKind};

use crate::category::Category;
use crate::product::Product;
use crate::query::{fold_case, PageRequest};

/// A value that must be unique across stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    ProductName(String),
    ProductSku(String),
    CategoryName {
        parent_id: Option<CategoryId>,
        name: String,
    },
}

impl UniqueKey {
    /// Whether two keys claim the same slot (case-insensitive).
    pub fn collides_with(&self, other: &UniqueKey) -> bool {
        match (self, other) {
            (UniqueKey::ProductName(a), UniqueKey::ProductName(b))
            | (UniqueKey::ProductSku(a), UniqueKey::ProductSku(b)) => fold_case(a) == fold_case(b),
            (
                UniqueKey::CategoryName {
                    parent_id: pa,
                    name: a,
                },
                UniqueKey::CategoryName {
                    parent_id: pb,
                    name: b,
                },
            ) => pa == pb && fold_case(a) == fold_case(b),
            _ => false,
        }
    }
}

impl From<UniqueKey> for CatalogError {
    fn from(key: UniqueKey) -> Self {
        match key {
            UniqueKey::ProductName(name) => CatalogError::NameConflict(name),
            UniqueKey::ProductSku(sku) => CatalogError::SkuConflict(sku),
            UniqueKey::CategoryName { parent_id, name } => {
                CatalogError::CategoryNameConflict { name, parent_id }
            }
        }
    }
}

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; the one
/// exception is [`StoreError::UniqueViolation`], which is the backend's own
/// enforcement of a uniqueness invariant and maps to the matching conflict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored record could not be decoded: {0}")]
    Corrupt(String),

    #[error("unique constraint violated: {0:?}")]
    UniqueViolation(UniqueKey),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(key) => key.into(),
            StoreError::Unavailable(msg) => CatalogError::StorageUnavailable(msg),
            StoreError::Corrupt(msg) => CatalogError::StorageUnavailable(msg),
        }
    }
}

/// Lookup policy for [`Store::find_by_id`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Inactive records are reported as absent.
    ActiveOnly,
    All,
}

impl Visibility {
    pub fn admits<E: Entity>(self, entity: &E) -> bool {
        match self {
            Visibility::ActiveOnly => entity.is_active(),
            Visibility::All => true,
        }
    }
}

/// An entity kind the storage port can persist and query.
pub trait CatalogRecord: Entity + Clone + Send + Sync + core::fmt::Debug + 'static {
    const KIND: EntityKind;

    type Filter: Send + Sync + core::fmt::Debug;
    type Sort: Send + Sync + core::fmt::Debug;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn compare(&self, other: &Self, sort: &Self::Sort) -> Ordering;

    /// Keys this record occupies in the backend's unique indexes.
    fn unique_keys(&self) -> Vec<UniqueKey>;
}

/// Persistence and paged retrieval of one entity kind.
#[async_trait]
pub trait Store<E: CatalogRecord>: Send + Sync {
    /// Insert or overwrite by identity; returns the persisted value.
    async fn save(&self, entity: E) -> StoreResult<E>;

    async fn find_by_id(&self, id: &E::Id, visibility: Visibility) -> StoreResult<Option<E>>;

    /// At most `request.size` records from `request.offset()`, ordered by `sort`.
    async fn find_page(
        &self,
        filter: &E::Filter,
        sort: &E::Sort,
        request: PageRequest,
    ) -> StoreResult<Vec<E>>;

    /// Total records matching `filter`, independent of paging.
    async fn count(&self, filter: &E::Filter) -> StoreResult<u64>;

    /// Hard remove. Removing an absent id is not an error.
    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<()>;
}

#[async_trait]
pub trait ProductStore: Store<Product> {
    /// Case-insensitive, active and inactive products alike.
    async fn exists_by_name(&self, name: &str) -> StoreResult<bool>;

    /// Case-insensitive; `false` for blank input.
    async fn exists_by_sku(&self, sku: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait CategoryStore: Store<Category> {
    /// Case-insensitive name match within the scope of `parent_id`
    /// (`None` is the root scope).
    async fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<&CategoryId>,
    ) -> StoreResult<bool>;

    /// All direct children of `parent_id` regardless of active state,
    /// ordered by `ordering` then id.
    async fn find_children(&self, parent_id: &CategoryId) -> StoreResult<Vec<Category>>;
}

#[async_trait]
impl<E, S> Store<E> for Arc<S>
where
    E: CatalogRecord,
    S: Store<E> + ?Sized,
{
    async fn save(&self, entity: E) -> StoreResult<E> {
        (**self).save(entity).await
    }

    async fn find_by_id(&self, id: &E::Id, visibility: Visibility) -> StoreResult<Option<E>> {
        (**self).find_by_id(id, visibility).await
    }

    async fn find_page(
        &self,
        filter: &E::Filter,
        sort: &E::Sort,
        request: PageRequest,
    ) -> StoreResult<Vec<E>> {
        (**self).find_page(filter, sort, request).await
    }

    async fn count(&self, filter: &E::Filter) -> StoreResult<u64> {
        (**self).count(filter).await
    }

    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<()> {
        (**self).delete_by_id(id).await
    }
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        (**self).exists_by_name(name).await
    }

    async fn exists_by_sku(&self, sku: &str) -> StoreResult<bool> {
        (**self).exists_by_sku(sku).await
    }
}

#[async_trait]
impl<S> CategoryStore for Arc<S>
where
    S: CategoryStore + ?Sized,
{
    async fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<&CategoryId>,
    ) -> StoreResult<bool> {
        (**self).exists_by_name_and_parent(name, parent_id).await
    }

    async fn find_children(&self, parent_id: &CategoryId) -> StoreResult<Vec<Category>> {
        (**self).find_children(parent_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keys_collide_case_insensitively() {
        let a = UniqueKey::ProductName("Widget".to_string());
        let b = UniqueKey::ProductName("wIDGET".to_string());
        assert!(a.collides_with(&b));
        assert!(!a.collides_with(&UniqueKey::ProductSku("widget".to_string())));
    }

    #[test]
    fn category_keys_are_scoped_by_parent() {
        let parent: CategoryId = "parent".parse().unwrap();
        let root = UniqueKey::CategoryName {
            parent_id: None,
            name: "Phones".to_string(),
        };
        let nested = UniqueKey::CategoryName {
            parent_id: Some(parent.clone()),
            name: "phones".to_string(),
        };
        let nested_again = UniqueKey::CategoryName {
            parent_id: Some(parent),
            name: "PHONES".to_string(),
        };
        assert!(!root.collides_with(&nested));
        assert!(nested.collides_with(&nested_again));
    }

    #[test]
    fn unique_violations_map_to_conflicts() {
        let violation = StoreError::UniqueViolation(UniqueKey::ProductSku("W-1".into()));
        let err: CatalogError = violation.into();
        assert_eq!(err, CatalogError::SkuConflict("W-1".to_string()));

        let err: CatalogError = StoreError::Unavailable("pool closed".into()).into();
        assert!(matches!(err, CatalogError::StorageUnavailable(_)));
    }
}
