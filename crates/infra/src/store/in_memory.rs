use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use catalog_core::{CategoryId, Entity};
use catalog_domain::query::{fold_case, paginate};
use catalog_domain::{
    CatalogRecord, Category, CategorySort, CategoryStore, PageRequest, Product, ProductStore, Store,
    StoreError, StoreResult, Visibility,
};

/// In-memory store for one entity kind.
///
/// Safe for concurrent readers and writers. Unique keys are re-validated under
/// the write lock on every `save`, so two racing creates with the same name
/// cannot both land.
#[derive(Debug)]
pub struct InMemoryStore<E: CatalogRecord> {
    records: RwLock<HashMap<E::Id, E>>,
}

pub type InMemoryProductStore = InMemoryStore<Product>;
pub type InMemoryCategoryStore = InMemoryStore<Category>;

impl<E: CatalogRecord> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl<E: CatalogRecord> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: CatalogRecord> Store<E> for InMemoryStore<E> {
    async fn save(&self, entity: E) -> StoreResult<E> {
        let keys = entity.unique_keys();
        let mut records = self.write()?;

        for other in records.values().filter(|other| other.id() != entity.id()) {
            for taken in other.unique_keys() {
                if let Some(key) = keys.iter().find(|key| key.collides_with(&taken)) {
                    return Err(StoreError::UniqueViolation(key.clone()));
                }
            }
        }

        records.insert(entity.id().clone(), entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: &E::Id, visibility: Visibility) -> StoreResult<Option<E>> {
        let records = self.read()?;
        Ok(records
            .get(id)
            .filter(|entity| visibility.admits(*entity))
            .cloned())
    }

    async fn find_page(
        &self,
        filter: &E::Filter,
        sort: &E::Sort,
        request: PageRequest,
    ) -> StoreResult<Vec<E>> {
        let matching: Vec<E> = {
            let records = self.read()?;
            records
                .values()
                .filter(|entity| entity.matches(filter))
                .cloned()
                .collect()
        };
        Ok(paginate(matching, |a, b| a.compare(b, sort), request))
    }

    async fn count(&self, filter: &E::Filter) -> StoreResult<u64> {
        let records = self.read()?;
        Ok(records.values().filter(|entity| entity.matches(filter)).count() as u64)
    }

    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<()> {
        self.write()?.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore<Product> {
    async fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        let key = fold_case(name);
        let records = self.read()?;
        Ok(records.values().any(|p| fold_case(&p.name) == key))
    }

    async fn exists_by_sku(&self, sku: &str) -> StoreResult<bool> {
        if sku.trim().is_empty() {
            return Ok(false);
        }
        let key = fold_case(sku);
        let records = self.read()?;
        Ok(records
            .values()
            .any(|p| p.sku.as_deref().is_some_and(|s| fold_case(s) == key)))
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore<Category> {
    async fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<&CategoryId>,
    ) -> StoreResult<bool> {
        let key = fold_case(name);
        let records = self.read()?;
        Ok(records
            .values()
            .any(|c| c.parent_id.as_ref() == parent_id && fold_case(&c.name) == key))
    }

    async fn find_children(&self, parent_id: &CategoryId) -> StoreResult<Vec<Category>> {
        let mut children: Vec<Category> = {
            let records = self.read()?;
            records
                .values()
                .filter(|c| c.parent_id.as_ref() == Some(parent_id))
                .cloned()
                .collect()
        };
        children.sort_by(|a, b| CategorySort.compare(a, b));
        Ok(children)
    }
}
