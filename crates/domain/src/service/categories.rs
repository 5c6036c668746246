use std::sync::Arc;

use tracing::{debug, instrument};

use catalog_core::{CatalogError, CatalogResult, CategoryId, Clock, EntityKind, SystemClock};

use crate::category::{Category, CategoryChanges, DEFAULT_ORDERING, NewCategory};
use crate::query::{self, fold_case, CategoryFilter, CategorySort, Page, PageRequest};
use crate::rules;
use crate::store::{CategoryStore, Store, Visibility};

use super::{next_updated_at, write_error};

/// Category use-cases: names unique per parent scope, ordered listing,
/// activation and acyclicity checked against persisted parents.
#[derive(Debug, Clone)]
pub struct CategoryService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> CategoryService<S>
where
    S: CategoryStore,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, candidate), fields(name = %candidate.name), err)]
    pub async fn create(&self, candidate: NewCategory) -> CatalogResult<Category> {
        candidate.validate()?;
        let scope = candidate.parent_id.as_ref();
        rules::ensure_unique_category_name(&self.store, &candidate.name, scope).await?;

        let parent = match &candidate.parent_id {
            Some(parent_id) => Some(rules::load_parent(&self.store, parent_id).await?),
            None => None,
        };

        let id = match candidate.id {
            Some(id) => {
                if self.store.find_by_id(&id, Visibility::All).await?.is_some() {
                    return Err(CatalogError::validation(format!(
                        "category id already exists: {id}"
                    )));
                }
                id
            }
            None => CategoryId::generate(),
        };
        let ordering = candidate.ordering.unwrap_or_else(|| {
            debug!("ordering not provided; defaulting to {DEFAULT_ORDERING}");
            DEFAULT_ORDERING
        });
        let created_at = candidate.created_at.unwrap_or_else(|| self.clock.now());

        let category = Category {
            id,
            name: candidate.name,
            description: candidate.description,
            parent_id: candidate.parent_id,
            ordering,
            is_active: candidate.is_active.unwrap_or(true),
            created_at,
            updated_at: created_at,
        };
        rules::validate_category_activation(&category, parent.as_ref())?;

        let saved = self.store.save(category).await.map_err(write_error)?;
        debug!(category_id = %saved.id, "category created");
        Ok(saved)
    }

    /// Apply a change-set.
    ///
    /// A name or parent change re-checks uniqueness in the effective (new or
    /// current) parent scope. A parent change must not create a cycle. Any
    /// write whose result is active is checked against the persisted parent,
    /// so an active child of an inactive parent only accepts deactivation.
    #[instrument(skip(self, changes), fields(category_id = %id), err)]
    pub async fn update(
        &self,
        id: &CategoryId,
        changes: CategoryChanges,
    ) -> CatalogResult<Category> {
        changes.validate()?;
        let mut current = self.load(id).await?;

        let parent_changed = changes
            .parent_id
            .as_ref()
            .is_some_and(|parent_id| current.parent_id.as_ref() != Some(parent_id));
        let effective_parent = changes.parent_id.clone().or_else(|| current.parent_id.clone());
        let effective_name = changes.name.clone().unwrap_or_else(|| current.name.clone());
        let name_key_changed = fold_case(&effective_name) != fold_case(&current.name);

        if parent_changed || name_key_changed {
            let scope = effective_parent.as_ref();
            rules::ensure_unique_category_name(&self.store, &effective_name, scope).await?;
        }

        let mut new_parent = None;
        if parent_changed {
            if let Some(parent_id) = &effective_parent {
                rules::ensure_acyclic(&self.store, &current.id, parent_id).await?;
                new_parent = Some(rules::load_parent(&self.store, parent_id).await?);
            }
        }

        current.name = effective_name;
        current.parent_id = effective_parent;
        if let Some(description) = changes.description {
            current.description = Some(description);
        }
        if let Some(ordering) = changes.ordering {
            current.ordering = ordering;
        }
        if let Some(is_active) = changes.is_active {
            current.is_active = is_active;
        }

        if current.is_active {
            let parent = match (new_parent, &current.parent_id) {
                (Some(parent), _) => Some(parent),
                (None, Some(parent_id)) => Some(rules::load_parent(&self.store, parent_id).await?),
                (None, None) => None,
            };
            rules::validate_category_activation(&current, parent.as_ref())?;
        }
        current.updated_at = next_updated_at(self.clock.now(), current.updated_at);

        self.store.save(current).await.map_err(write_error)
    }

    /// Lookup in any active state.
    pub async fn get_by_id(&self, id: &CategoryId) -> CatalogResult<Category> {
        self.load(id).await
    }

    /// Active categories, `ordering` ascending.
    pub async fn list(&self, page: PageRequest) -> CatalogResult<Page<Category>> {
        query::fetch_page(&self.store, &CategoryFilter::active(), &CategorySort, page).await
    }

    /// Active categories whose name or description contains `text`.
    pub async fn search(&self, text: &str, page: PageRequest) -> CatalogResult<Page<Category>> {
        let filter = CategoryFilter::active().with_search(Some(text));
        query::fetch_page(&self.store, &filter, &CategorySort, page).await
    }

    pub async fn count(&self) -> CatalogResult<u64> {
        Ok(self.store.count(&CategoryFilter::active()).await?)
    }

    /// Direct children in any active state, whatever the parent's own state.
    pub async fn get_children(&self, parent_id: &CategoryId) -> CatalogResult<Vec<Category>> {
        Ok(self.store.find_children(parent_id).await?)
    }

    /// Soft delete. Children keep their own state.
    pub async fn deactivate(&self, id: &CategoryId) -> CatalogResult<Category> {
        let changes = CategoryChanges {
            is_active: Some(false),
            ..CategoryChanges::default()
        };
        self.update(id, changes).await
    }

    async fn load(&self, id: &CategoryId) -> CatalogResult<Category> {
        self.store
            .find_by_id(id, Visibility::All)
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Category, id))
    }
}
