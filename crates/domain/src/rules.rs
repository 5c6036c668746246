//! Uniqueness and hierarchy rules.
//!
//! Every check here runs before the service mutates anything, so a rejected
//! operation never leaves a partial write behind. Uniqueness checks are
//! advisory under concurrent writers; the backends enforce the same keys on
//! `save` and report violations as the same conflict kinds.

use std::collections::HashSet;

use catalog_core::{CatalogError, CatalogResult, CategoryId, EntityKind};

use crate::category::Category;
use crate::store::{CategoryStore, ProductStore, Store, Visibility};
use crate::validation::is_blank;

/// Blank names are left to required-field validation.
pub async fn ensure_unique_product_name<S>(store: &S, name: &str) -> CatalogResult<()>
where
    S: ProductStore + ?Sized,
{
    if is_blank(name) {
        return Ok(());
    }
    if store.exists_by_name(name).await? {
        return Err(CatalogError::NameConflict(name.to_string()));
    }
    Ok(())
}

/// The SKU rule applies only when a SKU is provided.
pub async fn ensure_unique_sku<S>(store: &S, sku: Option<&str>) -> CatalogResult<()>
where
    S: ProductStore + ?Sized,
{
    let Some(sku) = sku.filter(|s| !is_blank(s)) else {
        return Ok(());
    };
    if store.exists_by_sku(sku).await? {
        return Err(CatalogError::SkuConflict(sku.to_string()));
    }
    Ok(())
}

pub async fn ensure_unique_category_name<S>(
    store: &S,
    name: &str,
    parent_id: Option<&CategoryId>,
) -> CatalogResult<()>
where
    S: CategoryStore + ?Sized,
{
    if is_blank(name) {
        return Ok(());
    }
    if store.exists_by_name_and_parent(name, parent_id).await? {
        return Err(CatalogError::CategoryNameConflict {
            name: name.to_string(),
            parent_id: parent_id.cloned(),
        });
    }
    Ok(())
}

/// An active category cannot sit under an inactive parent.
pub fn validate_category_activation(
    category: &Category,
    parent: Option<&Category>,
) -> CatalogResult<()> {
    match parent {
        Some(parent) if category.is_active && !parent.is_active => {
            Err(CatalogError::hierarchy(format!(
                "category '{}' cannot be active under inactive parent {}",
                category.name, parent.id
            )))
        }
        _ => Ok(()),
    }
}

/// Load the persisted parent in any active state.
pub async fn load_parent<S>(store: &S, parent_id: &CategoryId) -> CatalogResult<Category>
where
    S: CategoryStore + ?Sized,
{
    store
        .find_by_id(parent_id, Visibility::All)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Category, parent_id))
}

/// Reject a parent assignment that would make `category_id` its own ancestor.
///
/// Walks the persisted ancestor chain from `new_parent_id` upwards. The walk
/// ends at a root, at a dangling reference, or at an ancestor seen before.
pub async fn ensure_acyclic<S>(
    store: &S,
    category_id: &CategoryId,
    new_parent_id: &CategoryId,
) -> CatalogResult<()>
where
    S: CategoryStore + ?Sized,
{
    let mut seen = HashSet::new();
    let mut cursor = Some(new_parent_id.clone());

    while let Some(current) = cursor {
        if &current == category_id {
            return Err(CatalogError::hierarchy(format!(
                "category {category_id} cannot be moved under its own descendant {new_parent_id}"
            )));
        }
        if !seen.insert(current.clone()) {
            break;
        }
        cursor = store
            .find_by_id(&current, Visibility::All)
            .await?
            .and_then(|ancestor| ancestor.parent_id);
    }
    Ok(())
}
