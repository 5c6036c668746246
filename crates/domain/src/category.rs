use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{CatalogResult, CategoryId, Entity, EntityKind};

use crate::query::{CategoryFilter, CategorySort};
use crate::store::{CatalogRecord, UniqueKey};
use crate::validation::{self, DESCRIPTION_MAX_LEN};

pub const DEFAULT_ORDERING: i32 = 0;

/// A persisted category. Categories form a forest through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub ordering: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl CatalogRecord for Category {
    const KIND: EntityKind = EntityKind::Category;

    type Filter = CategoryFilter;
    type Sort = CategorySort;

    fn matches(&self, filter: &CategoryFilter) -> bool {
        filter.matches(self)
    }

    fn compare(&self, other: &Self, sort: &CategorySort) -> Ordering {
        sort.compare(self, other)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::CategoryName {
            parent_id: self.parent_id.clone(),
            name: self.name.clone(),
        }]
    }
}

/// Creation candidate; `ordering` defaults to 0 and `is_active` to true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCategory {
    pub id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub ordering: Option<i32>,
    pub is_active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn under(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_ordering(mut self, ordering: i32) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = Some(false);
        self
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validation::require_name("name", &self.name)?;
        validation::optional_max_len(
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;
        validation::storable_timestamp("createdAt", self.created_at)
    }
}

/// Partial update: only `Some` fields overwrite the persisted category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub ordering: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryChanges {
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(name) = &self.name {
            validation::require_name("name", name)?;
        }
        validation::optional_max_len(
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::CatalogError;

    #[test]
    fn candidate_requires_a_name() {
        assert!(NewCategory::new("Accessories").validate().is_ok());
        assert!(matches!(
            NewCategory::new(" ").validate(),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn unique_key_carries_the_parent_scope() {
        let parent: CategoryId = "root-1".parse().unwrap();
        let at = Utc::now();
        let category = Category {
            id: "c-1".parse().unwrap(),
            name: "Phones".to_string(),
            description: None,
            parent_id: Some(parent.clone()),
            ordering: DEFAULT_ORDERING,
            is_active: true,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(
            category.unique_keys(),
            vec![UniqueKey::CategoryName {
                parent_id: Some(parent),
                name: "Phones".to_string()
            }]
        );
    }
}
