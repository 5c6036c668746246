use std::sync::Arc;

use tracing::{debug, instrument};

use catalog_core::{
    CatalogError, CatalogResult, CategoryId, Clock, EntityKind, ProductId, SystemClock,
};

use crate::product::{NewProduct, Product, ProductChanges};
use crate::query::{self, fold_case, Page, PageRequest, ProductFilter, ProductSort};
use crate::rules;
use crate::store::{ProductStore, Store, Visibility};
use crate::validation::non_blank;

use super::{next_updated_at, write_error};

/// Combined listing request: paging, optional search text, optional category,
/// and ordering. Results are always restricted to active products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: PageRequest,
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub sort: ProductSort,
}

impl ProductQuery {
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn sorted_by(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    fn filter(&self) -> ProductFilter {
        ProductFilter::active()
            .with_search(self.search.as_deref())
            .in_category(self.category_id.clone())
    }
}

/// Product use-cases: `Active ⇄ Inactive` lifecycle, unique name and SKU.
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> ProductService<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, candidate), fields(name = %candidate.name), err)]
    pub async fn create(&self, candidate: NewProduct) -> CatalogResult<Product> {
        candidate.validate()?;
        let sku = non_blank(candidate.sku);

        rules::ensure_unique_product_name(&self.store, &candidate.name).await?;
        rules::ensure_unique_sku(&self.store, sku.as_deref()).await?;

        let id = match candidate.id {
            Some(id) => {
                if self.store.find_by_id(&id, Visibility::All).await?.is_some() {
                    return Err(CatalogError::validation(format!(
                        "product id already exists: {id}"
                    )));
                }
                id
            }
            None => ProductId::generate(),
        };
        let created_at = candidate.created_at.unwrap_or_else(|| self.clock.now());

        let product = Product {
            id,
            name: candidate.name,
            sku,
            description: candidate.description,
            price: candidate.price,
            currency: candidate.currency,
            is_active: candidate.is_active.unwrap_or(true),
            category_id: candidate.category_id,
            image_url: candidate.image_url,
            created_at,
            updated_at: created_at,
        };

        let saved = self.store.save(product).await.map_err(write_error)?;
        debug!(product_id = %saved.id, "product created");
        Ok(saved)
    }

    /// Apply a change-set. Inactive products can be updated (and reactivated);
    /// uniqueness is re-checked only for fields whose value actually changes.
    #[instrument(skip(self, changes), fields(product_id = %id), err)]
    pub async fn update(&self, id: &ProductId, changes: ProductChanges) -> CatalogResult<Product> {
        changes.validate()?;
        let mut current = self.load(id, Visibility::All).await?;

        if let Some(name) = changes.name {
            if name != current.name {
                // a case-only rename keeps the same unique key
                if fold_case(&name) != fold_case(&current.name) {
                    rules::ensure_unique_product_name(&self.store, &name).await?;
                }
                current.name = name;
            }
        }

        if let Some(sku) = changes.sku {
            let sku = non_blank(Some(sku));
            if sku != current.sku {
                let same_key = matches!(
                    (&sku, &current.sku),
                    (Some(new), Some(old)) if fold_case(new) == fold_case(old)
                );
                if !same_key {
                    rules::ensure_unique_sku(&self.store, sku.as_deref()).await?;
                }
                current.sku = sku;
            }
        }

        if let Some(description) = changes.description {
            current.description = Some(description);
        }
        if let Some(price) = changes.price {
            current.price = price;
        }
        if let Some(currency) = changes.currency {
            current.currency = currency;
        }
        if let Some(is_active) = changes.is_active {
            current.is_active = is_active;
        }
        if let Some(category_id) = changes.category_id {
            current.category_id = Some(category_id);
        }
        if let Some(image_url) = changes.image_url {
            current.image_url = Some(image_url);
        }
        current.updated_at = next_updated_at(self.clock.now(), current.updated_at);

        self.store.save(current).await.map_err(write_error)
    }

    /// Active-only lookup: an inactive product is reported as not found.
    pub async fn get_by_id(&self, id: &ProductId) -> CatalogResult<Product> {
        self.load(id, Visibility::ActiveOnly).await
    }

    pub async fn find(&self, query: &ProductQuery) -> CatalogResult<Page<Product>> {
        query::fetch_page(&self.store, &query.filter(), &query.sort, query.page).await
    }

    pub async fn list(&self, page: PageRequest, sort: ProductSort) -> CatalogResult<Page<Product>> {
        self.find(&ProductQuery::new(page).sorted_by(sort)).await
    }

    /// Blank `text` behaves like [`ProductService::list`].
    pub async fn search(
        &self,
        text: &str,
        page: PageRequest,
        sort: ProductSort,
    ) -> CatalogResult<Page<Product>> {
        self.find(&ProductQuery::new(page).with_search(text).sorted_by(sort))
            .await
    }

    pub async fn list_by_category(
        &self,
        category_id: &CategoryId,
        page: PageRequest,
        sort: ProductSort,
    ) -> CatalogResult<Page<Product>> {
        self.find(
            &ProductQuery::new(page)
                .in_category(category_id.clone())
                .sorted_by(sort),
        )
        .await
    }

    pub async fn search_by_category(
        &self,
        category_id: &CategoryId,
        text: &str,
        page: PageRequest,
        sort: ProductSort,
    ) -> CatalogResult<Page<Product>> {
        self.find(
            &ProductQuery::new(page)
                .in_category(category_id.clone())
                .with_search(text)
                .sorted_by(sort),
        )
        .await
    }

    pub async fn count(&self) -> CatalogResult<u64> {
        Ok(self.store.count(&ProductFilter::active()).await?)
    }

    pub async fn count_by_category(&self, category_id: &CategoryId) -> CatalogResult<u64> {
        let filter = ProductFilter::active().in_category(Some(category_id.clone()));
        Ok(self.store.count(&filter).await?)
    }

    /// Soft delete.
    pub async fn deactivate(&self, id: &ProductId) -> CatalogResult<Product> {
        let changes = ProductChanges {
            is_active: Some(false),
            ..ProductChanges::default()
        };
        self.update(id, changes).await
    }

    /// Administrative hard delete. Idempotent; regular lifecycle code should
    /// use [`ProductService::deactivate`].
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn purge(&self, id: &ProductId) -> CatalogResult<()> {
        self.store.delete_by_id(id).await?;
        debug!("product purged");
        Ok(())
    }

    async fn load(&self, id: &ProductId, visibility: Visibility) -> CatalogResult<Product> {
        self.store
            .find_by_id(id, visibility)
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Product, id))
    }
}
