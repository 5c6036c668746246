//! Backend selection: one place that turns configuration into store handles.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use tracing::info;

use catalog_core::Clock;
use catalog_domain::{CategoryService, CategoryStore, ProductService, ProductStore};

use crate::config::{CatalogConfig, StoreBackend};
use crate::db;
use crate::store::{
    InMemoryCategoryStore, InMemoryProductStore, SqliteCategoryStore, SqliteProductStore,
};

pub type DynProductStore = Arc<dyn ProductStore>;
pub type DynCategoryStore = Arc<dyn CategoryStore>;

/// Product and category stores of the same backend.
#[derive(Clone)]
pub struct CatalogBackend {
    pub products: DynProductStore,
    pub categories: DynCategoryStore,
}

impl core::fmt::Debug for CatalogBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogBackend").finish_non_exhaustive()
    }
}

impl CatalogBackend {
    pub async fn open(config: &CatalogConfig) -> anyhow::Result<Self> {
        match config.backend {
            StoreBackend::Memory => {
                info!("using in-memory catalog store");
                Ok(Self::in_memory())
            }
            StoreBackend::Sqlite => {
                let pool = db::connect_sqlite(config).await?;
                Ok(Self::sqlite(pool))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(InMemoryProductStore::new()),
            categories: Arc::new(InMemoryCategoryStore::new()),
        }
    }

    /// Stores over a pool whose schema already exists.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            products: Arc::new(SqliteProductStore::new(pool.clone())),
            categories: Arc::new(SqliteCategoryStore::new(pool)),
        }
    }

    pub fn product_service(&self) -> ProductService<DynProductStore> {
        ProductService::new(Arc::clone(&self.products))
    }

    pub fn category_service(&self) -> CategoryService<DynCategoryStore> {
        CategoryService::new(Arc::clone(&self.categories))
    }

    pub fn product_service_with_clock(
        &self,
        clock: Arc<dyn Clock>,
    ) -> ProductService<DynProductStore> {
        ProductService::with_clock(Arc::clone(&self.products), clock)
    }

    pub fn category_service_with_clock(
        &self,
        clock: Arc<dyn Clock>,
    ) -> CategoryService<DynCategoryStore> {
        CategoryService::with_clock(Arc::clone(&self.categories), clock)
    }
}
