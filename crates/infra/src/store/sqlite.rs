//! SQLite-backed catalog stores.
//!
//! Case-insensitive matching is done on shadow `*_key` columns holding the
//! text folded in Rust with [`fold_case`]. SQLite's own `lower()` only folds
//! ASCII, so it is never used; this keeps search, uniqueness and name ordering
//! identical to the in-memory backend.
//!
//! ## Representation
//!
//! | Field | Column type | Notes |
//! |-------|-------------|-------|
//! | ids | `TEXT` | compared bytewise (`BINARY` collation) |
//! | `price` | `TEXT` | exact decimal text |
//! | `price_key` | `TEXT` | fixed-width sortable form of `price`, ordered bytewise |
//! | timestamps | `INTEGER` | nanoseconds since the Unix epoch |
//! | `is_active` | `INTEGER` | `0` / `1` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database (unique violation) | `UniqueViolation` | a concurrent writer claimed a name or SKU |
//! | Database (other) | `Unavailable` | locked database, disk errors |
//! | PoolClosed / PoolTimedOut / Io | `Unavailable` | connection trouble |
//! | ColumnDecode / Decode / RowNotFound | `Corrupt` | unexpected stored data |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{FromRow, Row};
use tracing::instrument;

use catalog_core::{CategoryId, ProductId};
use catalog_domain::query::fold_case;
use catalog_domain::{
    CatalogRecord, Category, CategoryFilter, CategorySort, CategoryStore, PageRequest, Product,
    ProductFilter, ProductSort, ProductSortField, ProductStore, Store, StoreError, StoreResult,
    UniqueKey, Visibility,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL,
        sku TEXT,
        sku_key TEXT,
        description TEXT,
        description_key TEXT,
        price TEXT NOT NULL,
        price_key TEXT NOT NULL,
        currency TEXT NOT NULL,
        is_active INTEGER NOT NULL,
        category_id TEXT,
        image_url TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS products_name_key ON products (name_key)",
    // NULL skus never collide
    "CREATE UNIQUE INDEX IF NOT EXISTS products_sku_key ON products (sku_key)",
    "CREATE INDEX IF NOT EXISTS products_category ON products (category_id)",
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL,
        description TEXT,
        description_key TEXT,
        parent_id TEXT,
        ordering INTEGER NOT NULL,
        is_active INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    // ids are never blank, so '' stands for the root scope
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS categories_parent_name
        ON categories (COALESCE(parent_id, ''), name_key)
    "#,
    "CREATE INDEX IF NOT EXISTS categories_parent ON categories (parent_id)",
];

/// Create the catalog tables and indexes if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &SqlitePool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

const PRODUCT_COLUMNS: &str = "id, name, sku, description, price, currency, is_active, \
    category_id, image_url, created_at, updated_at";

const PRODUCT_FILTER: &str = r#"
    (?1 = 0 OR is_active = 1)
    AND (?2 IS NULL OR category_id = ?2)
    AND (
        ?3 IS NULL
        OR instr(name_key, ?3) > 0
        OR instr(COALESCE(sku_key, ''), ?3) > 0
        OR instr(COALESCE(description_key, ''), ?3) > 0
    )
"#;

const CATEGORY_COLUMNS: &str =
    "id, name, description, parent_id, ordering, is_active, created_at, updated_at";

const CATEGORY_FILTER: &str = r#"
    (?1 = 0 OR is_active = 1)
    AND (?2 IS NULL OR parent_id = ?2)
    AND (
        ?3 IS NULL
        OR instr(name_key, ?3) > 0
        OR instr(COALESCE(description_key, ''), ?3) > 0
    )
"#;

const CATEGORY_ORDER: &str = "ordering ASC, id ASC";

/// Products table.
///
/// `Send + Sync`; clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    /// Wrap a pool whose schema has been created with [`ensure_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Categories table.
#[derive(Debug, Clone)]
pub struct SqliteCategoryStore {
    pool: SqlitePool,
}

impl SqliteCategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn product_order(sort: &ProductSort) -> String {
    let direction = if sort.direction.is_ascending() { "ASC" } else { "DESC" };
    match sort.field {
        Some(ProductSortField::Name) => format!("name_key {direction}, id ASC"),
        Some(ProductSortField::Price) => format!("price_key {direction}, id ASC"),
        Some(ProductSortField::CreatedAt) => format!("created_at {direction}, id ASC"),
        None => "id ASC".to_string(),
    }
}

const PRICE_INT_DIGITS: usize = 29;
const PRICE_FRAC_DIGITS: usize = 28;

/// Fixed-width text whose bytewise order is the numeric order of `price`.
///
/// `P` prefixes non-negative values and `N` negative ones, whose digits are
/// nine's-complemented so larger magnitudes sort first. Every [`Decimal`] has
/// at most 29 integer and 28 fractional digits, so the padding never truncates.
fn price_key(price: Decimal) -> String {
    let magnitude = price.abs().to_string();
    let (int, frac) = magnitude.split_once('.').unwrap_or((magnitude.as_str(), ""));
    let digits = format!(
        "{int:0>iw$}{frac:0<fw$}",
        iw = PRICE_INT_DIGITS,
        fw = PRICE_FRAC_DIGITS
    );
    if price.is_sign_negative() && !price.is_zero() {
        let complement: String = digits.bytes().map(|b| char::from(b'0' + b'9' - b)).collect();
        format!("N{complement}")
    } else {
        format!("P{digits}")
    }
}

fn limit_offset(request: PageRequest) -> (i64, i64) {
    let limit = i64::from(request.size);
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn to_nanos(at: DateTime<Utc>) -> StoreResult<i64> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {at}")))
}

fn count_from(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl Store<Product> for SqliteProductStore {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn save(&self, product: Product) -> StoreResult<Product> {
        let created_at = to_nanos(product.created_at)?;
        let updated_at = to_nanos(product.updated_at)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, name_key, sku, sku_key, description, description_key,
                price, price_key, currency, is_active, category_id, image_url,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                name_key = excluded.name_key,
                sku = excluded.sku,
                sku_key = excluded.sku_key,
                description = excluded.description,
                description_key = excluded.description_key,
                price = excluded.price,
                price_key = excluded.price_key,
                currency = excluded.currency,
                is_active = excluded.is_active,
                category_id = excluded.category_id,
                image_url = excluded.image_url,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product.id.as_str())
        .bind(product.name.as_str())
        .bind(fold_case(&product.name))
        .bind(product.sku.as_deref())
        .bind(product.sku.as_deref().map(fold_case))
        .bind(product.description.as_deref())
        .bind(product.description.as_deref().map(fold_case))
        .bind(product.price.to_string())
        .bind(price_key(product.price))
        .bind(product.currency.as_str())
        .bind(product.is_active)
        .bind(product.category_id.as_ref().map(CategoryId::as_str))
        .bind(product.image_url.as_deref())
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("save_product", e, &product.unique_keys()))?;

        Ok(product)
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    async fn find_by_id(
        &self,
        id: &ProductId,
        visibility: Visibility,
    ) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        let product = row.map(|row| decode_product(&row)).transpose()?;
        Ok(product.filter(|p| visibility.admits(p)))
    }

    #[instrument(
        skip(self, filter, sort, request),
        fields(sort = ?sort, page = request.page, size = request.size),
        err
    )]
    async fn find_page(
        &self,
        filter: &ProductFilter,
        sort: &ProductSort,
        request: PageRequest,
    ) -> StoreResult<Vec<Product>> {
        let (limit, offset) = limit_offset(request);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {PRODUCT_FILTER} \
             ORDER BY {} LIMIT ?4 OFFSET ?5",
            product_order(sort)
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active_only)
            .bind(filter.category_id.as_ref().map(CategoryId::as_str))
            .bind(filter.search.as_ref().map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_products", e))?;

        rows.iter().map(decode_product).collect()
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}");
        let total: i64 = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.active_only)
            .bind(filter.category_id.as_ref().map(CategoryId::as_str))
            .bind(filter.search.as_ref().map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;
        Ok(count_from(total))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_by_id(&self, id: &ProductId) -> StoreResult<()> {
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    #[instrument(skip(self, name), err)]
    async fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        let found: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE name_key = ?1)",
        )
        .bind(fold_case(name))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("exists_by_name", e))?;
        Ok(found != 0)
    }

    #[instrument(skip(self, sku), err)]
    async fn exists_by_sku(&self, sku: &str) -> StoreResult<bool> {
        if sku.trim().is_empty() {
            return Ok(false);
        }
        let found: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE sku_key = ?1)",
        )
        .bind(fold_case(sku))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("exists_by_sku", e))?;
        Ok(found != 0)
    }
}

#[async_trait]
impl Store<Category> for SqliteCategoryStore {
    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn save(&self, category: Category) -> StoreResult<Category> {
        let created_at = to_nanos(category.created_at)?;
        let updated_at = to_nanos(category.updated_at)?;

        sqlx::query(
            r#"
            INSERT INTO categories (
                id, name, name_key, description, description_key,
                parent_id, ordering, is_active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                name_key = excluded.name_key,
                description = excluded.description,
                description_key = excluded.description_key,
                parent_id = excluded.parent_id,
                ordering = excluded.ordering,
                is_active = excluded.is_active,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(category.id.as_str())
        .bind(category.name.as_str())
        .bind(fold_case(&category.name))
        .bind(category.description.as_deref())
        .bind(category.description.as_deref().map(fold_case))
        .bind(category.parent_id.as_ref().map(CategoryId::as_str))
        .bind(category.ordering)
        .bind(category.is_active)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("save_category", e, &category.unique_keys()))?;

        Ok(category)
    }

    #[instrument(skip(self, id), fields(category_id = %id), err)]
    async fn find_by_id(
        &self,
        id: &CategoryId,
        visibility: Visibility,
    ) -> StoreResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_category", e))?;

        let category = row.map(|row| decode_category(&row)).transpose()?;
        Ok(category.filter(|c| visibility.admits(c)))
    }

    #[instrument(
        skip(self, filter, _sort, request),
        fields(page = request.page, size = request.size),
        err
    )]
    async fn find_page(
        &self,
        filter: &CategoryFilter,
        _sort: &CategorySort,
        request: PageRequest,
    ) -> StoreResult<Vec<Category>> {
        let (limit, offset) = limit_offset(request);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE {CATEGORY_FILTER} \
             ORDER BY {CATEGORY_ORDER} LIMIT ?4 OFFSET ?5"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active_only)
            .bind(filter.parent_id.as_ref().map(CategoryId::as_str))
            .bind(filter.search.as_ref().map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_categories", e))?;

        rows.iter().map(decode_category).collect()
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&self, filter: &CategoryFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM categories WHERE {CATEGORY_FILTER}");
        let total: i64 = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.active_only)
            .bind(filter.parent_id.as_ref().map(CategoryId::as_str))
            .bind(filter.search.as_ref().map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_categories", e))?;
        Ok(count_from(total))
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_by_id(&self, id: &CategoryId) -> StoreResult<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for SqliteCategoryStore {
    #[instrument(skip(self, name, parent_id), err)]
    async fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<&CategoryId>,
    ) -> StoreResult<bool> {
        let found: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE name_key = ?1 AND parent_id IS ?2)",
        )
        .bind(fold_case(name))
        .bind(parent_id.map(CategoryId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("exists_by_name_and_parent", e))?;
        Ok(found != 0)
    }

    #[instrument(skip(self, parent_id), fields(parent_id = %parent_id), err)]
    async fn find_children(&self, parent_id: &CategoryId) -> StoreResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id = ?1 \
             ORDER BY {CATEGORY_ORDER}"
        );
        let rows = sqlx::query(&sql)
            .bind(parent_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_children", e))?;

        rows.iter().map(decode_category).collect()
    }
}

/// Map a failed insert/upsert, resolving unique violations to the key the
/// record was trying to claim.
fn map_write_error(operation: &str, err: sqlx::Error, keys: &[UniqueKey]) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(key) = violated_key(db_err.message(), keys) {
                return StoreError::UniqueViolation(key);
            }
        }
    }
    map_sqlx_error(operation, err)
}

/// SQLite reports `UNIQUE constraint failed: products.name_key` for column
/// indexes and `... index 'categories_parent_name'` for expression indexes.
fn violated_key(message: &str, keys: &[UniqueKey]) -> Option<UniqueKey> {
    keys.iter()
        .find(|key| match key {
            UniqueKey::ProductName(_) => message.contains("products.name_key"),
            UniqueKey::ProductSku(_) => message.contains("products.sku_key"),
            UniqueKey::CategoryName { .. } => message.contains("categories_parent_name"),
        })
        .cloned()
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Corrupt(format!("unexpected row not found in {operation}"))
        }
        err @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Corrupt(format!("failed to decode row in {operation}: {err}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: String,
    name: String,
    sku: Option<String>,
    description: Option<String>,
    price: String,
    currency: String,
    is_active: bool,
    category_id: Option<String>,
    image_url: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl<'r> FromRow<'r, SqliteRow> for ProductRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            is_active: row.try_get("is_active")?,
            category_id: row.try_get("category_id")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |e: catalog_core::CatalogError| StoreError::Corrupt(e.to_string());
        Ok(Product {
            id: ProductId::try_from(row.id).map_err(corrupt)?,
            name: row.name,
            sku: row.sku,
            description: row.description,
            price: Decimal::from_str(&row.price)
                .map_err(|e| StoreError::Corrupt(format!("invalid price {:?}: {e}", row.price)))?,
            currency: row.currency,
            is_active: row.is_active,
            category_id: row
                .category_id
                .map(CategoryId::try_from)
                .transpose()
                .map_err(corrupt)?,
            image_url: row.image_url,
            created_at: DateTime::from_timestamp_nanos(row.created_at),
            updated_at: DateTime::from_timestamp_nanos(row.updated_at),
        })
    }
}

fn decode_product(row: &SqliteRow) -> StoreResult<Product> {
    let row = ProductRow::from_row(row).map_err(|e| map_sqlx_error("decode_product", e))?;
    Product::try_from(row)
}

#[derive(Debug)]
struct CategoryRow {
    id: String,
    name: String,
    description: Option<String>,
    parent_id: Option<String>,
    ordering: i32,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl<'r> FromRow<'r, SqliteRow> for CategoryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            parent_id: row.try_get("parent_id")?,
            ordering: row.try_get("ordering")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let corrupt = |e: catalog_core::CatalogError| StoreError::Corrupt(e.to_string());
        Ok(Category {
            id: CategoryId::try_from(row.id).map_err(corrupt)?,
            name: row.name,
            description: row.description,
            parent_id: row.parent_id.map(CategoryId::try_from).transpose().map_err(corrupt)?,
            ordering: row.ordering,
            is_active: row.is_active,
            created_at: DateTime::from_timestamp_nanos(row.created_at),
            updated_at: DateTime::from_timestamp_nanos(row.updated_at),
        })
    }
}

fn decode_category(row: &SqliteRow) -> StoreResult<Category> {
    let row = CategoryRow::from_row(row).map_err(|e| map_sqlx_error("decode_category", e))?;
    Category::try_from(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_domain::SortDirection;

    #[test]
    fn product_order_always_ends_with_id() {
        let fields = [ProductSortField::Name, ProductSortField::Price, ProductSortField::CreatedAt];
        for field in fields {
            let order = product_order(&ProductSort::by(field, SortDirection::Desc));
            assert!(order.ends_with("id ASC"), "{order}");
            assert!(order.contains("DESC"), "{order}");
        }
        assert_eq!(product_order(&ProductSort::natural()), "id ASC");
    }

    #[test]
    fn violated_key_is_resolved_from_the_message() {
        let keys = vec![
            UniqueKey::ProductName("Widget".to_string()),
            UniqueKey::ProductSku("W-1".to_string()),
        ];
        assert_eq!(
            violated_key("UNIQUE constraint failed: products.sku_key", &keys),
            Some(UniqueKey::ProductSku("W-1".to_string()))
        );
        assert_eq!(
            violated_key("UNIQUE constraint failed: products.name_key", &keys),
            Some(UniqueKey::ProductName("Widget".to_string()))
        );
        assert_eq!(violated_key("UNIQUE constraint failed: products.id", &keys), None);

        let scoped = vec![UniqueKey::CategoryName {
            parent_id: None,
            name: "Phones".to_string(),
        }];
        let message = "UNIQUE constraint failed: index 'categories_parent_name'";
        assert!(violated_key(message, &scoped).is_some());
    }

    #[test]
    fn price_keys_sort_like_decimals() {
        let prices = [
            "-12.5",
            "-1.00000000000000001",
            "-1",
            "0",
            "0.0000000000000000000000000001",
            "1",
            "1.00000000000000001",
            "1.5",
            "9.99",
            "10",
            "79228162514264337593543950335",
        ]
        .map(|p| Decimal::from_str(p).unwrap());

        let keys: Vec<String> = prices.iter().copied().map(price_key).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        assert!(keys.iter().all(|k| k.len() == 1 + PRICE_INT_DIGITS + PRICE_FRAC_DIGITS));
    }

    #[test]
    fn price_keys_ignore_scale_and_signed_zero() {
        let key = |p: &str| price_key(Decimal::from_str(p).unwrap());
        assert_eq!(key("1.5"), key("1.50"));
        assert_eq!(key("0"), key("-0.00"));
        assert_eq!(key("12.50"), key("12.5000"));
    }

    #[test]
    fn huge_offsets_saturate() {
        let (limit, offset) = limit_offset(PageRequest::new(u32::MAX, u32::MAX));
        assert_eq!(limit, i64::from(u32::MAX));
        assert!(offset > 0);
    }
}
