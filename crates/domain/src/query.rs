//! Query engine: pagination, search, filtering and sorting.
//!
//! The types here are the single definition of the listing contract. Every
//! storage backend either evaluates them directly (`matches`, `compare`,
//! [`paginate`]) or renders them into native queries that must order and
//! filter exactly the same way:
//!
//! - text matching is a case-insensitive substring test on [`fold_case`]d text;
//! - ties (and natural order) are broken by id ascending, bytewise;
//! - `name` sorts on the folded name, bytewise;
//! - `price` sorts numerically, `createdAt` chronologically.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use catalog_core::{CatalogResult, CategoryId, Entity};

use crate::category::Category;
use crate::product::Product;
use crate::store::{CatalogRecord, Store};

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Canonical case folding for uniqueness keys and search.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Zero-based page index plus page size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Index of the first item of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// `ceil(total_items / max(size, 1))`.
pub fn total_pages(total_items: u64, size: u32) -> u64 {
    total_items.div_ceil(u64::from(size.max(1)))
}

/// One page of results plus totals for the whole filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_pages(total_items, request.size),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` (any case) is descending; every other value is ascending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Asc
    }
}

/// Product fields that can drive ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductSortField {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl ProductSortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(ProductSortField::Name),
            "price" => Some(ProductSortField::Price),
            "createdAt" | "created_at" => Some(ProductSortField::CreatedAt),
            _ => None,
        }
    }
}

/// Product ordering. `field == None` means natural order (id ascending).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProductSort {
    pub field: Option<ProductSortField>,
    pub direction: SortDirection,
}

impl Default for ProductSort {
    /// Latest first.
    fn default() -> Self {
        Self::by(ProductSortField::CreatedAt, SortDirection::Desc)
    }
}

impl ProductSort {
    pub fn by(field: ProductSortField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    pub fn natural() -> Self {
        Self {
            field: None,
            direction: SortDirection::Asc,
        }
    }

    /// Parse `"field"`, `"field,dir"` or `"field:dir"`.
    ///
    /// Absent or blank input yields the default (`createdAt` descending). A
    /// missing direction is descending. Unknown fields fall back to natural
    /// order instead of failing.
    pub fn parse(spec: Option<&str>) -> Self {
        let Some(spec) = spec.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };

        let mut parts = if spec.contains(',') {
            spec.splitn(2, ',')
        } else {
            spec.splitn(2, ':')
        };
        let field = parts.next().unwrap_or_default();
        let direction = parts
            .next()
            .map(SortDirection::parse)
            .unwrap_or(SortDirection::Desc);

        match ProductSortField::parse(field) {
            Some(field) => Self::by(field, direction),
            None => Self::natural(),
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let primary = match self.field {
            Some(ProductSortField::Name) => fold_case(&a.name).cmp(&fold_case(&b.name)),
            Some(ProductSortField::Price) => a.price.cmp(&b.price),
            Some(ProductSortField::CreatedAt) => a.created_at.cmp(&b.created_at),
            None => Ordering::Equal,
        };
        self.direction
            .apply(primary)
            .then_with(|| a.id().cmp(b.id()))
    }
}

/// Category ordering is fixed: `ordering` ascending, then id.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CategorySort;

impl CategorySort {
    pub fn compare(&self, a: &Category, b: &Category) -> Ordering {
        a.ordering
            .cmp(&b.ordering)
            .then_with(|| a.id().cmp(b.id()))
    }
}

/// Folded, non-blank search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText(String);

impl SearchText {
    /// `None` for blank input (search mode stays off).
    pub fn new(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            None
        } else {
            Some(Self(fold_case(query)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, haystack: &str) -> bool {
        fold_case(haystack).contains(&self.0)
    }

    fn matches_opt(&self, haystack: Option<&str>) -> bool {
        haystack.is_some_and(|h| self.matches(h))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub active_only: bool,
    pub search: Option<SearchText>,
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    /// Default visibility for listings: active products only.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, query: Option<&str>) -> Self {
        self.search = query.and_then(SearchText::new);
        self
    }

    pub fn in_category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.is_active {
            return false;
        }
        if let Some(category_id) = &self.category_id {
            if product.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }
        match &self.search {
            Some(search) => {
                search.matches(&product.name)
                    || search.matches_opt(product.sku.as_deref())
                    || search.matches_opt(product.description.as_deref())
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub active_only: bool,
    pub search: Option<SearchText>,
    pub parent_id: Option<CategoryId>,
}

impl CategoryFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    /// Direct children of `parent_id`, any active state.
    pub fn children_of(parent_id: CategoryId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, query: Option<&str>) -> Self {
        self.search = query.and_then(SearchText::new);
        self
    }

    pub fn matches(&self, category: &Category) -> bool {
        if self.active_only && !category.is_active {
            return false;
        }
        if let Some(parent_id) = &self.parent_id {
            if category.parent_id.as_ref() != Some(parent_id) {
                return false;
            }
        }
        match &self.search {
            Some(search) => {
                search.matches(&category.name)
                    || search.matches_opt(category.description.as_deref())
            }
            None => true,
        }
    }
}

/// Sort-then-slice for backends without native paging.
///
/// `items` must already be filtered. An offset past the end yields an empty
/// page.
pub fn paginate<T>(
    mut items: Vec<T>,
    compare: impl FnMut(&T, &T) -> Ordering,
    request: PageRequest,
) -> Vec<T> {
    items.sort_by(compare);
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    if offset >= items.len() {
        return Vec::new();
    }
    items
        .into_iter()
        .skip(offset)
        .take(request.size as usize)
        .collect()
}

/// Fetch one page and the total for the same filter.
pub async fn fetch_page<E, S>(
    store: &S,
    filter: &E::Filter,
    sort: &E::Sort,
    request: PageRequest,
) -> CatalogResult<Page<E>>
where
    E: CatalogRecord,
    S: Store<E> + ?Sized,
{
    let items = store.find_page(filter, sort, request).await?;
    let total_items = store.count(filter).await?;
    Ok(Page::new(items, request, total_items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use catalog_core::ProductId;

    fn product(id: &str, name: &str, cents: i64, minute: u32) -> Product {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap();
        Product {
            id: ProductId::try_from(id.to_string()).unwrap(),
            name: name.to_string(),
            sku: None,
            description: None,
            price: Decimal::new(cents, 2),
            currency: "USD".to_string(),
            is_active: true,
            category_id: None,
            image_url: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn total_pages_rounds_up_and_tolerates_zero_size() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(3, 0), 3);
    }

    #[test]
    fn sort_spec_defaults_to_latest_first() {
        assert_eq!(ProductSort::parse(None), ProductSort::default());
        assert_eq!(ProductSort::parse(Some("  ")), ProductSort::default());
        assert_eq!(
            ProductSort::default(),
            ProductSort::by(ProductSortField::CreatedAt, SortDirection::Desc)
        );
    }

    #[test]
    fn sort_spec_accepts_comma_and_colon() {
        assert_eq!(
            ProductSort::parse(Some("price,asc")),
            ProductSort::by(ProductSortField::Price, SortDirection::Asc)
        );
        assert_eq!(
            ProductSort::parse(Some("name:DESC")),
            ProductSort::by(ProductSortField::Name, SortDirection::Desc)
        );
        // direction omitted: descending
        assert_eq!(
            ProductSort::parse(Some("createdAt")),
            ProductSort::by(ProductSortField::CreatedAt, SortDirection::Desc)
        );
        // anything but "desc" is ascending
        assert_eq!(
            ProductSort::parse(Some("price,up")),
            ProductSort::by(ProductSortField::Price, SortDirection::Asc)
        );
    }

    #[test]
    fn unknown_sort_field_means_natural_order() {
        assert_eq!(ProductSort::parse(Some("color,asc")), ProductSort::natural());

        let items = vec![product("b", "x", 1, 0), product("a", "y", 2, 1)];
        let natural = |a: &Product, b: &Product| ProductSort::natural().compare(a, b);
        let sorted = paginate(items, natural, PageRequest::default());
        assert_eq!(ids(&sorted), ["a", "b"]);
    }

    #[test]
    fn name_sort_is_case_insensitive_with_id_tie_break() {
        let items = vec![
            product("3", "banana", 1, 0),
            product("2", "Apple", 1, 0),
            product("1", "apple", 1, 0),
        ];
        let asc = ProductSort::by(ProductSortField::Name, SortDirection::Asc);
        let sorted = paginate(items.clone(), |a, b| asc.compare(a, b), PageRequest::default());
        assert_eq!(ids(&sorted), ["1", "2", "3"]);

        // the tie-break stays ascending when the primary key is reversed
        let desc = ProductSort::by(ProductSortField::Name, SortDirection::Desc);
        let sorted = paginate(items, |a, b| desc.compare(a, b), PageRequest::default());
        assert_eq!(ids(&sorted), ["3", "1", "2"]);
    }

    #[test]
    fn price_sort_is_numeric() {
        let items = vec![
            product("a", "a", 1000, 0),
            product("b", "b", 999, 0),
            product("c", "c", 10001, 0),
        ];
        let asc = ProductSort::by(ProductSortField::Price, SortDirection::Asc);
        let sorted = paginate(items, |a, b| asc.compare(a, b), PageRequest::default());
        assert_eq!(ids(&sorted), ["b", "a", "c"]);
    }

    #[test]
    fn paginate_returns_empty_page_past_the_end() {
        let items = vec![product("a", "a", 1, 0), product("b", "b", 1, 1)];
        let cmp = |a: &Product, b: &Product| ProductSort::natural().compare(a, b);
        assert_eq!(ids(&paginate(items.clone(), cmp, PageRequest::new(1, 1))), ["b"]);
        assert!(paginate(items.clone(), cmp, PageRequest::new(2, 1)).is_empty());
        assert!(paginate(items.clone(), cmp, PageRequest::new(u32::MAX, u32::MAX)).is_empty());
        assert!(paginate(items, cmp, PageRequest::new(0, 0)).is_empty());
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let mut p = product("a", "Blue Widget", 1, 0);
        p.sku = Some("BW-01".to_string());
        p.description = Some("Sturdy and SHINY".to_string());

        for q in ["widget", "bw-0", "shiny", "BLUE"] {
            assert!(ProductFilter::active().with_search(Some(q)).matches(&p), "{q}");
        }
        assert!(!ProductFilter::active().with_search(Some("gadget")).matches(&p));
        // blank disables search mode
        assert!(ProductFilter::active().with_search(Some("   ")).matches(&p));
    }

    #[test]
    fn category_filter_combines_with_search() {
        let shoes: CategoryId = "shoes".parse().unwrap();
        let mut p = product("a", "Runner", 1, 0);
        p.category_id = Some(shoes.clone());

        let filter = ProductFilter::active()
            .with_search(Some("run"))
            .in_category(Some(shoes));
        assert!(filter.matches(&p));

        let other = ProductFilter::active()
            .with_search(Some("run"))
            .in_category(Some("hats".parse().unwrap()));
        assert!(!other.matches(&p));

        p.is_active = false;
        assert!(!filter.matches(&p));
        assert!(ProductFilter::default().matches(&p));
    }

    #[test]
    fn page_serializes_with_camel_case_totals() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2), 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalItems"], 5);
        assert_eq!(json["totalPages"], 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: consecutive pages partition the sorted dataset.
            #[test]
            fn consecutive_pages_partition_the_dataset(
                prices in proptest::collection::vec(0i64..500, 0..60),
                size in 1u32..15,
            ) {
                let items: Vec<Product> = prices
                    .iter()
                    .enumerate()
                    .map(|(i, cents)| product(&format!("{i:03}"), "p", *cents, 0))
                    .collect();
                let sort = ProductSort::by(ProductSortField::Price, SortDirection::Asc);
                let cmp = |a: &Product, b: &Product| sort.compare(a, b);

                let all = paginate(items.clone(), cmp, PageRequest::new(0, u32::MAX));
                let pages = total_pages(items.len() as u64, size);

                let mut stitched = Vec::new();
                for page in 0..pages {
                    let chunk = paginate(items.clone(), cmp, PageRequest::new(page as u32, size));
                    prop_assert!(!chunk.is_empty());
                    prop_assert!(chunk.len() <= size as usize);
                    stitched.extend(chunk);
                }
                let past_end = PageRequest::new(pages as u32, size);
                prop_assert!(paginate(items.clone(), cmp, past_end).is_empty());
                prop_assert_eq!(ids(&stitched), ids(&all));
            }

            /// Property: search is insensitive to the case of the query.
            #[test]
            fn search_ignores_query_case(
                name in "[A-Za-z]{1,12}",
                start in 0usize..12,
                len in 1usize..6,
            ) {
                let p = product("a", &name, 1, 0);
                let start = start.min(name.len() - 1);
                let end = (start + len).min(name.len());
                let needle = &name[start..end];

                let upper = ProductFilter::active().with_search(Some(&needle.to_uppercase()));
                let lower = ProductFilter::active().with_search(Some(&needle.to_lowercase()));
                prop_assert!(upper.matches(&p));
                prop_assert!(lower.matches(&p));
            }
        }
    }
}
