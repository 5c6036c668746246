use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::{CatalogError, CatalogResult, CategoryId, Entity, EntityKind, ProductId};

use crate::query::{ProductFilter, ProductSort};
use crate::store::{CatalogRecord, UniqueKey};
use crate::validation::{self, DESCRIPTION_MAX_LEN, IMAGE_URL_MAX_LEN, SKU_MAX_LEN};

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

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

impl CatalogRecord for Product {
    const KIND: EntityKind = EntityKind::Product;

    type Filter = ProductFilter;
    type Sort = ProductSort;

    fn matches(&self, filter: &ProductFilter) -> bool {
        filter.matches(self)
    }

    fn compare(&self, other: &Self, sort: &ProductSort) -> Ordering {
        sort.compare(self, other)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::ProductName(self.name.clone())];
        if let Some(sku) = &self.sku {
            keys.push(UniqueKey::ProductSku(sku.clone()));
        }
        keys
    }
}

/// Creation candidate. Identity and timestamps are server-assigned when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub id: Option<ProductId>,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub is_active: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Decimal, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            currency: currency.into(),
            ..Self::default()
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validation::require_name("name", &self.name)?;
        validation::optional_max_len("sku", self.sku.as_deref(), SKU_MAX_LEN)?;
        validation::optional_max_len(
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;
        validation::optional_max_len("imageUrl", self.image_url.as_deref(), IMAGE_URL_MAX_LEN)?;
        validate_price(self.price)?;
        validation::currency_code(&self.currency)?;
        validation::storable_timestamp("createdAt", self.created_at)
    }
}

/// Partial update: only `Some` fields overwrite the persisted product.
///
/// A blank `sku` clears the stored SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
}

impl ProductChanges {
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(name) = &self.name {
            validation::require_name("name", name)?;
        }
        validation::optional_max_len("sku", self.sku.as_deref(), SKU_MAX_LEN)?;
        validation::optional_max_len(
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;
        validation::optional_max_len("imageUrl", self.image_url.as_deref(), IMAGE_URL_MAX_LEN)?;
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(currency) = &self.currency {
            validation::currency_code(currency)?;
        }
        Ok(())
    }
}

fn validate_price(price: Decimal) -> CatalogResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CatalogError::validation("price must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewProduct {
        NewProduct::new("Widget", Decimal::new(999, 2), "USD").with_sku("W-1")
    }

    #[test]
    fn valid_candidate_passes() {
        assert!(widget().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name_and_negative_price() {
        let mut blank = widget();
        blank.name = "   ".to_string();
        assert!(matches!(blank.validate(), Err(CatalogError::Validation(_))));

        let mut negative = widget();
        negative.price = Decimal::new(-1, 2);
        assert!(matches!(negative.validate(), Err(CatalogError::Validation(_))));

        let mut zero = widget();
        zero.price = Decimal::ZERO;
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn rejects_bad_currency_and_long_description() {
        let mut currency = widget();
        currency.currency = "DOLLAR".to_string();
        assert!(currency.validate().is_err());

        let long = widget().with_description("x".repeat(DESCRIPTION_MAX_LEN + 1));
        assert!(long.validate().is_err());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        assert!(ProductChanges::default().validate().is_ok());

        let changes = ProductChanges {
            name: Some(String::new()),
            ..ProductChanges::default()
        };
        assert!(changes.validate().is_err());

        // a blank sku is a request to clear it, not a violation
        let clear_sku = ProductChanges {
            sku: Some(String::new()),
            ..ProductChanges::default()
        };
        assert!(clear_sku.validate().is_ok());
    }

    #[test]
    fn only_present_skus_occupy_a_unique_key() {
        let at = Utc::now();
        let mut product = Product {
            id: ProductId::generate(),
            name: "Widget".to_string(),
            sku: None,
            description: None,
            price: Decimal::ONE,
            currency: "USD".to_string(),
            is_active: true,
            category_id: None,
            image_url: None,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(product.unique_keys(), vec![UniqueKey::ProductName("Widget".into())]);

        product.sku = Some("W-1".to_string());
        assert_eq!(product.unique_keys().len(), 2);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(widget()).unwrap();
        assert_eq!(json["name"], "Widget");
        assert!(json.get("isActive").is_some());
        assert!(json.get("categoryId").is_some());

        let parsed: NewProduct =
            serde_json::from_str(r#"{"name":"Gadget","price":"1.50","currency":"EUR"}"#).unwrap();
        assert_eq!(parsed.price, Decimal::new(150, 2));
        assert_eq!(parsed.is_active, None);
    }
}
