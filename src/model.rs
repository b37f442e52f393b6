//! Product resource: stored shape, request payloads, list options and API shape.

use crate::pagination::{KeyValue, Keyed, PaginationError, SortDirection, SortKey, SortSpec};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Keyed for Product {
    fn key_value(&self, key: &SortKey) -> KeyValue {
        match key.name.as_str() {
            "created_at" => KeyValue::Timestamp(self.created_at),
            "updated_at" => KeyValue::Timestamp(self.updated_at),
            "name" => KeyValue::Text(self.name.clone()),
            _ => KeyValue::Text(self.id.clone()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Partial update: only fields that are `Some` are written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.active.is_none() && self.metadata.is_none()
    }
}

/// Equality filters ANDed with the keyset predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub active: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        product.deleted_at.is_none() && self.active.map_or(true, |a| product.active == a)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductSortField {
    #[default]
    Id,
    CreatedAt,
    Name,
}

impl FromStr for ProductSortField {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(ProductSortField::Id),
            "created_at" => Ok(ProductSortField::CreatedAt),
            "name" => Ok(ProductSortField::Name),
            other => Err(PaginationError::Validation(format!(
                "sort must be one of id, created_at, name; got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductSort {
    pub field: ProductSortField,
    pub direction: SortDirection,
}

impl Default for ProductSort {
    fn default() -> Self {
        Self {
            field: ProductSortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl ProductSort {
    pub fn new(field: ProductSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Keyset for this sort; the product id breaks ties.
    pub fn spec(&self) -> SortSpec {
        let id = SortKey::text("id");
        match self.field {
            ProductSortField::Id => SortSpec::unique(id, self.direction),
            ProductSortField::CreatedAt => SortSpec::new(SortKey::timestamp("created_at"), self.direction, id),
            ProductSortField::Name => SortSpec::new(SortKey::text("name"), self.direction, id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            description: p.description.unwrap_or_default(),
            active: p.active,
            metadata: p.metadata,
            created_at: p.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            updated_at: p.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product() -> Product {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        Product {
            id: "prod_001".into(),
            name: "Widget".into(),
            description: None,
            active: true,
            metadata: BTreeMap::new(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn sort_specs_use_id_as_tie_breaker() {
        let spec = ProductSort::new(ProductSortField::CreatedAt, SortDirection::Desc).spec();
        assert_eq!(spec.column.name, "created_at");
        assert_eq!(spec.tie_breaker.name, "id");
        assert_eq!(spec.direction, SortDirection::Desc);
        assert!(ProductSort::default().spec().is_collapsed());
    }

    #[test]
    fn cursor_from_product_follows_sort() {
        let p = product();
        let spec = ProductSort::new(ProductSortField::Name, SortDirection::Asc).spec();
        let cursor = spec.cursor_from(&p);
        assert_eq!(
            cursor.values(),
            &[KeyValue::Text("Widget".into()), KeyValue::Text("prod_001".into())]
        );
    }

    #[test]
    fn filter_excludes_deleted_and_mismatched_rows() {
        let mut p = product();
        assert!(ProductFilter::default().matches(&p));
        assert!(ProductFilter { active: Some(true) }.matches(&p));
        assert!(!ProductFilter { active: Some(false) }.matches(&p));
        p.deleted_at = Some(p.created_at);
        assert!(!ProductFilter::default().matches(&p));
    }

    #[test]
    fn response_flattens_optional_description() {
        let r = ProductResponse::from(product());
        assert_eq!(r.description, "");
        assert_eq!(r.created_at, "2024-05-01T08:30:00Z");
    }

    #[test]
    fn unknown_sort_field_is_a_validation_error() {
        assert!(matches!("price".parse::<ProductSortField>(), Err(PaginationError::Validation(_))));
    }
}
