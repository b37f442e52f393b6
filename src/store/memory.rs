//! In-process product store. Evaluates a [`QueryPlan`] the same way the SQL
//! renderer does: filter, keyset comparison on the key tuple, physical order, limit.

use super::ProductStore;
use crate::error::AppError;
use crate::model::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::pagination::{QueryPlan, SortDirection};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryProductStore {
    rows: RwLock<BTreeMap<String, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the given rows already present, timestamps untouched.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.write();
            for p in products {
                rows.insert(p.id.clone(), p);
            }
        }
        store
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Product>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Product>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, id: &str, body: &CreateProduct) -> Result<Product, AppError> {
        let mut rows = self.write();
        if rows.contains_key(id) {
            return Err(AppError::Conflict {
                resource: "product",
                reason: "already exists".into(),
            });
        }
        let now = Utc::now();
        let product = Product {
            id: id.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            active: body.active,
            metadata: body.metadata.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.read().get(id).filter(|p| p.deleted_at.is_none()).cloned())
    }

    async fn update(&self, id: &str, body: &UpdateProduct) -> Result<Option<Product>, AppError> {
        let mut rows = self.write();
        let Some(product) = rows.get_mut(id).filter(|p| p.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(name) = &body.name {
            product.name = name.clone();
        }
        if let Some(description) = &body.description {
            product.description = Some(description.clone());
        }
        if let Some(active) = body.active {
            product.active = active;
        }
        if let Some(metadata) = &body.metadata {
            product.metadata = metadata.clone();
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, AppError> {
        let mut rows = self.write();
        match rows.get_mut(id).filter(|p| p.deleted_at.is_none()) {
            Some(product) => {
                let now = Utc::now();
                product.deleted_at = Some(now);
                product.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_page(&self, filter: &ProductFilter, plan: &QueryPlan) -> Result<Vec<Product>, AppError> {
        let rows = self.read();
        let mut keyed: Vec<_> = rows
            .values()
            .filter(|p| filter.matches(p))
            .map(|p| (plan.sort.cursor_from(p), p))
            .filter(|(key, _)| match &plan.predicate {
                Some(pred) => pred.operator.holds(key.values().cmp(pred.cursor.values())),
                None => true,
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match plan.physical_direction {
            SortDirection::Asc => a.values().cmp(b.values()),
            SortDirection::Desc => b.values().cmp(a.values()),
        });
        Ok(keyed
            .into_iter()
            .take(plan.fetch_limit)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn list_all(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        Ok(self.read().values().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
