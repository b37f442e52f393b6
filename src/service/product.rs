//! Product use cases over a [`ProductStore`].

use crate::error::AppError;
use crate::id::{generate_with_prefix, PRODUCT_PREFIX};
use crate::model::{CreateProduct, Product, ProductFilter, ProductSort, UpdateProduct};
use crate::pagination::{paginate, PaginationRequest, PaginationResult};
use crate::store::ProductStore;
use std::sync::Arc;

const RESOURCE: &str = "product";

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    max_page_limit: i64,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, max_page_limit: i64) -> Self {
        Self { store, max_page_limit }
    }

    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    pub async fn create(&self, body: &CreateProduct) -> Result<Product, AppError> {
        let id = generate_with_prefix(PRODUCT_PREFIX);
        let product = self.store.insert(&id, body).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> Result<Product, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }

    pub async fn update(&self, id: &str, body: &UpdateProduct) -> Result<Product, AppError> {
        self.store
            .update(id, body)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store.soft_delete(id).await? {
            return Err(AppError::not_found(RESOURCE, id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// One keyset page of live products matching `filter`.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        request: &PaginationRequest,
    ) -> Result<PaginationResult<Product>, AppError> {
        let spec = sort.spec();
        let store = Arc::clone(&self.store);
        paginate(&spec, request, self.max_page_limit, |plan| async move {
            store.list_page(filter, &plan).await
        })
        .await
    }

    /// Every live product matching `filter`, unpaginated.
    pub async fn list_all(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.store.list_all(filter).await
    }
}
