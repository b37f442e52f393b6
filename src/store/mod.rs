//! Product persistence. The service talks to a [`ProductStore`]; PostgreSQL is the
//! production backend and the in-memory store backs tests and database-less runs.

mod memory;
mod postgres;

use crate::error::AppError;
use crate::model::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::pagination::QueryPlan;
use async_trait::async_trait;

pub use memory::MemoryProductStore;
pub use postgres::{connect, ensure_database_exists, PgProductStore};

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, id: &str, body: &CreateProduct) -> Result<Product, AppError>;

    /// Live (not soft-deleted) product by id.
    async fn get(&self, id: &str) -> Result<Option<Product>, AppError>;

    async fn update(&self, id: &str, body: &UpdateProduct) -> Result<Option<Product>, AppError>;

    /// Returns false when no live product had this id.
    async fn soft_delete(&self, id: &str) -> Result<bool, AppError>;

    /// Up to `plan.fetch_limit` rows matching `filter` and the plan's keyset
    /// predicate, ordered by `plan.physical_direction`.
    async fn list_page(&self, filter: &ProductFilter, plan: &QueryPlan) -> Result<Vec<Product>, AppError>;

    /// Every row matching `filter`, ordered by id.
    async fn list_all(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
