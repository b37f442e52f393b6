//! Catalog API: product CRUD over PostgreSQL with bidirectional keyset pagination.

pub mod config;
pub mod error;
pub mod handlers;
pub mod id;
pub mod logging;
pub mod migration;
pub mod model;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, LogFormat, PageLimits};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, revert_latest};
pub use model::{CreateProduct, Product, ProductFilter, ProductResponse, ProductSort, ProductSortField, UpdateProduct};
pub use pagination::{paginate, Cursor, PaginationError, PaginationRequest, PaginationResult, SortDirection, SortSpec};
pub use response::ListResponse;
pub use routes::{app, common_routes, product_routes};
pub use service::ProductService;
pub use state::AppState;
pub use store::{connect, ensure_database_exists, MemoryProductStore, PgProductStore, ProductStore};
