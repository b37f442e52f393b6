//! Shared application state for all routes.

use crate::config::PageLimits;
use crate::service::ProductService;
use crate::store::ProductStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    /// Page size for list requests without `limit`.
    pub default_page_limit: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>, limits: PageLimits) -> Self {
        Self {
            products: ProductService::new(store, limits.max_limit),
            default_page_limit: limits.default_limit,
        }
    }
}
