//! Product CRUD routes, mounted under `/api/v1`.

use crate::handlers::product::{create_product, delete_product, list_products, read_product, update_product};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn product_routes(state: AppState) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(read_product).patch(update_product).delete(delete_product),
        )
        .with_state(state)
}
