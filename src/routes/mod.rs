//! Router assembly and HTTP middleware.

mod common;
mod product;

pub use common::common_routes;
pub use product::product_routes;

use crate::config::AppConfig;
use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/v1";

fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Full application: common routes, product API and middleware.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, product_routes(state))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
