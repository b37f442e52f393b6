//! Response envelopes.

use crate::model::{Product, ProductResponse};
use crate::pagination::PaginationResult;
use axum::{http::StatusCode, Json};
use serde::Serialize;

/// One keyset page. Cursors are opaque tokens for `starting_after` / `ending_before`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

impl From<PaginationResult<Product>> for ListResponse<ProductResponse> {
    fn from(page: PaginationResult<Product>) -> Self {
        let page = page.map(ProductResponse::from);
        ListResponse {
            data: page.items,
            has_more: page.has_more,
            has_previous: page.has_previous,
            next_cursor: page.next_cursor.map(|c| c.encode()),
            prev_cursor: page.before_cursor.map(|c| c.encode()),
        }
    }
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Cursor, KeyValue};

    #[test]
    fn absent_cursors_are_omitted() {
        let page: PaginationResult<Product> = PaginationResult {
            items: vec![],
            has_more: false,
            has_previous: false,
            next_cursor: None,
            before_cursor: None,
        };
        let json = serde_json::to_value(ListResponse::from(page)).unwrap();
        assert_eq!(json, serde_json::json!({"data": [], "has_more": false, "has_previous": false}));
    }

    #[test]
    fn cursors_are_encoded() {
        let cursor = Cursor::from_values(vec![KeyValue::Text("prod_002".into())]);
        let page: PaginationResult<Product> = PaginationResult {
            items: vec![],
            has_more: true,
            has_previous: true,
            next_cursor: Some(cursor.clone()),
            before_cursor: Some(cursor.clone()),
        };
        let body = ListResponse::from(page);
        assert_eq!(body.next_cursor.as_deref(), Some(cursor.encode().as_str()));
        assert_eq!(body.prev_cursor, body.next_cursor);
    }
}
