//! Product handlers: create, read, update, delete, list.

use crate::error::AppError;
use crate::model::{CreateProduct, ProductFilter, ProductResponse, ProductSort, ProductSortField, UpdateProduct};
use crate::pagination::{cursor, PaginationRequest, SortDirection};
use crate::response::{created, ok, ListResponse};
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

fn parse_body<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    if !value.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("invalid body: {}", e)))
}

fn parse_bool(field: &str, s: &str) -> Result<bool, AppError> {
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AppError::validation(field, format!("{} must be true or false", field)))
    }
}

/// List options parsed from the query string.
#[derive(Debug)]
struct ListParams {
    filter: ProductFilter,
    sort: ProductSort,
    request: PaginationRequest,
}

fn list_params(params: &HashMap<String, String>, default_limit: i64) -> Result<ListParams, AppError> {
    let param = |k: &str| params.get(k).map(|v| v.trim()).filter(|v| !v.is_empty());

    let limit = match param("limit") {
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| AppError::validation("limit", "limit must be an integer"))?,
        None => default_limit,
    };
    let filter = ProductFilter {
        active: param("active").map(|s| parse_bool("active", s)).transpose()?,
    };
    let field = param("sort").map(str::parse::<ProductSortField>).transpose()?.unwrap_or_default();
    let direction = param("order")
        .map(str::parse::<SortDirection>)
        .transpose()?
        .unwrap_or(SortDirection::Asc);
    let sort = ProductSort::new(field, direction);

    let spec = sort.spec();
    let request = PaginationRequest {
        limit,
        next_cursor: param("starting_after").map(|t| cursor::decode(t, &spec)).transpose()?,
        before_cursor: param("ending_before").map(|t| cursor::decode(t, &spec)).transpose()?,
    };
    Ok(ListParams { filter, sort, request })
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<ProductResponse>>, AppError> {
    let ListParams { filter, sort, request } = list_params(&params, state.default_page_limit)?;
    let page = state.products.list(&filter, sort, &request).await?;
    Ok(Json(ListResponse::from(page)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let body: CreateProduct = parse_body(body)?;
    RequestValidator::validate_create(&body)?;
    let product = state.products.create(&body).await?;
    Ok(created(ProductResponse::from(product)))
}

pub async fn read_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = state.products.get(&id).await?;
    Ok(ok(ProductResponse::from(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let body: UpdateProduct = parse_body(body)?;
    RequestValidator::validate_update(&body)?;
    let product = if body.is_empty() {
        state.products.get(&id).await?
    } else {
        state.products.update(&id, &body).await?
    };
    Ok(ok(ProductResponse::from(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.products.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{KeyValue, PaginationError};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_query_is_empty() {
        let p = list_params(&params(&[]), 10).unwrap();
        assert_eq!(p.request, PaginationRequest::first(10));
        assert_eq!(p.sort, ProductSort::default());
        assert_eq!(p.filter, ProductFilter::default());
    }

    #[test]
    fn parses_filters_and_sort() {
        let p = list_params(
            &params(&[("limit", "3"), ("active", "false"), ("sort", "created_at"), ("order", "desc")]),
            10,
        )
        .unwrap();
        assert_eq!(p.request.limit, 3);
        assert_eq!(p.filter.active, Some(false));
        assert_eq!(p.sort, ProductSort::new(ProductSortField::CreatedAt, SortDirection::Desc));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            list_params(&params(&[("limit", "ten")]), 10),
            Err(AppError::Validation { ref field, .. }) if field == "limit"
        ));
        assert!(matches!(
            list_params(&params(&[("active", "yes")]), 10),
            Err(AppError::Validation { ref field, .. }) if field == "active"
        ));
        assert!(matches!(
            list_params(&params(&[("sort", "price")]), 10),
            Err(AppError::Pagination(PaginationError::Validation(_)))
        ));
        assert!(matches!(
            list_params(&params(&[("starting_after", "!!!")]), 10),
            Err(AppError::Pagination(PaginationError::MalformedCursor(_)))
        ));
    }

    #[test]
    fn cursor_is_decoded_for_the_requested_sort() {
        let token = ProductSort::default()
            .spec()
            .cursor(KeyValue::Text("prod_002".into()), KeyValue::Text("prod_002".into()))
            .encode();
        let p = list_params(&params(&[("ending_before", token.as_str())]), 10).unwrap();
        assert!(p.request.next_cursor.is_none());
        assert!(p.request.before_cursor.is_some());

        // An id cursor does not fit the two-column name keyset.
        let err = list_params(&params(&[("sort", "name"), ("starting_after", token.as_str())]), 10).unwrap_err();
        assert!(matches!(err, AppError::Pagination(PaginationError::MalformedCursor(_))));
    }
}
