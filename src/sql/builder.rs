//! Builds parameterized SELECT, INSERT, UPDATE for the products table, including
//! the keyset page query rendered from a [`QueryPlan`].

use super::params::BindValue;
use crate::model::{CreateProduct, ProductFilter, UpdateProduct};
use crate::pagination::{QueryPlan, SortDirection, SortSpec};

pub const PRODUCTS_TABLE: &str = "products";

const PRODUCT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "active",
    "metadata",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_list() -> String {
    PRODUCT_COLUMNS.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Soft-delete exclusion plus caller filters, as `WHERE` parts.
fn filter_parts(q: &mut QueryBuf, filter: &ProductFilter) -> Vec<String> {
    let mut parts = vec![format!("{} IS NULL", quoted("deleted_at"))];
    if let Some(active) = filter.active {
        let n = q.push_param(BindValue::Bool(active));
        parts.push(format!("{} = ${}", quoted("active"), n));
    }
    parts
}

fn order_by(sort: &SortSpec, direction: SortDirection) -> String {
    let parts: Vec<String> = sort
        .key_columns()
        .iter()
        .map(|k| format!("{} {}", quoted(&k.name), direction.as_sql()))
        .collect();
    format!("ORDER BY {}", parts.join(", "))
}

/// SELECT one live product by id. Binds id as $1.
pub fn select_by_id(id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${} AND {} IS NULL",
        column_list(),
        quoted(PRODUCTS_TABLE),
        quoted("id"),
        n,
        quoted("deleted_at")
    );
    q
}

/// SELECT every live product matching `filter`, ordered by id. Unpaginated.
pub fn select_all(filter: &ProductFilter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let parts = filter_parts(&mut q, filter);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} ASC",
        column_list(),
        quoted(PRODUCTS_TABLE),
        parts.join(" AND "),
        quoted("id")
    );
    q
}

/// SELECT one keyset page.
///
/// `WHERE <filters> [AND (col, id) op ($a, $b)] ORDER BY col DIR, id DIR LIMIT fetch_limit`
/// with `op` and `DIR` taken from the plan, so backward pages come out inverted.
pub fn select_page(filter: &ProductFilter, plan: &QueryPlan) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut parts = filter_parts(&mut q, filter);

    if let Some(predicate) = &plan.predicate {
        let keys = plan.sort.key_columns();
        let cols: Vec<String> = keys.iter().map(|k| quoted(&k.name)).collect();
        let placeholders: Vec<String> = predicate
            .cursor
            .values()
            .iter()
            .map(|v| format!("${}", q.push_param(BindValue::from(v))))
            .collect();
        let condition = if cols.len() == 1 {
            format!("{} {} {}", cols[0], predicate.operator.as_sql(), placeholders[0])
        } else {
            format!(
                "({}) {} ({})",
                cols.join(", "),
                predicate.operator.as_sql(),
                placeholders.join(", ")
            )
        };
        parts.push(condition);
    }

    q.sql = format!(
        "SELECT {} FROM {} WHERE {} {} LIMIT {}",
        column_list(),
        quoted(PRODUCTS_TABLE),
        parts.join(" AND "),
        order_by(&plan.sort, plan.physical_direction),
        plan.fetch_limit
    );
    q
}

/// Empty metadata is stored as NULL.
fn metadata_param(metadata: &std::collections::BTreeMap<String, String>) -> BindValue {
    if metadata.is_empty() {
        BindValue::Null
    } else {
        BindValue::Json(serde_json::json!(metadata))
    }
}

/// INSERT one product and return the stored row.
pub fn insert(id: &str, body: &CreateProduct) -> QueryBuf {
    let mut q = QueryBuf::new();
    let placeholders = [
        format!("${}", q.push_param(BindValue::Text(id.to_string()))),
        format!("${}", q.push_param(BindValue::Text(body.name.clone()))),
        format!(
            "${}",
            q.push_param(body.description.clone().map_or(BindValue::Null, BindValue::Text))
        ),
        format!("${}", q.push_param(BindValue::Bool(body.active))),
        format!("${}::jsonb", q.push_param(metadata_param(&body.metadata))),
    ];
    let cols = ["id", "name", "description", "active", "metadata"]
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>();
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(PRODUCTS_TABLE),
        cols.join(", "),
        placeholders.join(", "),
        column_list()
    );
    q
}

/// UPDATE a live product by id: SET only the provided fields, always refresh updated_at.
pub fn update(id: &str, body: &UpdateProduct) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    if let Some(name) = &body.name {
        let n = q.push_param(BindValue::Text(name.clone()));
        sets.push(format!("{} = ${}", quoted("name"), n));
    }
    if let Some(description) = &body.description {
        let n = q.push_param(BindValue::Text(description.clone()));
        sets.push(format!("{} = ${}", quoted("description"), n));
    }
    if let Some(active) = body.active {
        let n = q.push_param(BindValue::Bool(active));
        sets.push(format!("{} = ${}", quoted("active"), n));
    }
    if let Some(metadata) = &body.metadata {
        let n = q.push_param(metadata_param(metadata));
        sets.push(format!("{} = ${}::jsonb", quoted("metadata"), n));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_param = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} AND {} IS NULL RETURNING {}",
        quoted(PRODUCTS_TABLE),
        sets.join(", "),
        quoted("id"),
        id_param,
        quoted("deleted_at"),
        column_list()
    );
    q
}

/// Soft delete: stamp deleted_at on a live product. Returns the id when a row changed.
pub fn soft_delete(id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!(
        "UPDATE {} SET {} = NOW(), {} = NOW() WHERE {} = ${} AND {} IS NULL RETURNING {}",
        quoted(PRODUCTS_TABLE),
        quoted("deleted_at"),
        quoted("updated_at"),
        quoted("id"),
        n,
        quoted("deleted_at"),
        quoted("id")
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductSort, ProductSortField};
    use crate::pagination::{plan, KeyValue, PaginationRequest};
    use chrono::{TimeZone, Utc};

    const COLS: &str = r#""id", "name", "description", "active", "metadata", "created_at", "updated_at", "deleted_at""#;

    fn by_id() -> SortSpec {
        ProductSort::default().spec()
    }

    fn by_created_at(direction: SortDirection) -> SortSpec {
        ProductSort::new(ProductSortField::CreatedAt, direction).spec()
    }

    // ─── select_page ───

    #[test]
    fn first_page_has_no_keyset_condition() {
        let p = plan(&by_id(), &PaginationRequest::first(20), 100).unwrap();
        let q = select_page(&ProductFilter::default(), &p);
        assert_eq!(
            q.sql,
            format!(r#"SELECT {} FROM "products" WHERE "deleted_at" IS NULL ORDER BY "id" ASC LIMIT 21"#, COLS)
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn forward_page_on_unique_key() {
        let sort = by_id();
        let cursor = sort.cursor(KeyValue::Text("prod_002".into()), KeyValue::Text("prod_002".into()));
        let p = plan(&sort, &PaginationRequest::after(2, cursor), 100).unwrap();
        let q = select_page(&ProductFilter { active: Some(true) }, &p);
        assert_eq!(
            q.sql,
            format!(
                r#"SELECT {} FROM "products" WHERE "deleted_at" IS NULL AND "active" = $1 AND "id" > $2 ORDER BY "id" ASC LIMIT 3"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![BindValue::Bool(true), BindValue::Text("prod_002".into())]);
    }

    #[test]
    fn backward_page_inverts_tuple_comparison_and_order() {
        let sort = by_created_at(SortDirection::Desc);
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let cursor = sort.cursor(KeyValue::Timestamp(at), KeyValue::Text("prod_7".into()));
        let p = plan(&sort, &PaginationRequest::before(10, cursor), 100).unwrap();
        let q = select_page(&ProductFilter::default(), &p);
        assert_eq!(
            q.sql,
            format!(
                r#"SELECT {} FROM "products" WHERE "deleted_at" IS NULL AND ("created_at", "id") > ($1, $2) ORDER BY "created_at" ASC, "id" ASC LIMIT 11"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![BindValue::Timestamp(at), BindValue::Text("prod_7".into())]);
    }

    #[test]
    fn forward_descending_uses_less_than() {
        let sort = by_created_at(SortDirection::Desc);
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let cursor = sort.cursor(KeyValue::Timestamp(at), KeyValue::Text("prod_7".into()));
        let p = plan(&sort, &PaginationRequest::after(10, cursor), 100).unwrap();
        let q = select_page(&ProductFilter::default(), &p);
        assert!(q.sql.contains(r#"("created_at", "id") < ($1, $2) ORDER BY "created_at" DESC, "id" DESC"#));
    }

    // ─── writes ───

    #[test]
    fn insert_binds_empty_metadata_as_null() {
        let body = CreateProduct {
            name: "Widget".into(),
            ..Default::default()
        };
        let q = insert("prod_1", &body);
        assert!(q.sql.starts_with(
            r#"INSERT INTO "products" ("id", "name", "description", "active", "metadata") VALUES ($1, $2, $3, $4, $5::jsonb)"#
        ));
        assert_eq!(q.params[2], BindValue::Null);
        assert_eq!(q.params[4], BindValue::Null);
    }

    #[test]
    fn update_sets_only_provided_fields() {
        let body = UpdateProduct {
            active: Some(false),
            ..Default::default()
        };
        let q = update("prod_1", &body);
        assert_eq!(
            q.sql,
            format!(
                r#"UPDATE "products" SET "active" = $1, "updated_at" = NOW() WHERE "id" = $2 AND "deleted_at" IS NULL RETURNING {}"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![BindValue::Bool(false), BindValue::Text("prod_1".into())]);
    }

    #[test]
    fn soft_delete_only_touches_live_rows() {
        let q = soft_delete("prod_1");
        assert!(q.sql.contains(r#"WHERE "id" = $1 AND "deleted_at" IS NULL"#));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted(r#"we"ird"#), r#""we""ird""#);
    }
}
