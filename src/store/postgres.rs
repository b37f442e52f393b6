//! PostgreSQL product store over sqlx, plus database bootstrap helpers.

use super::ProductStore;
use crate::error::{AppError, ConfigError};
use crate::model::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::pagination::QueryPlan;
use crate::sql::{insert, select_all, select_by_id, select_page, soft_delete, update, QueryBuf};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::ConnectOptions;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    active: bool,
    metadata: Option<Json<BTreeMap<String, String>>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            description: r.description,
            active: r.active,
            metadata: r.metadata.map(|m| m.0).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Product>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, ProductRow>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(Product::from))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Product>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, ProductRow>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, id: &str, body: &CreateProduct) -> Result<Product, AppError> {
        self.fetch_optional(&insert(id, body))
            .await?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, AppError> {
        self.fetch_optional(&select_by_id(id)).await
    }

    async fn update(&self, id: &str, body: &UpdateProduct) -> Result<Option<Product>, AppError> {
        self.fetch_optional(&update(id, body)).await
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, AppError> {
        let q = soft_delete(id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let row: Option<PgRow> = query.fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    async fn list_page(&self, filter: &ProductFilter, plan: &QueryPlan) -> Result<Vec<Product>, AppError> {
        self.fetch_all(&select_page(filter, plan)).await
    }

    async fn list_all(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.fetch_all(&select_all(filter)).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open the connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| invalid_database_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// The URL may carry credentials, so only the reason is reported.
fn invalid_database_url(reason: impl Into<String>) -> AppError {
    AppError::Config(ConfigError::Invalid {
        key: "DATABASE_URL",
        value: reason.into(),
    })
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| invalid_database_url("no database path"))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_part, query) = match path_and_query.split_once('?') {
        Some((db, q)) => (db, Some(q)),
        None => (path_and_query, None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_part.trim().to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
