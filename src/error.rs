//! Typed errors and HTTP mapping.

use crate::pagination::PaginationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("{resource} conflict: {reason}")]
    Conflict { resource: &'static str, reason: String },
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Migrate(_) | AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pagination(_) | AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Migrate(_) => "migration_error",
            AppError::Db(_) => "database_error",
            AppError::Pagination(PaginationError::Validation(_)) => "invalid_pagination",
            AppError::Pagination(PaginationError::MalformedCursor(_)) => "invalid_cursor",
            AppError::Validation { .. } => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::Unavailable(_) => "service_unavailable",
        }
    }

    fn param(&self) -> Option<String> {
        match self {
            AppError::Validation { field, .. } if !field.is_empty() => Some(field.clone()),
            _ => None,
        }
    }
}

/// Unique violations become conflicts and connection trouble becomes 503; the rest
/// stays a database error.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict {
                resource: "product",
                reason: "already exists".into(),
            },
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => AppError::Conflict {
                resource: "product",
                reason: "referenced resource does not exist".into(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Unavailable("database connection error".into())
            }
            other => AppError::Db(other),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            ("api_error", "An internal error occurred".to_string())
        } else {
            ("invalid_request_error", self.to_string())
        };
        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                code: self.code().to_string(),
                message,
                param: self.param(),
            },
        };
        (status, Json(body)).into_response()
    }
}
