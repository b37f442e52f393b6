//! Dynamically typed bind values for generated queries.

use crate::pagination::KeyValue;
use chrono::{DateTime, Utc};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query. Each variant reports its own
/// Postgres type, so one `Vec<BindValue>` can carry mixed parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl From<&KeyValue> for BindValue {
    fn from(v: &KeyValue) -> Self {
        match v {
            KeyValue::Text(s) => BindValue::Text(s.clone()),
            KeyValue::Integer(n) => BindValue::I64(*n),
            KeyValue::Timestamp(t) => BindValue::Timestamp(*t),
        }
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => <Option<String> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            BindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf)?,
            BindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Null | BindValue::Text(_) => PgTypeInfo::with_name("TEXT"),
            BindValue::Bool(_) => PgTypeInfo::with_name("BOOL"),
            BindValue::I64(_) => PgTypeInfo::with_name("INT8"),
            BindValue::Timestamp(_) => PgTypeInfo::with_name("TIMESTAMPTZ"),
            BindValue::Json(_) => PgTypeInfo::with_name("JSONB"),
        })
    }
}

impl sqlx::Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
