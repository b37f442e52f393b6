//! Bidirectional keyset pagination.
//!
//! A page request is turned into a [`QueryPlan`] (comparison predicate, physical
//! sort direction, overfetch limit), the caller's store runs that plan, and the
//! returned rows are assembled into a [`PaginationResult`] in logical order.
//!
//! Backward pages are fetched with the sort inverted so the store returns the rows
//! nearest the cursor first; the assembler reverses them afterwards. One extra row
//! is always requested so `has_more`/`has_previous` come out of the same query.
//!
//! The engine holds no state. Dropping the future returned by [`paginate`] drops
//! the in-flight store call with it.

mod assembler;
pub mod cursor;
mod planner;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;
use thiserror::Error;

pub use assembler::assemble;
pub use planner::{plan, Comparison, KeysetPredicate, LogicalDirection, QueryPlan};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid pagination request: {0}")]
    Validation(String),
    #[error("malformed cursor: {0}")]
    MalformedCursor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(PaginationError::Validation(format!(
                "order must be 'asc' or 'desc', got '{}'",
                s
            )))
        }
    }
}

/// Value type of a key column; decides how cursor values are checked on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Text,
    Integer,
    Timestamp,
}

impl KeyKind {
    fn label(self) -> &'static str {
        match self {
            KeyKind::Text => "text",
            KeyKind::Integer => "integer",
            KeyKind::Timestamp => "timestamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub name: String,
    pub kind: KeyKind,
}

impl SortKey {
    pub fn text(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: KeyKind::Text }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: KeyKind::Integer }
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: KeyKind::Timestamp }
    }
}

/// One key value captured from a boundary row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl KeyValue {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyValue::Text(_) => KeyKind::Text,
            KeyValue::Integer(_) => KeyKind::Integer,
            KeyValue::Timestamp(_) => KeyKind::Timestamp,
        }
    }
}

/// Sort column plus a unique tie-breaker. Sorting by the tie-breaker itself
/// collapses the key to a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortKey,
    pub direction: SortDirection,
    pub tie_breaker: SortKey,
}

impl SortSpec {
    pub fn new(column: SortKey, direction: SortDirection, tie_breaker: SortKey) -> Self {
        Self {
            column,
            direction,
            tie_breaker,
        }
    }

    /// Sort by a unique key alone.
    pub fn unique(key: SortKey, direction: SortDirection) -> Self {
        Self::new(key.clone(), direction, key)
    }

    pub fn is_collapsed(&self) -> bool {
        self.column.name == self.tie_breaker.name
    }

    /// Columns compared by the keyset predicate, most significant first.
    pub fn key_columns(&self) -> Vec<&SortKey> {
        if self.is_collapsed() {
            vec![&self.column]
        } else {
            vec![&self.column, &self.tie_breaker]
        }
    }

    pub fn arity(&self) -> usize {
        if self.is_collapsed() {
            1
        } else {
            2
        }
    }

    /// Cursor pointing at a row with the given sort and tie-breaker values.
    pub fn cursor(&self, sort_value: KeyValue, tie_breaker_value: KeyValue) -> Cursor {
        if self.is_collapsed() {
            Cursor::from_values(vec![sort_value])
        } else {
            Cursor::from_values(vec![sort_value, tie_breaker_value])
        }
    }

    pub fn cursor_from<T: Keyed + ?Sized>(&self, row: &T) -> Cursor {
        Cursor::from_values(self.key_columns().into_iter().map(|k| row.key_value(k)).collect())
    }

    fn check_cursor(&self, cursor: &Cursor) -> Result<(), PaginationError> {
        if cursor.values.len() != self.arity() {
            return Err(PaginationError::MalformedCursor(format!(
                "expected {} values, found {}",
                self.arity(),
                cursor.values.len()
            )));
        }
        for (key, value) in self.key_columns().into_iter().zip(&cursor.values) {
            if value.kind() != key.kind {
                return Err(PaginationError::MalformedCursor(format!(
                    "{} expects a {} value",
                    key.name,
                    key.kind.label()
                )));
            }
        }
        Ok(())
    }
}

/// Rows that can report their key values, so the assembler can build cursors.
pub trait Keyed {
    fn key_value(&self, key: &SortKey) -> KeyValue;
}

/// Position in the ordered result set as a plain value tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    values: Vec<KeyValue>,
}

impl Cursor {
    pub fn from_values(values: Vec<KeyValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }

    pub fn encode(&self) -> String {
        cursor::encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationRequest {
    pub limit: i64,
    pub next_cursor: Option<Cursor>,
    pub before_cursor: Option<Cursor>,
}

impl PaginationRequest {
    pub fn first(limit: i64) -> Self {
        Self {
            limit,
            next_cursor: None,
            before_cursor: None,
        }
    }

    pub fn after(limit: i64, cursor: Cursor) -> Self {
        Self {
            limit,
            next_cursor: Some(cursor),
            before_cursor: None,
        }
    }

    pub fn before(limit: i64, cursor: Cursor) -> Self {
        Self {
            limit,
            next_cursor: None,
            before_cursor: Some(cursor),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub has_previous: bool,
    pub next_cursor: Option<Cursor>,
    pub before_cursor: Option<Cursor>,
}

impl<T> PaginationResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginationResult<U> {
        PaginationResult {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
            has_previous: self.has_previous,
            next_cursor: self.next_cursor,
            before_cursor: self.before_cursor,
        }
    }
}

/// Plan the request, run exactly one store query, assemble the page.
///
/// Validation and cursor errors are returned before `fetch` is called. Errors from
/// `fetch` are returned unchanged.
pub async fn paginate<T, E, F, Fut>(
    sort: &SortSpec,
    request: &PaginationRequest,
    max_limit: i64,
    fetch: F,
) -> Result<PaginationResult<T>, E>
where
    T: Keyed,
    E: From<PaginationError>,
    F: FnOnce(QueryPlan) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let plan = plan(sort, request, max_limit)?;
    tracing::debug!(
        direction = ?plan.direction,
        physical = ?plan.physical_direction,
        fetch_limit = plan.fetch_limit,
        keyset = plan.predicate.is_some(),
        "pagination plan"
    );
    let rows = fetch(plan.clone()).await?;
    Ok(assemble(&plan, rows, |row| sort.cursor_from(row)))
}
