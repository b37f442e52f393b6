//! Turns a sort spec and page request into a store query plan.

use std::cmp::Ordering;

use super::{Cursor, PaginationError, PaginationRequest, SortDirection, SortSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalDirection {
    Forward,
    Backward,
}

/// Operator of the keyset comparison `(column, tie_breaker) op (v1, v2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Lt,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }

    /// Whether `row.cmp(cursor)` satisfies this operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Lt => ordering == Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetPredicate {
    pub operator: Comparison,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub sort: SortSpec,
    pub direction: LogicalDirection,
    /// None on the first page.
    pub predicate: Option<KeysetPredicate>,
    /// Order the store must return rows in; inverted for backward pages.
    pub physical_direction: SortDirection,
    pub limit: usize,
    pub fetch_limit: usize,
    pub cursor_supplied: bool,
}

/// The whole ASC/DESC x forward/backward matrix in one place.
pub fn direction_table(logical: LogicalDirection, sort: SortDirection) -> (Comparison, SortDirection) {
    match (logical, sort) {
        (LogicalDirection::Forward, SortDirection::Asc) => (Comparison::Gt, SortDirection::Asc),
        (LogicalDirection::Forward, SortDirection::Desc) => (Comparison::Lt, SortDirection::Desc),
        (LogicalDirection::Backward, SortDirection::Asc) => (Comparison::Lt, SortDirection::Desc),
        (LogicalDirection::Backward, SortDirection::Desc) => (Comparison::Gt, SortDirection::Asc),
    }
}

/// Validate `request` and build the plan. `limit` above `max_limit` is clamped.
pub fn plan(
    sort: &SortSpec,
    request: &PaginationRequest,
    max_limit: i64,
) -> Result<QueryPlan, PaginationError> {
    if request.next_cursor.is_some() && request.before_cursor.is_some() {
        return Err(PaginationError::Validation(
            "next_cursor and before_cursor are mutually exclusive".into(),
        ));
    }
    if request.limit <= 0 {
        return Err(PaginationError::Validation(format!(
            "limit must be positive, got {}",
            request.limit
        )));
    }
    let limit = request.limit.min(max_limit.max(1)) as usize;

    let (direction, cursor) = match (&request.next_cursor, &request.before_cursor) {
        (_, Some(c)) => (LogicalDirection::Backward, Some(c)),
        (Some(c), None) => (LogicalDirection::Forward, Some(c)),
        (None, None) => (LogicalDirection::Forward, None),
    };

    let (operator, physical_direction) = direction_table(direction, sort.direction);
    let predicate = match cursor {
        Some(c) => {
            sort.check_cursor(c)?;
            Some(KeysetPredicate {
                operator,
                cursor: c.clone(),
            })
        }
        None => None,
    };

    Ok(QueryPlan {
        sort: sort.clone(),
        direction,
        predicate,
        physical_direction,
        limit,
        fetch_limit: limit.saturating_add(1),
        cursor_supplied: cursor.is_some(),
    })
}
