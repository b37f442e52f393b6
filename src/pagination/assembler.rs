//! Turns the rows a store returned for a [`QueryPlan`] into a page.

use super::{Cursor, LogicalDirection, PaginationResult, QueryPlan};

/// Trim the overfetch row, restore logical order, and derive flags and cursors.
///
/// `rows` must be in `plan.physical_direction` order. `cursor_of` builds the
/// cursor for a boundary item.
pub fn assemble<T>(
    plan: &QueryPlan,
    mut rows: Vec<T>,
    cursor_of: impl Fn(&T) -> Cursor,
) -> PaginationResult<T> {
    let has_extra = rows.len() >= plan.fetch_limit;
    rows.truncate(plan.limit);

    let (has_more, has_previous) = match plan.direction {
        LogicalDirection::Forward => (has_extra, plan.cursor_supplied),
        LogicalDirection::Backward => {
            rows.reverse();
            (!rows.is_empty(), has_extra)
        }
    };

    let next_cursor = if has_more { rows.last().map(&cursor_of) } else { None };
    let before_cursor = if has_previous { rows.first().map(&cursor_of) } else { None };

    PaginationResult {
        items: rows,
        has_more,
        has_previous,
        next_cursor,
        before_cursor,
    }
}
