//! Query construction gateway (EMBP).
//!
//! Sibling modules build the individual pieces (conditions, sort,
//! pagination); this gateway re-exports them and owns the assembly step
//! that glues them onto a base `SELECT` in the order Postgres expects.

mod conditions;
mod format;
mod fragment;
mod pagination;
mod sort;

pub use conditions::{build_device_conditions, build_experiment_conditions, MATCH_ALL};
pub use format::{calculate_percentage, format_bytes};
pub use fragment::{ComposedQuery, PositionalQuery, QueryFragment, QueryParams, QueryValue};
pub use pagination::{build_pagination, Pagination, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use sort::{build_sort, SortDirection, SortField, DEFAULT_SORT_FIELD};

// ---

/// `base WHERE expr [sort] [pagination]`.
///
/// The order is fixed: `ORDER BY` has to precede `LIMIT`/`OFFSET`.
pub fn assemble(
    base_query: &str,
    where_expression: &str,
    sort_clause: Option<&str>,
    pagination_clause: Option<&str>,
) -> String {
    // ---
    let mut sql = format!("{} WHERE {}", base_query.trim_end(), where_expression);

    if let Some(sort) = sort_clause {
        sql.push(' ');
        sql.push_str(sort);
    }

    if let Some(pagination) = pagination_clause {
        sql.push(' ');
        sql.push_str(pagination);
    }

    sql
}

/// [`assemble`] plus merging of the where and pagination parameter maps.
pub fn compose(
    base_query: &str,
    filter: QueryFragment,
    sort_clause: Option<&str>,
    pagination: Option<QueryFragment>,
) -> ComposedQuery {
    // ---
    let QueryFragment {
        expression,
        mut params,
    } = filter;

    let pagination_clause = pagination.map(|p| {
        params.extend(p.params);
        p.expression
    });

    ComposedQuery {
        sql: assemble(
            base_query,
            &expression,
            sort_clause,
            pagination_clause.as_deref(),
        ),
        params,
    }
}
