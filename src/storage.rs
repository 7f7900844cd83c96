//! Storage collaborator seam.
//!
//! The read routes only hand over a [`ComposedQuery`]; binding and
//! execution live behind [`TelemetryStore`] so handlers never touch a
//! connection.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use crate::query::{ComposedQuery, QueryValue};

// ---

/// Project every row of `select` as a single JSON object column.
///
/// Clauses appended to the result (`WHERE`, `ORDER BY`, `LIMIT`) belong to
/// the outermost query, so the row order is the one they ask for. They can
/// only name columns `select` projects.
pub fn json_rows(select: &str) -> String {
    format!("SELECT to_jsonb(r) FROM ({}) AS r", select.trim_end())
}

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Execute `query` and return its rows. `query` selects one JSON column
    /// per row, as built on top of [`json_rows`].
    async fn fetch_rows(&self, query: &ComposedQuery) -> Result<Vec<Value>>;
}

#[derive(Clone)]
pub struct PgTelemetryStore {
    pool: PgPool,
}

impl PgTelemetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryStore for PgTelemetryStore {
    // ---
    async fn fetch_rows(&self, query: &ComposedQuery) -> Result<Vec<Value>> {
        // ---
        let positional = query.to_positional()?;
        debug!(sql = %positional.sql, binds = positional.values.len(), "Executing telemetry query");

        let mut statement = sqlx::query_scalar::<_, Value>(&positional.sql);
        for value in positional.values {
            statement = match value {
                QueryValue::Text(s) => statement.bind(s),
                QueryValue::Timestamp(ts) => statement.bind(ts),
                QueryValue::Int(i) => statement.bind(i),
            };
        }

        let rows = statement.fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "Telemetry query returned rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::query::{build_pagination, build_sort, compose, QueryFragment, QueryParams};

    #[test]
    fn test_json_rows_wraps_projection() {
        // ---
        assert_eq!(
            json_rows("SELECT a, b FROM t  "),
            "SELECT to_jsonb(r) FROM (SELECT a, b FROM t) AS r"
        );
    }

    #[test]
    fn test_sort_and_pagination_stay_outermost() {
        // ---
        let mut params = QueryParams::new();
        params.insert("id".into(), QueryValue::Text("x".into()));
        let query = compose(
            &json_rows("SELECT id, port FROM t"),
            QueryFragment::new("id = :id", params),
            Some(&build_sort("port", "ASC")),
            Some(build_pagination(2, 10)),
        );
        let positional = query.to_positional().unwrap();

        assert_eq!(
            positional.sql,
            "SELECT to_jsonb(r) FROM (SELECT id, port FROM t) AS r \
             WHERE id = $1 ORDER BY port ASC LIMIT $2 OFFSET $3"
        );
        // Nothing wraps the ordered query again
        assert_eq!(positional.sql.matches("SELECT").count(), 2);
        assert!(positional.sql.rfind("ORDER BY") > positional.sql.rfind(')'));
    }
}
