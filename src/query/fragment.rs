//! Placeholder-based query fragments and their conversion to bind order.
//!
//! Expressions reference values only through `:name` placeholders; the
//! values live in a parameter map next to the expression. The storage
//! adapter turns a fragment into Postgres positional form (`$1`, `$2`, ...)
//! with [`ComposedQuery::to_positional`].

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

// ---

/// Typed value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    // ---
    Text(String),
    Timestamp(DateTime<Utc>),
    Int(i64),
}

pub type QueryParams = BTreeMap<String, QueryValue>;

/// Filter expression plus the values its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFragment {
    // ---
    pub expression: String,
    pub params: QueryParams,
}

impl QueryFragment {
    // ---
    pub fn new(expression: impl Into<String>, params: QueryParams) -> Self {
        Self {
            expression: expression.into(),
            params,
        }
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        // ---
        let mut names: Vec<String> = Vec::new();
        for (_, _, name) in scan_placeholders(&self.expression) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// A fully assembled statement ready for the storage collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    // ---
    pub sql: String,
    pub params: QueryParams,
}

/// Positional form of a [`ComposedQuery`]: `$n` placeholders and values in
/// bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalQuery {
    // ---
    pub sql: String,
    pub values: Vec<QueryValue>,
}

impl ComposedQuery {
    // ---
    /// Rewrite `:name` placeholders to `$n`. A name used twice keeps the
    /// same position. Fails when a placeholder has no value or a value is
    /// never referenced.
    pub fn to_positional(&self) -> Result<PositionalQuery> {
        // ---
        let mut sql = String::with_capacity(self.sql.len());
        let mut order: Vec<&str> = Vec::new();
        let mut values = Vec::new();
        let mut cursor = 0;

        for (start, end, name) in scan_placeholders(&self.sql) {
            let Some(value) = self.params.get(name) else {
                bail!("placeholder :{} has no bound value", name);
            };

            let position = match order.iter().position(|n| *n == name) {
                Some(idx) => idx + 1,
                None => {
                    order.push(name);
                    values.push(value.clone());
                    order.len()
                }
            };

            sql.push_str(&self.sql[cursor..start]);
            sql.push('$');
            sql.push_str(&position.to_string());
            cursor = end;
        }
        sql.push_str(&self.sql[cursor..]);

        if let Some(unused) = self.params.keys().find(|k| !order.contains(&k.as_str())) {
            bail!("bound value {} is never referenced", unused);
        }

        Ok(PositionalQuery { sql, values })
    }
}

/// Locate `:name` placeholders as `(start, end, name)` byte spans.
///
/// Skips `::type` casts and anything inside single-quoted literals.
pub(crate) fn scan_placeholders(sql: &str) -> Vec<(usize, usize, &str)> {
    // ---
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' {
            in_quote = !in_quote;
            i += 1;
            continue;
        }
        if in_quote || b != b':' {
            i += 1;
            continue;
        }

        // `::cast`
        if bytes.get(i + 1) == Some(&b':') {
            i += 2;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        match bytes.get(end) {
            Some(c) if c.is_ascii_alphabetic() || *c == b'_' => {}
            _ => {
                i += 1;
                continue;
            }
        }
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }

        found.push((start, end, &sql[start + 1..end]));
        i = end;
    }

    found
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn params(pairs: &[(&str, QueryValue)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_scan_skips_casts_and_literals() {
        // ---
        let sql = "SELECT '[]'::jsonb, ':not_me' WHERE a = :a AND b >= NOW() - INTERVAL '1 hour'";
        let names: Vec<&str> = scan_placeholders(sql).into_iter().map(|(_, _, n)| n).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_to_positional_orders_values() {
        // ---
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let query = ComposedQuery {
            sql: "SELECT * FROM t WHERE device_id = :device_id AND packet_timestamp >= :start_time LIMIT :limit OFFSET :offset".into(),
            params: params(&[
                ("device_id", QueryValue::Text("dev-1".into())),
                ("start_time", QueryValue::Timestamp(ts)),
                ("limit", QueryValue::Int(20)),
                ("offset", QueryValue::Int(0)),
            ]),
        };

        let positional = query.to_positional().unwrap();
        assert_eq!(
            positional.sql,
            "SELECT * FROM t WHERE device_id = $1 AND packet_timestamp >= $2 LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            positional.values,
            vec![
                QueryValue::Text("dev-1".into()),
                QueryValue::Timestamp(ts),
                QueryValue::Int(20),
                QueryValue::Int(0),
            ]
        );
    }

    #[test]
    fn test_repeated_placeholder_reuses_position() {
        // ---
        let query = ComposedQuery {
            sql: "WHERE a = :x OR b = :x".into(),
            params: params(&[("x", QueryValue::Int(1))]),
        };
        let positional = query.to_positional().unwrap();
        assert_eq!(positional.sql, "WHERE a = $1 OR b = $1");
        assert_eq!(positional.values.len(), 1);
    }

    #[test]
    fn test_missing_and_unused_params_are_rejected() {
        // ---
        let missing = ComposedQuery {
            sql: "WHERE a = :a".into(),
            params: QueryParams::new(),
        };
        assert!(missing.to_positional().is_err());

        let unused = ComposedQuery {
            sql: "WHERE 1 = 1".into(),
            params: params(&[("a", QueryValue::Int(1))]),
        };
        assert!(unused.to_positional().is_err());
    }
}
