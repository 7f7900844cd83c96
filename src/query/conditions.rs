//! WHERE-clause builders for device and experiment scoped queries.
//!
//! Every caller-supplied value is bound through a named placeholder; the
//! expression text only ever contains column names and placeholder names
//! chosen here.

use chrono::{DateTime, Utc};

use super::fragment::{QueryFragment, QueryParams, QueryValue};

// ---

/// No-op filter used when there is nothing to narrow by. Composes with
/// `AND` and with [`super::assemble`] the same way a real condition does.
pub const MATCH_ALL: &str = "1 = 1";

/// Conditions for a single device.
///
/// Precondition: `device_id` is non-empty and `start <= end` when both are
/// given. Neither is checked here.
pub fn build_device_conditions(
    device_id: &str,
    experiment_id: Option<&str>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> QueryFragment {
    // ---
    let mut clauses = vec!["device_id = :device_id"];
    let mut params = QueryParams::new();
    params.insert("device_id".into(), QueryValue::Text(device_id.to_string()));

    if let Some(experiment_id) = experiment_id {
        clauses.push("experiment_id = :experiment_id");
        params.insert(
            "experiment_id".into(),
            QueryValue::Text(experiment_id.to_string()),
        );
    }

    if let Some(start) = start {
        clauses.push("packet_timestamp >= :start_time");
        params.insert("start_time".into(), QueryValue::Timestamp(start));
    }

    if let Some(end) = end {
        clauses.push("packet_timestamp <= :end_time");
        params.insert("end_time".into(), QueryValue::Timestamp(end));
    }

    QueryFragment::new(clauses.join(" AND "), params)
}

/// Equality on experiment id, or [`MATCH_ALL`] with no parameters.
pub fn build_experiment_conditions(experiment_id: Option<&str>) -> QueryFragment {
    // ---
    match experiment_id {
        Some(experiment_id) => {
            let mut params = QueryParams::new();
            params.insert(
                "experiment_id".into(),
                QueryValue::Text(experiment_id.to_string()),
            );
            QueryFragment::new("experiment_id = :experiment_id", params)
        }
        None => QueryFragment::new(MATCH_ALL, QueryParams::new()),
    }
}
