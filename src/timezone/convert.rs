//! Rewriting of timestamp fields inside arbitrary JSON payloads.
//!
//! The traversal only knows about the three shapes JSON has (objects,
//! arrays, scalars), so new response shapes need no changes here. Values
//! under a matching key are rewritten from UTC to the target zone; every
//! other value is left as is.

use chrono::{DateTime, NaiveDateTime, Offset, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::RegistryError;

// ---

/// Keys treated as timestamps when the caller names none.
pub const DEFAULT_TIMESTAMP_FIELDS: &[&str] = &[
    "created_at",
    "updated_at",
    "last_seen",
    "first_seen",
    "packet_timestamp",
    "timestamp",
    "start_time",
    "end_time",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Rewrite matching fields of `payload` in place.
///
/// Stops at the first value that cannot be parsed; callers that need the
/// untouched payload on failure convert a clone.
pub fn convert_payload(payload: &mut Value, fields: &[&str], tz: Tz) -> Result<(), RegistryError> {
    // ---
    match payload {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if fields.contains(&key.as_str()) {
                    convert_field(key, value, fields, tz)?;
                } else {
                    convert_payload(value, fields, tz)?;
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                convert_payload(item, fields, tz)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn convert_field(key: &str, value: &mut Value, fields: &[&str], tz: Tz) -> Result<(), RegistryError> {
    // ---
    match value {
        Value::String(raw) => {
            let utc = parse_utc(raw).ok_or_else(|| RegistryError::Conversion {
                field: key.to_string(),
                value: raw.clone(),
            })?;
            *raw = to_local_rfc3339(utc, tz);
            Ok(())
        }
        Value::Null => Ok(()),
        // A timestamp key holding a nested structure, e.g. `{"timestamp": {...}}`
        Value::Object(_) | Value::Array(_) => convert_payload(value, fields, tz),
        Value::Bool(_) | Value::Number(_) => Err(RegistryError::Conversion {
            field: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse a stored timestamp. Values without an offset are UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// RFC 3339 in the zone's numeric offset at that instant.
pub fn to_local_rfc3339(utc: DateTime<Utc>, tz: Tz) -> String {
    // ---
    let local = utc.with_timezone(&tz);
    let offset = local.offset().fix();
    local.with_timezone(&offset).to_rfc3339()
}
