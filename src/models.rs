//! Request and row models for the telemetry read routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{calculate_percentage, format_bytes, Pagination, SortField, DEFAULT_SORT_FIELD};
use crate::time_window;

// ---

/// Query string accepted by the device and experiment listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct TelemetryQuery {
    // ---
    pub experiment_id: Option<String>,
    /// Symbolic window such as `6h`; ignored when explicit bounds are given.
    pub window: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TelemetryQuery {
    // ---
    /// Explicit bounds win; otherwise a `window` resolves against `now`.
    pub fn time_range(
        &self,
        now: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        // ---
        if self.start_time.is_some() || self.end_time.is_some() {
            return (self.start_time, self.end_time);
        }
        match self.window.as_deref() {
            Some(token) => {
                let (start, end) = time_window::resolve(token, Some(now));
                (Some(start), Some(end))
            }
            None => (None, None),
        }
    }

    pub fn pagination(&self, default_page_size: u32) -> Pagination {
        Pagination::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size as i64),
        )
    }

    /// Requested sort column if the route exposes it, else the default.
    pub fn sort_field(&self, sortable: &[SortField]) -> &'static str {
        // ---
        self.sort_by
            .as_deref()
            .and_then(SortField::parse)
            .filter(|f| sortable.contains(f))
            .unwrap_or(DEFAULT_SORT_FIELD)
            .as_str()
    }

    pub fn sort_order(&self) -> &str {
        self.sort_order.as_deref().unwrap_or("DESC")
    }
}

/// Aggregated traffic of one protocol, as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolUsage {
    // ---
    pub protocol: String,
    pub total_bytes: i64,
    pub total_packets: i64,
}

/// Protocol usage with display fields for the API response.
#[derive(Debug, Serialize)]
pub struct ProtocolSummary {
    // ---
    pub protocol: String,
    pub total_bytes: i64,
    pub total_bytes_human: String,
    pub total_packets: i64,
    pub percentage: f64,
}

impl ProtocolUsage {
    // ---
    pub fn to_summary(&self, all_bytes: i64) -> ProtocolSummary {
        // ---
        ProtocolSummary {
            protocol: self.protocol.clone(),
            total_bytes: self.total_bytes,
            total_bytes_human: format_bytes(self.total_bytes.max(0) as u64),
            total_packets: self.total_packets,
            percentage: calculate_percentage(self.total_bytes as f64, all_bytes as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap()
    }

    #[test]
    fn test_time_range_from_window() {
        // ---
        let q = TelemetryQuery {
            window: Some("6h".into()),
            ..Default::default()
        };
        let (start, end) = q.time_range(now());
        assert_eq!(end, Some(now()));
        assert_eq!(start, Some(now() - Duration::hours(6)));
    }

    #[test]
    fn test_explicit_bounds_win() {
        // ---
        let start = now() - Duration::days(3);
        let q = TelemetryQuery {
            window: Some("1h".into()),
            start_time: Some(start),
            ..Default::default()
        };
        assert_eq!(q.time_range(now()), (Some(start), None));
        assert_eq!(TelemetryQuery::default().time_range(now()), (None, None));
    }

    #[test]
    fn test_sort_field_respects_route_columns() {
        // ---
        let q = TelemetryQuery {
            sort_by: Some("total_bytes".into()),
            ..Default::default()
        };
        assert_eq!(q.sort_field(&[SortField::TotalBytes]), "total_bytes");
        assert_eq!(q.sort_field(&[SortField::DeviceName]), "created_at");
        assert_eq!(TelemetryQuery::default().sort_field(&SortField::ALL), "created_at");
    }

    #[test]
    fn test_pagination_defaults() {
        // ---
        let q = TelemetryQuery::default();
        assert_eq!(q.pagination(50), Pagination::new(1, 50));
    }

    #[test]
    fn test_protocol_summary() {
        // ---
        let usage = ProtocolUsage {
            protocol: "TCP".into(),
            total_bytes: 2048,
            total_packets: 12,
        };
        let summary = usage.to_summary(8192);
        assert_eq!(summary.total_bytes_human, "2.0 KB");
        assert_eq!(summary.percentage, 25.0);
        assert_eq!(usage.to_summary(0).percentage, 0.0);
    }
}
