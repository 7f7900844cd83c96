//! Symbolic time windows ("last N hours") used by the read routes.
//!
//! A window token resolves to a concrete `[start, end)` range ending at a
//! reference instant, and independently to an interval literal that can be
//! embedded in a Postgres `INTERVAL '...'` expression. Resolution is total:
//! unknown tokens fall back to the 24 hour window. Callers that need to
//! reject bad input check [`is_valid`] first.

use chrono::{DateTime, Duration, Utc};

use crate::query::SortField;

// ---

/// Fixed set of supported windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    // ---
    OneHour,
    TwoHours,
    SixHours,
    TwelveHours,
    TwentyFourHours,
    FortyEightHours,
}

/// Window used for any token outside the supported table.
pub const DEFAULT_WINDOW: TimeWindow = TimeWindow::TwentyFourHours;

impl TimeWindow {
    // ---
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::OneHour,
        TimeWindow::TwoHours,
        TimeWindow::SixHours,
        TimeWindow::TwelveHours,
        TimeWindow::TwentyFourHours,
        TimeWindow::FortyEightHours,
    ];

    /// Strict lookup; `None` for anything outside the table.
    pub fn parse(token: &str) -> Option<Self> {
        // ---
        match token.trim() {
            "1h" => Some(TimeWindow::OneHour),
            "2h" => Some(TimeWindow::TwoHours),
            "6h" => Some(TimeWindow::SixHours),
            "12h" => Some(TimeWindow::TwelveHours),
            "24h" => Some(TimeWindow::TwentyFourHours),
            "48h" => Some(TimeWindow::FortyEightHours),
            _ => None,
        }
    }

    /// Lenient lookup; unknown tokens map to [`DEFAULT_WINDOW`].
    pub fn from_token(token: &str) -> Self {
        Self::parse(token).unwrap_or(DEFAULT_WINDOW)
    }

    pub fn token(self) -> &'static str {
        // ---
        match self {
            TimeWindow::OneHour => "1h",
            TimeWindow::TwoHours => "2h",
            TimeWindow::SixHours => "6h",
            TimeWindow::TwelveHours => "12h",
            TimeWindow::TwentyFourHours => "24h",
            TimeWindow::FortyEightHours => "48h",
        }
    }

    pub fn hours(self) -> i64 {
        // ---
        match self {
            TimeWindow::OneHour => 1,
            TimeWindow::TwoHours => 2,
            TimeWindow::SixHours => 6,
            TimeWindow::TwelveHours => 12,
            TimeWindow::TwentyFourHours => 24,
            TimeWindow::FortyEightHours => 48,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::hours(self.hours())
    }

    /// Literal for `INTERVAL '...'`, e.g. `"1 hour"` or `"6 hours"`.
    pub fn interval_literal(self) -> &'static str {
        // ---
        match self {
            TimeWindow::OneHour => "1 hour",
            TimeWindow::TwoHours => "2 hours",
            TimeWindow::SixHours => "6 hours",
            TimeWindow::TwelveHours => "12 hours",
            TimeWindow::TwentyFourHours => "24 hours",
            TimeWindow::FortyEightHours => "48 hours",
        }
    }

    /// Range ending exactly at `reference`.
    pub fn range_ending_at(self, reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (reference - self.duration(), reference)
    }

    /// Server-side "within the last N hours" condition on an allow-listed
    /// column. Both the column and the literal come from closed sets, so
    /// nothing caller-supplied reaches the SQL text.
    pub fn recent_condition(self, column: SortField) -> String {
        format!(
            "{} >= NOW() - INTERVAL '{}'",
            column.as_str(),
            self.interval_literal()
        )
    }
}

// ---

/// Resolve `token` to `(start, end)`. `end` is `reference`, or now when
/// omitted.
pub fn resolve(token: &str, reference: Option<DateTime<Utc>>) -> (DateTime<Utc>, DateTime<Utc>) {
    // ---
    let end = reference.unwrap_or_else(Utc::now);
    TimeWindow::from_token(token).range_ending_at(end)
}

pub fn duration_of(token: &str) -> Duration {
    TimeWindow::from_token(token).duration()
}

pub fn interval_literal_of(token: &str) -> &'static str {
    TimeWindow::from_token(token).interval_literal()
}

pub fn is_valid(token: &str) -> bool {
    TimeWindow::parse(token).is_some()
}
