use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::RegistryError;

// ---

/// Timezone of an experiment as reported by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    // ---
    /// IANA identifier, e.g. `America/New_York`.
    pub timezone: String,

    /// Local wall-clock time in that zone when the info was produced.
    pub current_time: DateTime<FixedOffset>,

    /// Offset from UTC at `current_time`, formatted `+HH:MM`.
    pub utc_offset: String,
}

impl TimezoneInfo {
    // ---
    /// Build the info for `timezone` as of `now`.
    pub fn at(timezone: &str, now: DateTime<Utc>) -> Result<Self, RegistryError> {
        // ---
        let tz = parse_zone(timezone)?;
        let local = now.with_timezone(&tz);
        let offset = local.offset().fix();

        Ok(Self {
            timezone: tz.name().to_string(),
            current_time: local.with_timezone(&offset),
            utc_offset: offset.to_string(),
        })
    }

    pub fn zone(&self) -> Result<Tz, RegistryError> {
        parse_zone(&self.timezone)
    }
}

pub(crate) fn parse_zone(timezone: &str) -> Result<Tz, RegistryError> {
    timezone
        .parse::<Tz>()
        .map_err(|_| RegistryError::InvalidTimezone(timezone.to_string()))
}
