use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::convert::{convert_payload, DEFAULT_TIMESTAMP_FIELDS};
use super::TimezoneInfo;

// ---

#[derive(Debug, Error)]
pub enum RegistryError {
    // ---
    #[error("malformed experiment id: {0:?}")]
    MalformedExperimentId(String),

    #[error("unknown experiment: {0}")]
    UnknownExperiment(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("cannot convert field {field} with value {value}")]
    Conversion { field: String, value: String },

    #[error("registry lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("registry unavailable: {0}")]
    Backend(String),
}

/// Lookup collaborator resolving an experiment to its local timezone.
///
/// Implementations only have to provide [`get_timezone_info`]; the default
/// [`convert_experiment_data`] fetches the info and rewrites the payload
/// with it.
///
/// [`get_timezone_info`]: TimezoneRegistry::get_timezone_info
/// [`convert_experiment_data`]: TimezoneRegistry::convert_experiment_data
#[async_trait]
pub trait TimezoneRegistry: Send + Sync {
    // ---
    async fn get_timezone_info(&self, experiment_id: &str) -> Result<TimezoneInfo, RegistryError>;

    async fn convert_experiment_data(
        &self,
        mut payload: Value,
        experiment_id: &str,
        fields: Option<&[&str]>,
    ) -> Result<Value, RegistryError> {
        // ---
        let info = self.get_timezone_info(experiment_id).await?;
        let tz = info.zone()?;
        convert_payload(
            &mut payload,
            fields.unwrap_or(DEFAULT_TIMESTAMP_FIELDS),
            tz,
        )?;
        Ok(payload)
    }
}

/// Reject ids that cannot name an experiment before touching a backend.
pub(crate) fn check_experiment_id(experiment_id: &str) -> Result<&str, RegistryError> {
    // ---
    let trimmed = experiment_id.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
        return Err(RegistryError::MalformedExperimentId(experiment_id.to_string()));
    }
    Ok(trimmed)
}
