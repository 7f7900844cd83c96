use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::registry::check_experiment_id;
use super::{RegistryError, TimezoneInfo, TimezoneRegistry};

// ---

/// Registry backed by the `experiments` table.
#[derive(Clone)]
pub struct PgTimezoneRegistry {
    pool: PgPool,
}

impl PgTimezoneRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimezoneRegistry for PgTimezoneRegistry {
    // ---
    async fn get_timezone_info(&self, experiment_id: &str) -> Result<TimezoneInfo, RegistryError> {
        // ---
        let experiment_id = check_experiment_id(experiment_id)?;

        let timezone =
            sqlx::query_scalar::<_, String>("SELECT timezone FROM experiments WHERE experiment_id = $1")
                .bind(experiment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RegistryError::Backend(e.to_string()))?;

        let timezone =
            timezone.ok_or_else(|| RegistryError::UnknownExperiment(experiment_id.to_string()))?;

        debug!(experiment_id, timezone = %timezone, "Resolved experiment timezone");
        TimezoneInfo::at(&timezone, Utc::now())
    }
}
