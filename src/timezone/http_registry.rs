use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::debug;

use super::registry::check_experiment_id;
use super::{RegistryError, TimezoneInfo, TimezoneRegistry};

// ---

/// Client for a remote registry serving
/// `GET {base}/experiments/{experiment_id}/timezone`.
#[derive(Clone)]
pub struct HttpTimezoneRegistry {
    // ---
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTimezoneRegistry {
    // ---
    /// `request_timeout` bounds each request end to end, connect included.
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        // ---
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid TIMEZONE_REGISTRY_URL '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("TIMEZONE_REGISTRY_URL '{}' cannot be a base URL", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build registry client: {}", e))?;

        Ok(Self { client, base_url })
    }

    /// Path segments are percent-encoded by `Url`, so the id cannot alter
    /// the route.
    pub fn info_url(&self, experiment_id: &str) -> Url {
        // ---
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["experiments", experiment_id, "timezone"]);
        }
        url
    }
}

#[async_trait]
impl TimezoneRegistry for HttpTimezoneRegistry {
    // ---
    async fn get_timezone_info(&self, experiment_id: &str) -> Result<TimezoneInfo, RegistryError> {
        // ---
        let experiment_id = check_experiment_id(experiment_id)?;
        let url = self.info_url(experiment_id);
        debug!("Fetching timezone info from: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::UnknownExperiment(experiment_id.to_string()));
        }

        let info: TimezoneInfo = response
            .error_for_status()
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .json()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?;

        // Reject zones we could not convert with later
        info.zone()?;
        Ok(info)
    }
}
