//! Fail-open timezone enrichment of response payloads.
//!
//! Enrichment is a display concern. Whatever goes wrong while looking up
//! or converting, the caller gets the payload it handed in, and the
//! failure shows up as a single `WARN` event.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

use super::{RegistryError, TimezoneInfo, TimezoneRegistry};

// ---

/// Where a wrapped operation carries its experiment id.
///
/// Looked up by `name` among the named arguments first, then at
/// `position` among the positional ones when one is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentArg {
    // ---
    pub name: &'static str,
    pub position: Option<usize>,
}

impl ExperimentArg {
    // ---
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            position: None,
        }
    }

    pub const fn named_or_at(name: &'static str, position: usize) -> Self {
        Self {
            name,
            position: Some(position),
        }
    }

    pub fn locate<'a>(
        &self,
        named: &'a HashMap<String, String>,
        positional: &'a [String],
    ) -> Option<&'a str> {
        // ---
        named
            .get(self.name)
            .or_else(|| self.position.and_then(|idx| positional.get(idx)))
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Applies experiment-local time to response payloads.
#[derive(Clone)]
pub struct TimezoneEnricher {
    // ---
    registry: Arc<dyn TimezoneRegistry>,
    lookup_timeout: Duration,
}

impl TimezoneEnricher {
    // ---
    pub fn new(registry: Arc<dyn TimezoneRegistry>, lookup_timeout: Duration) -> Self {
        Self {
            registry,
            lookup_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<dyn TimezoneRegistry> {
        &self.registry
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Convert timestamp fields of `payload` to the experiment's zone.
    ///
    /// Without an experiment id the registry is not consulted. On any
    /// failure the original payload is returned.
    pub async fn enrich(
        &self,
        payload: Value,
        experiment_id: Option<&str>,
        fields: Option<&[&str]>,
    ) -> Value {
        // ---
        let Some(experiment_id) = experiment_id.filter(|id| !id.is_empty()) else {
            return payload;
        };

        let lookup = self
            .registry
            .convert_experiment_data(payload.clone(), experiment_id, fields);

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(converted)) => {
                debug!(experiment_id, "Converted payload to experiment timezone");
                converted
            }
            Ok(Err(e)) => {
                warn!(experiment_id, error = %e, "Timezone enrichment failed, returning UTC data");
                payload
            }
            Err(_) => {
                warn!(
                    experiment_id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Timezone lookup timed out, returning UTC data"
                );
                payload
            }
        }
    }

    /// Run `op` and enrich its result with the experiment id found through
    /// `arg`. Errors from `op` pass through untouched; a missing id leaves
    /// the result unconverted.
    pub async fn wrap<F, Fut, E>(
        &self,
        arg: ExperimentArg,
        named: &HashMap<String, String>,
        positional: &[String],
        fields: Option<&[&str]>,
        op: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        // ---
        let result = op().await?;
        match arg.locate(named, positional) {
            Some(experiment_id) => Ok(self.enrich(result, Some(experiment_id), fields).await),
            None => {
                debug!(arg = arg.name, "No experiment id located, skipping enrichment");
                Ok(result)
            }
        }
    }
}

// ---

/// Add a `timezone_info` block to `response` from a synchronous context.
///
/// Blocks on the registry lookup for at most `lookup_timeout`. Needs either
/// no runtime on the current thread or a multi-thread runtime; on a
/// current-thread runtime, on expiry, and on any lookup failure, `response`
/// is left as it was.
pub fn attach_timezone_metadata(
    registry: &dyn TimezoneRegistry,
    response: &mut Map<String, Value>,
    experiment_id: &str,
    lookup_timeout: Duration,
) {
    // ---
    match fetch_info_blocking(registry, experiment_id, lookup_timeout) {
        Ok(info) => match serde_json::to_value(&info) {
            Ok(block) => {
                response.insert("timezone_info".to_string(), block);
            }
            Err(e) => {
                warn!(experiment_id, error = %e, "Failed to attach timezone info");
            }
        },
        Err(e) => {
            warn!(experiment_id, error = %e, "Failed to attach timezone info");
        }
    }
}

fn fetch_info_blocking(
    registry: &dyn TimezoneRegistry,
    experiment_id: &str,
    lookup_timeout: Duration,
) -> Result<TimezoneInfo, RegistryError> {
    // ---
    let lookup = async {
        tokio::time::timeout(lookup_timeout, registry.get_timezone_info(experiment_id))
            .await
            .map_err(|_| RegistryError::Timeout(lookup_timeout.as_millis() as u64))?
    };

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(lookup))
        }
        Ok(_) => Err(RegistryError::Backend(
            "cannot block on a current-thread runtime".to_string(),
        )),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .block_on(lookup),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::timezone::testing::{count_warnings, MockRegistry};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn enricher(registry: Arc<MockRegistry>) -> TimezoneEnricher {
        TimezoneEnricher::new(registry, Duration::from_secs(1))
    }

    fn payload() -> Value {
        json!({
            "device_id": "dev-1",
            "items": [{"packet_timestamp": "2025-01-15T18:00:00Z", "total_bytes": 10}]
        })
    }

    #[tokio::test]
    async fn test_enrich_converts_nested_fields() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("America/New_York"));
        let out = enricher(registry.clone()).enrich(payload(), Some("exp-1"), None).await;

        assert_eq!(out["items"][0]["packet_timestamp"], "2025-01-15T13:00:00-05:00");
        assert_eq!(out["items"][0]["total_bytes"], 10);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_enrich_without_experiment_skips_registry() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("America/New_York"));
        let enricher = enricher(registry.clone());

        assert_eq!(enricher.enrich(payload(), None, None).await, payload());
        assert_eq!(enricher.enrich(payload(), Some(""), None).await, payload());
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_registry_returns_original_with_one_warning() {
        // ---
        let registry = Arc::new(MockRegistry::unreachable());
        let enricher = enricher(registry.clone());

        let (out, warnings) =
            count_warnings(enricher.enrich(payload(), Some("exp-1"), None)).await;

        assert_eq!(out, payload());
        assert_eq!(warnings, 1);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_conversion_failure_returns_original() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("America/New_York"));
        let bad = json!({"items": [{"created_at": "2025-01-15T18:00:00Z"}, {"created_at": "soon"}]});

        let (out, warnings) =
            count_warnings(enricher(registry).enrich(bad.clone(), Some("exp-1"), None)).await;

        assert_eq!(out, bad);
        assert_eq!(warnings, 1);
    }

    #[tokio::test]
    async fn test_slow_registry_times_out() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("UTC").delayed(Duration::from_millis(200)));
        let enricher = TimezoneEnricher::new(registry, Duration::from_millis(20));

        let (out, warnings) = count_warnings(enricher.enrich(payload(), Some("exp-1"), None)).await;
        assert_eq!(out, payload());
        assert_eq!(warnings, 1);
    }

    #[tokio::test]
    async fn test_wrap_locates_named_then_positional() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("America/New_York"));
        let enricher = enricher(registry.clone());
        let arg = ExperimentArg::named_or_at("experiment_id", 0);

        let named: HashMap<String, String> = HashMap::new();
        let positional = vec!["exp-9".to_string()];
        let out = enricher
            .wrap(arg, &named, &positional, None, || async {
                Ok::<_, std::convert::Infallible>(payload())
            })
            .await
            .unwrap();
        assert_eq!(out["items"][0]["packet_timestamp"], "2025-01-15T13:00:00-05:00");
        assert_eq!(registry.last_experiment().as_deref(), Some("exp-9"));

        let named = HashMap::from([("experiment_id".to_string(), "exp-named".to_string())]);
        enricher
            .wrap(arg, &named, &positional, None, || async {
                Ok::<_, std::convert::Infallible>(payload())
            })
            .await
            .unwrap();
        assert_eq!(registry.last_experiment().as_deref(), Some("exp-named"));
    }

    #[tokio::test]
    async fn test_wrap_without_id_or_on_error() {
        // ---
        let registry = Arc::new(MockRegistry::with_zone("America/New_York"));
        let enricher = enricher(registry.clone());
        let named = HashMap::new();

        let out = enricher
            .wrap(ExperimentArg::named("experiment_id"), &named, &[], None, || async {
                Ok::<_, String>(payload())
            })
            .await;
        assert_eq!(out, Ok(payload()));

        let err = enricher
            .wrap(ExperimentArg::named("experiment_id"), &named, &[], None, || async {
                Err::<Value, _>("storage down".to_string())
            })
            .await;
        assert_eq!(err, Err("storage down".to_string()));
        assert_eq!(registry.calls(), 0);
    }

    #[test]
    fn test_attach_metadata_without_runtime() {
        // ---
        let registry = MockRegistry::with_zone("America/New_York")
            .at(Utc.with_ymd_and_hms(2025, 1, 15, 18, 0, 0).unwrap());
        let mut response = Map::new();
        response.insert("experiment_id".into(), json!("exp-1"));

        attach_timezone_metadata(&registry, &mut response, "exp-1", Duration::from_secs(1));

        let info = &response["timezone_info"];
        assert_eq!(info["timezone"], "America/New_York");
        assert_eq!(info["utc_offset"], "-05:00");
        assert_eq!(info["current_time"], "2025-01-15T13:00:00-05:00");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_attach_metadata_inside_multi_thread_runtime() {
        // ---
        let registry = MockRegistry::with_zone("Asia/Kolkata");
        let mut response = Map::new();

        attach_timezone_metadata(&registry, &mut response, "exp-1", Duration::from_secs(1));
        assert_eq!(response["timezone_info"]["utc_offset"], "+05:30");
    }

    #[tokio::test]
    async fn test_attach_metadata_failure_leaves_response() {
        // ---
        let registry = MockRegistry::unreachable();
        let mut response = Map::new();
        response.insert("experiment_id".into(), json!("exp-1"));
        let before = response.clone();

        let ((), warnings) = count_warnings(async {
            attach_timezone_metadata(&registry, &mut response, "exp-1", Duration::from_secs(1));
        })
        .await;

        assert_eq!(response, before);
        assert_eq!(warnings, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_attach_metadata_gives_up_after_timeout() {
        // ---
        let registry = MockRegistry::with_zone("UTC").delayed(Duration::from_secs(5));
        let mut response = Map::new();
        response.insert("experiment_id".into(), json!("exp-1"));
        let before = response.clone();

        let started = std::time::Instant::now();
        let ((), warnings) = count_warnings(async {
            attach_timezone_metadata(&registry, &mut response, "exp-1", Duration::from_millis(50));
        })
        .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response, before);
        assert_eq!(warnings, 1);
        assert_eq!(registry.calls(), 1);
    }

    #[test]
    fn test_attach_metadata_timeout_without_runtime() {
        // ---
        let registry = MockRegistry::with_zone("UTC").delayed(Duration::from_secs(5));
        let mut response = Map::new();

        let started = std::time::Instant::now();
        attach_timezone_metadata(&registry, &mut response, "exp-1", Duration::from_millis(50));

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!response.contains_key("timezone_info"));
    }
}
