use std::sync::Arc;

use axum::Router;

use crate::storage::TelemetryStore;
use crate::timezone::TimezoneEnricher;
use crate::Config;

mod device_traffic;
mod experiment_devices;
mod health;

// ---

/// Shared handler state: the storage collaborator, the enrichment layer,
/// and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub store: Arc<dyn TelemetryStore>,
    pub enricher: TimezoneEnricher,
    pub config: Config,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(device_traffic::router())
        .merge(experiment_devices::router())
        .merge(health::router())
        .with_state(state)
}
