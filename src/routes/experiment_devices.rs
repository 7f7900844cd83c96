//! Experiment scoped routes.
//!
//! - `GET /api/experiments/{experiment_id}/devices`
//! - `GET /api/experiments/{experiment_id}/devices/active?window=6h`
//! - `GET /api/experiments/{experiment_id}/timezone`
//!
//! The experiment id is a path segment here; enrichment finds it at
//! position 0 when the query string does not name one.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use super::AppState;
use crate::models::TelemetryQuery;
use crate::query::{build_experiment_conditions, build_sort, compose, QueryFragment, SortField};
use crate::storage::json_rows;
use crate::time_window::TimeWindow;
use crate::timezone::{attach_timezone_metadata, ExperimentArg};

// ---

const DEVICES_BASE: &str = "SELECT device_id, experiment_id, device_name, mac_address, \
     device_type, manufacturer, first_seen, last_seen, created_at, updated_at FROM devices";

const DEVICES_SORTABLE: [SortField; 8] = [
    SortField::CreatedAt,
    SortField::UpdatedAt,
    SortField::DeviceName,
    SortField::MacAddress,
    SortField::LastSeen,
    SortField::DeviceType,
    SortField::Manufacturer,
    SortField::ExperimentId,
];

const EXPERIMENT_PATH_ARG: ExperimentArg = ExperimentArg::named_or_at("experiment_id", 0);

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/experiments/{experiment_id}/devices", get(devices_handler))
        .route(
            "/api/experiments/{experiment_id}/devices/active",
            get(active_devices_handler),
        )
        .route(
            "/api/experiments/{experiment_id}/timezone",
            get(timezone_handler),
        )
}

async fn devices_handler(
    Path(experiment_id): Path<String>,
    Query(params): Query<TelemetryQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/experiments/{}/devices", experiment_id);

    let filter = build_experiment_conditions(Some(&experiment_id));
    list_devices(state, experiment_id, params, filter, None).await
}

async fn active_devices_handler(
    Path(experiment_id): Path<String>,
    Query(params): Query<TelemetryQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let window = TimeWindow::from_token(params.window.as_deref().unwrap_or_default());
    info!(
        "GET /api/experiments/{}/devices/active (window {})",
        experiment_id,
        window.token()
    );

    let mut filter = build_experiment_conditions(Some(&experiment_id));
    filter.expression = format!(
        "{} AND {}",
        filter.expression,
        window.recent_condition(SortField::LastSeen)
    );
    list_devices(state, experiment_id, params, filter, Some(window)).await
}

async fn list_devices(
    state: AppState,
    experiment_id: String,
    params: TelemetryQuery,
    filter: QueryFragment,
    window: Option<TimeWindow>,
) -> axum::response::Response {
    // ---
    let pagination = params.pagination(state.config.default_page_size);
    let sort = build_sort(params.sort_field(&DEVICES_SORTABLE), params.sort_order());
    let query = compose(
        &json_rows(DEVICES_BASE),
        filter,
        Some(&sort),
        Some(pagination.to_fragment()),
    );
    debug!("Devices query: {}", query.sql);

    // Path segments are positional; nothing is passed by name here
    let named = HashMap::new();
    let positional = [experiment_id.clone()];

    let result = state
        .enricher
        .wrap(EXPERIMENT_PATH_ARG, &named, &positional, None, || async {
            let items = state.store.fetch_rows(&query).await?;
            Ok::<_, anyhow::Error>(json!({
                "experiment_id": experiment_id,
                "window": window.map(TimeWindow::token),
                "page": pagination.page,
                "page_size": pagination.page_size,
                "items": items,
            }))
        })
        .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Failed to list devices for experiment {}: {}", experiment_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to list devices"),
            )
                .into_response()
        }
    }
}

/// Always 200; `timezone_info` is simply absent when the registry fails.
async fn timezone_handler(
    Path(experiment_id): Path<String>,
    State(state): State<AppState>,
) -> Json<Value> {
    // ---
    info!("GET /api/experiments/{}/timezone", experiment_id);

    let mut body = Map::new();
    body.insert("experiment_id".to_string(), Value::from(experiment_id.as_str()));
    attach_timezone_metadata(
        state.enricher.registry().as_ref(),
        &mut body,
        &experiment_id,
        state.enricher.lookup_timeout(),
    );

    Json(Value::Object(body))
}
