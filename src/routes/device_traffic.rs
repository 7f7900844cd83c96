//! Per-device traffic routes.
//!
//! - `GET /api/devices/{device_id}/traffic`: paged flow samples
//! - `GET /api/devices/{device_id}/protocols`: bytes per protocol
//!
//! Both take the experiment id from the query string, so enrichment looks
//! it up by name only.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info};

use super::AppState;
use crate::models::{ProtocolUsage, TelemetryQuery};
use crate::query::{build_device_conditions, build_sort, compose, ComposedQuery, SortField};
use crate::storage::json_rows;
use crate::timezone::ExperimentArg;

// ---

const TRAFFIC_BASE: &str = "SELECT device_id, experiment_id, packet_timestamp, protocol, port, \
     total_packets, total_bytes, created_at FROM packet_traffic";

const TRAFFIC_SORTABLE: [SortField; 7] = [
    SortField::CreatedAt,
    SortField::PacketTimestamp,
    SortField::ExperimentId,
    SortField::Protocol,
    SortField::Port,
    SortField::TotalPackets,
    SortField::TotalBytes,
];

const EXPERIMENT_QUERY_ARG: ExperimentArg = ExperimentArg::named("experiment_id");

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/devices/{device_id}/traffic", get(traffic_handler))
        .route("/api/devices/{device_id}/protocols", get(protocols_handler))
}

async fn traffic_handler(
    Path(device_id): Path<String>,
    Query(params): Query<TelemetryQuery>,
    Query(raw): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/devices/{}/traffic", device_id);

    let (start, end) = params.time_range(Utc::now());
    let pagination = params.pagination(state.config.default_page_size);
    let sort = build_sort(params.sort_field(&TRAFFIC_SORTABLE), params.sort_order());

    let query = compose(
        &json_rows(TRAFFIC_BASE),
        build_device_conditions(&device_id, params.experiment_id.as_deref(), start, end),
        Some(&sort),
        Some(pagination.to_fragment()),
    );
    debug!("Traffic query: {}", query.sql);

    let result = state
        .enricher
        .wrap(EXPERIMENT_QUERY_ARG, &raw, &[], None, || async {
            let items = state.store.fetch_rows(&query).await?;
            Ok::<_, anyhow::Error>(json!({
                "device_id": device_id,
                "experiment_id": params.experiment_id,
                "page": pagination.page,
                "page_size": pagination.page_size,
                "start_time": start,
                "end_time": end,
                "items": items,
            }))
        })
        .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Failed to fetch traffic for device {}: {}", device_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch traffic"),
            )
                .into_response()
        }
    }
}

async fn protocols_handler(
    Path(device_id): Path<String>,
    Query(params): Query<TelemetryQuery>,
    Query(raw): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/devices/{}/protocols", device_id);

    let (start, end) = params.time_range(Utc::now());
    let query = protocol_usage_query(&device_id, params.experiment_id.as_deref(), start, end);
    debug!("Protocol usage query: {}", query.sql);

    let result = state
        .enricher
        .wrap(EXPERIMENT_QUERY_ARG, &raw, &[], None, || async {
            let rows = state.store.fetch_rows(&query).await?;
            let usage = rows
                .into_iter()
                .map(serde_json::from_value::<ProtocolUsage>)
                .collect::<Result<Vec<_>, _>>()?;

            let all_bytes: i64 = usage.iter().map(|u| u.total_bytes).sum();
            let protocols: Vec<_> = usage.iter().map(|u| u.to_summary(all_bytes)).collect();

            Ok::<_, anyhow::Error>(json!({
                "device_id": device_id,
                "experiment_id": params.experiment_id,
                "start_time": start,
                "end_time": end,
                "total_bytes": all_bytes,
                "protocols": protocols,
            }))
        })
        .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Failed to fetch protocol usage for device {}: {}", device_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch protocol usage"),
            )
                .into_response()
        }
    }
}

/// Filter the flow rows first, then aggregate; `assemble` has no slot for
/// `GROUP BY`, so the filtered set becomes a subquery and the ordering is
/// applied to the aggregated rows.
fn protocol_usage_query(
    device_id: &str,
    experiment_id: Option<&str>,
    start: Option<chrono::DateTime<Utc>>,
    end: Option<chrono::DateTime<Utc>>,
) -> ComposedQuery {
    // ---
    let filtered = compose(
        TRAFFIC_BASE,
        build_device_conditions(device_id, experiment_id, start, end),
        None,
        None,
    );

    let aggregated = format!(
        "SELECT protocol, SUM(total_bytes)::BIGINT AS total_bytes, \
         SUM(total_packets)::BIGINT AS total_packets \
         FROM ({}) AS f GROUP BY protocol",
        filtered.sql
    );

    ComposedQuery {
        sql: format!(
            "{} {}",
            json_rows(&aggregated),
            build_sort(SortField::TotalBytes.as_str(), "DESC")
        ),
        params: filtered.params,
    }
}
