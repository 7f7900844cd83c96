//! Read path of the sensor flow telemetry API.
//!
//! - `query`: placeholder-safe WHERE/ORDER BY/LIMIT construction
//! - `time_window`: symbolic "last N hours" windows
//! - `timezone`: fail-open conversion of UTC timestamps to experiment-local
//!   time
//! - `storage`, `routes`, `schema`, `config`: the service around them
//!
//! Gateways re-export what their siblings need (EMBP), so `routes/*.rs`
//! only ever import from `crate::...` top-level names.

pub mod config;
pub mod models;
pub mod query;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod time_window;
pub mod timezone;

pub use config::Config;
pub use routes::AppState;
pub use storage::{PgTelemetryStore, TelemetryStore};
pub use timezone::{
    HttpTimezoneRegistry, PgTimezoneRegistry, TimezoneEnricher, TimezoneInfo, TimezoneRegistry,
};
