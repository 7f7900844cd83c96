//! Configuration loader for the `sensorflow-telemetry` read service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP server binds on.
    pub http_port: u16,

    /// Page size used when a request does not give one.
    pub default_page_size: u32,

    /// Upper bound on a single timezone registry lookup.
    pub tz_lookup_timeout: Duration,

    /// Remote timezone registry. When unset, experiments are resolved from
    /// the local `experiments` table.
    pub registry_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: String::new(),
            db_pool_max: 5,
            http_port: 8080,
            default_page_size: 20,
            tz_lookup_timeout: Duration::from_millis(3000),
            registry_url: None,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HTTP_PORT` – listen port (default: 8080)
/// - `DEFAULT_PAGE_SIZE` – rows per page when unspecified (default: 20)
/// - `TZ_LOOKUP_TIMEOUT_MS` – registry lookup timeout (default: 3000)
/// - `TIMEZONE_REGISTRY_URL` – remote registry base URL (default: unset)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", defaults.db_pool_max);
    let http_port = parse_env_u32!("HTTP_PORT", defaults.http_port as u32);
    let http_port =
        u16::try_from(http_port).map_err(|_| anyhow!("Invalid HTTP_PORT: {}", http_port))?;
    let default_page_size = parse_env_u32!("DEFAULT_PAGE_SIZE", defaults.default_page_size);
    let tz_lookup_timeout_ms = parse_env_u64!(
        "TZ_LOOKUP_TIMEOUT_MS",
        defaults.tz_lookup_timeout.as_millis() as u64
    );
    let registry_url = env::var("TIMEZONE_REGISTRY_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());

    Ok(Config {
        db_url,
        db_pool_max,
        http_port,
        default_page_size,
        tz_lookup_timeout: Duration::from_millis(tz_lookup_timeout_ms),
        registry_url,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL          : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX           : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT             : {}", self.http_port);
        tracing::info!("  DEFAULT_PAGE_SIZE     : {}", self.default_page_size);
        tracing::info!(
            "  TZ_LOOKUP_TIMEOUT_MS  : {}",
            self.tz_lookup_timeout.as_millis()
        );
        tracing::info!(
            "  TIMEZONE_REGISTRY_URL : {}",
            self.registry_url.as_deref().unwrap_or("(experiments table)")
        );
    }
}

/// Replace the password in `user:password@host` with `****`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
        }
    }
    db_url.to_string()
}
