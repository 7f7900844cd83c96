//! Database schema management for `sensorflow-telemetry`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `experiments` registry table, the `devices` inventory and
/// the `packet_traffic` flow table read by the API. Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Experiment registry; `timezone` holds an IANA zone name
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experiments (
            experiment_id TEXT        PRIMARY KEY,
            name          TEXT        NOT NULL,
            timezone      TEXT        NOT NULL DEFAULT 'UTC',
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id     TEXT        PRIMARY KEY,
            experiment_id TEXT        NOT NULL,
            device_name   TEXT,
            mac_address   TEXT,
            device_type   TEXT,
            manufacturer  TEXT,
            first_seen    TIMESTAMPTZ,
            last_seen     TIMESTAMPTZ,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per captured flow sample
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS packet_traffic (
            id               BIGSERIAL   PRIMARY KEY,
            device_id        TEXT        NOT NULL,
            experiment_id    TEXT        NOT NULL,
            packet_timestamp TIMESTAMPTZ NOT NULL,
            protocol         TEXT        NOT NULL,
            port             INTEGER,
            total_packets    BIGINT      NOT NULL DEFAULT 0,
            total_bytes      BIGINT      NOT NULL DEFAULT 0,
            created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_devices_experiment_id
            ON devices (experiment_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_packet_traffic_device_time
            ON packet_traffic (device_id, packet_timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_packet_traffic_experiment_id
            ON packet_traffic (experiment_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
