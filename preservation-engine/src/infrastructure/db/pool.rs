// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Opens a bounded connection pool against the PAS database. `max_connections`
/// mirrors the teacher's SQLite pool sizing knob, just against Postgres.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Executes the `create-pas-db` schema script. Idempotent: every statement
/// uses `IF NOT EXISTS`, so re-running against a live database is a no-op.
pub async fn create_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(super::schema::SCHEMA).execute(pool).await?;
    Ok(())
}
