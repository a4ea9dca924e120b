// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use preservation_domain::entities::SyncStatus;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::SyncStatusRepository;
use sqlx::{PgPool, Row};

pub struct PostgresSyncStatusRepository {
    pool: PgPool,
}

impl PostgresSyncStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> DomainError {
    DomainError::Internal(err.to_string())
}

#[async_trait::async_trait]
impl SyncStatusRepository for PostgresSyncStatusRepository {
    async fn get(&self, kind: &str) -> Result<SyncStatus, DomainError> {
        let row = sqlx::query("SELECT * FROM sync_status WHERE name = $1")
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        match row {
            Some(row) => Ok(SyncStatus::from_row(
                row.try_get("name").map_err(map_sqlx)?,
                row.try_get("start_sync_date").map_err(map_sqlx)?,
                row.try_get("prev_start_sync_date").map_err(map_sqlx)?,
                row.try_get("offset").map_err(map_sqlx)?,
            )),
            None => Ok(SyncStatus::new_idle(kind)),
        }
    }

    async fn save(&self, status: &SyncStatus) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO sync_status (name, start_sync_date, prev_start_sync_date, \"offset\")
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (name) DO UPDATE SET
               start_sync_date = excluded.start_sync_date,
               prev_start_sync_date = excluded.prev_start_sync_date,
               \"offset\" = excluded.\"offset\"",
        )
        .bind(status.name())
        .bind(status.start_sync_date())
        .bind(status.prev_start_sync_date())
        .bind(status.offset())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
