// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Postgres backing for [`ObjectAttachmentHashLookup`], the narrow port
//! `sync_hashes` (§4.5) needs on top of [`ObjectRepository`]: paging every
//! object id in the table, then joining each page's objects out to their
//! attachments' `metadata_hash` columns.

use crate::application::services::ObjectAttachmentHashLookup;
use crate::error::EngineError;
use preservation_domain::value_objects::ObjectId;
use sqlx::{PgPool, Row};

pub struct PostgresHashLookup {
    pool: PgPool,
}

impl PostgresHashLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ObjectAttachmentHashLookup for PostgresHashLookup {
    async fn page_object_ids(&self, offset: i64, limit: i64) -> Result<Vec<ObjectId>, EngineError> {
        let rows = sqlx::query("SELECT id FROM objects ORDER BY id OFFSET $1 LIMIT $2")
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<i64, _>("id").map(ObjectId::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn attachment_hashes_for_objects(
        &self,
        object_ids: &[ObjectId],
    ) -> Result<std::collections::HashMap<ObjectId, Vec<Option<String>>>, EngineError> {
        let mut result: std::collections::HashMap<ObjectId, Vec<Option<String>>> =
            object_ids.iter().map(|id| (*id, Vec::new())).collect();
        if object_ids.is_empty() {
            return Ok(result);
        }
        let ids: Vec<i64> = object_ids.iter().map(|id| id.value()).collect();
        let rows = sqlx::query(
            "SELECT oa.object_id, a.metadata_hash FROM object_attachment_links oa
             JOIN attachments a ON a.id = oa.attachment_id
             WHERE oa.object_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let object_id = ObjectId::new(row.try_get::<i64, _>("object_id")?);
            let hash = row.try_get::<Option<String>, _>("metadata_hash")?;
            result.entry(object_id).or_default().push(hash);
        }
        Ok(result)
    }
}
