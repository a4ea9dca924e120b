// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use preservation_domain::entities::Attachment;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::AttachmentRepository;
use preservation_domain::value_objects::AttachmentId;
use sqlx::{PgPool, Row};

pub struct PostgresAttachmentRepository {
    pool: PgPool,
}

impl PostgresAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> DomainError {
    DomainError::Internal(err.to_string())
}

fn row_to_attachment(row: &sqlx::postgres::PgRow) -> Result<Attachment, DomainError> {
    Ok(Attachment::new(
        AttachmentId::new(row.try_get::<i64, _>("id").map_err(map_sqlx)?),
        row.try_get::<String, _>("filename").map_err(map_sqlx)?,
        row.try_get("created_date").map_err(map_sqlx)?,
        row.try_get("modified_date").map_err(map_sqlx)?,
        row.try_get("metadata_hash").map_err(map_sqlx)?,
    ))
}

#[async_trait::async_trait]
impl AttachmentRepository for PostgresAttachmentRepository {
    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, DomainError> {
        let row = sqlx::query("SELECT * FROM attachments WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_to_attachment).transpose()
    }

    async fn find_by_ids(&self, ids: &[AttachmentId]) -> Result<Vec<Attachment>, DomainError> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows = sqlx::query("SELECT * FROM attachments WHERE id = ANY($1)")
            .bind(&raw_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(row_to_attachment).collect()
    }

    async fn bulk_insert(&self, attachments: &[Attachment]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for attachment in attachments {
            sqlx::query(
                "INSERT INTO attachments (id, filename, created_date, modified_date, metadata_hash)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(attachment.id().value())
            .bind(attachment.filename())
            .bind(attachment.created_date())
            .bind(attachment.modified_date())
            .bind(attachment.metadata_hash().map(|h| h.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn bulk_update_sync_fields(&self, attachments: &[Attachment]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for attachment in attachments {
            sqlx::query(
                "UPDATE attachments SET filename = $2, created_date = $3, modified_date = $4, metadata_hash = $5 WHERE id = $1",
            )
            .bind(attachment.id().value())
            .bind(attachment.filename())
            .bind(attachment.created_date())
            .bind(attachment.modified_date())
            .bind(attachment.metadata_hash().map(|h| h.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_placeholders(&self, ids: &[AttachmentId]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for id in ids {
            sqlx::query("INSERT INTO attachments (id, filename) VALUES ($1, '') ON CONFLICT (id) DO NOTHING")
                .bind(id.value())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn replace_object_links(
        &self,
        attachment_id: AttachmentId,
        object_ids: &[preservation_domain::value_objects::ObjectId],
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        sqlx::query("DELETE FROM object_attachment_links WHERE attachment_id = $1")
            .bind(attachment_id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        for object_id in object_ids {
            sqlx::query("INSERT INTO object_attachment_links (object_id, attachment_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(object_id.value())
                .bind(attachment_id.value())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}
