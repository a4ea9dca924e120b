// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Postgres adapter for [`ObjectRepository`]. `find_preservation_pending`
//! and `count_preservation_excluded` are the SQL half of §4.1's eligibility
//! predicate: every branch of the in-memory `preservation_pending` function
//! in `preservation-domain` has a corresponding `WHERE` clause here, and the
//! two must partition the objects table identically (see
//! `preservation-engine/tests/eligibility_partition_test.rs`).
//!
//! Nullable timestamps are coalesced to the minimum representable Postgres
//! `timestamptz` rather than compared directly, because SQL's `NULL <>
//! NULL` is itself `NULL`, not `true` — a direct `<>` comparison would
//! silently drop every object whose package has never recorded an
//! `object_modified_date`.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use preservation_domain::entities::Object;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::ObjectRepository;
use preservation_domain::value_objects::{AttachmentId, FreezeSource, ObjectId};
use sqlx::{PgPool, Row};

pub struct PostgresObjectRepository {
    pool: PgPool,
}

impl PostgresObjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn sentinel_min() -> DateTime<Utc> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(1, 1, 1, 0, 0, 0)
            .single()
            .expect("fixed calendar date")
            .with_timezone(&Utc)
    }
}

fn map_sqlx(err: sqlx::Error) -> DomainError {
    DomainError::Internal(err.to_string())
}

fn row_to_object(row: &sqlx::postgres::PgRow) -> Result<Object, DomainError> {
    let freeze_source: Option<String> = row.try_get("freeze_source").map_err(map_sqlx)?;
    Ok(Object::from_row(
        ObjectId::new(row.try_get::<i64, _>("id").map_err(map_sqlx)?),
        row.try_get("title").map_err(map_sqlx)?,
        row.try_get("preserved").map_err(map_sqlx)?,
        row.try_get("frozen").map_err(map_sqlx)?,
        row.try_get("freeze_reason").map_err(map_sqlx)?,
        freeze_source.and_then(|s| FreezeSource::from_str_opt(&s)),
        row.try_get("created_date").map_err(map_sqlx)?,
        row.try_get("modified_date").map_err(map_sqlx)?,
        row.try_get("metadata_hash").map_err(map_sqlx)?,
        row.try_get("attachment_metadata_hash").map_err(map_sqlx)?,
        row.try_get::<Option<i64>, _>("latest_package_id").map_err(map_sqlx)?.map(preservation_domain::value_objects::PackageId::new),
    ))
}

#[async_trait::async_trait]
impl ObjectRepository for PostgresObjectRepository {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Object>, DomainError> {
        let row = sqlx::query("SELECT * FROM objects WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_to_object).transpose()
    }

    async fn save_new(&self, object: &Object) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO objects (id, title, preserved, frozen, freeze_reason, freeze_source, created_date, modified_date, metadata_hash, attachment_metadata_hash, latest_package_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(object.id().value())
        .bind(object.title())
        .bind(object.preserved())
        .bind(object.frozen())
        .bind(object.freeze_reason())
        .bind(object.freeze_source().map(|s| s.as_str()))
        .bind(object.created_date())
        .bind(object.modified_date())
        .bind(object.metadata_hash().map(|h| h.as_str()))
        .bind(object.attachment_metadata_hash().to_column())
        .bind(object.latest_package_id().map(|p| p.value()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update(&self, object: &Object) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE objects SET title = $2, preserved = $3, frozen = $4, freeze_reason = $5, freeze_source = $6,
             created_date = $7, modified_date = $8, metadata_hash = $9, attachment_metadata_hash = $10, latest_package_id = $11
             WHERE id = $1",
        )
        .bind(object.id().value())
        .bind(object.title())
        .bind(object.preserved())
        .bind(object.frozen())
        .bind(object.freeze_reason())
        .bind(object.freeze_source().map(|s| s.as_str()))
        .bind(object.created_date())
        .bind(object.modified_date())
        .bind(object.metadata_hash().map(|h| h.as_str()))
        .bind(object.attachment_metadata_hash().to_column())
        .bind(object.latest_package_id().map(|p| p.value()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn bulk_insert(&self, objects: &[Object]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for object in objects {
            sqlx::query(
                "INSERT INTO objects (id, title, created_date, modified_date, metadata_hash)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(object.id().value())
            .bind(object.title())
            .bind(object.created_date())
            .bind(object.modified_date())
            .bind(object.metadata_hash().map(|h| h.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn bulk_update_sync_fields(&self, objects: &[Object]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for object in objects {
            // The never-regress guard already ran in-memory
            // (`Object::apply_sync_update`); this statement just persists
            // whatever `modified_date` the entity now holds.
            sqlx::query(
                "UPDATE objects SET title = $2, metadata_hash = $3, modified_date = $4 WHERE id = $1",
            )
            .bind(object.id().value())
            .bind(object.title())
            .bind(object.metadata_hash().map(|h| h.as_str()))
            .bind(object.modified_date())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn exists_all(&self, ids: &[ObjectId]) -> Result<Vec<ObjectId>, DomainError> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows = sqlx::query("SELECT id FROM objects WHERE id = ANY($1)")
            .bind(&raw_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|row| row.try_get::<i64, _>("id").map(ObjectId::new).map_err(map_sqlx))
            .collect()
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Object>, DomainError> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows = sqlx::query("SELECT * FROM objects WHERE id = ANY($1)")
            .bind(&raw_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(row_to_object).collect()
    }

    async fn find_preservation_pending(
        &self,
        preservation_delay: Duration,
        update_delay: Duration,
        object_ids: Option<&[ObjectId]>,
        random_order: bool,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Object>, DomainError> {
        let raw_ids = object_ids.map(|ids| ids.iter().map(|id| id.value()).collect::<Vec<_>>());
        let order_clause = if random_order { "ORDER BY random()" } else { "ORDER BY o.id" };
        let sql = format!(
            "SELECT o.* FROM objects o
             LEFT JOIN packages p ON p.id = o.latest_package_id
             WHERE NOT o.frozen
               AND o.metadata_hash IS NOT NULL
               AND o.attachment_metadata_hash IS NOT NULL
               AND (
                 ($1::bigint[] IS NULL) OR o.id = ANY($1)
               )
               AND (
                 (p.id IS NULL AND (o.created_date IS NULL OR o.created_date < now() - $2::interval))
                 OR
                 (p.id IS NOT NULL AND (
                   p.cancelled
                   OR (
                     coalesce(p.object_modified_date, $4) IS DISTINCT FROM coalesce(o.modified_date, $4)
                     AND coalesce(p.object_modified_date, $4) < now() - $3::interval
                     AND (p.metadata_hash IS DISTINCT FROM o.metadata_hash
                          OR p.attachment_metadata_hash IS DISTINCT FROM o.attachment_metadata_hash)
                   )
                 ))
               )
             {order_clause}
             OFFSET $5 LIMIT $6"
        );
        let rows = sqlx::query(&sql)
            .bind(raw_ids)
            .bind(preservation_delay)
            .bind(update_delay)
            .bind(Self::sentinel_min())
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(row_to_object).collect()
    }

    async fn count_preservation_excluded(&self, preservation_delay: Duration, update_delay: Duration) -> Result<i64, DomainError> {
        let sql = "SELECT count(*) FROM objects o
             LEFT JOIN packages p ON p.id = o.latest_package_id
             WHERE o.frozen
               OR o.metadata_hash IS NULL
               OR o.attachment_metadata_hash IS NULL
               OR (p.id IS NULL AND o.created_date IS NOT NULL AND o.created_date >= now() - $1::interval)
               OR (p.id IS NOT NULL AND NOT p.cancelled AND (
                 coalesce(p.object_modified_date, $3) IS NOT DISTINCT FROM coalesce(o.modified_date, $3)
                 OR coalesce(p.object_modified_date, $3) >= now() - $2::interval
                 OR (p.metadata_hash IS NOT DISTINCT FROM o.metadata_hash
                     AND p.attachment_metadata_hash IS NOT DISTINCT FROM o.attachment_metadata_hash)
               ))";
        let count: i64 = sqlx::query_scalar(sql)
            .bind(preservation_delay)
            .bind(update_delay)
            .bind(Self::sentinel_min())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(count)
    }

    async fn count_preservation_pending(&self, preservation_delay: Duration, update_delay: Duration) -> Result<i64, DomainError> {
        let all: i64 = sqlx::query_scalar("SELECT count(*) FROM objects")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        let excluded = self.count_preservation_excluded(preservation_delay, update_delay).await?;
        Ok(all - excluded)
    }

    async fn find_frozen(&self, reason: Option<&str>, ids: Option<&[ObjectId]>) -> Result<Vec<Object>, DomainError> {
        let raw_ids = ids.map(|ids| ids.iter().map(|id| id.value()).collect::<Vec<_>>());
        let rows = sqlx::query(
            "SELECT * FROM objects WHERE frozen
             AND ($1::text IS NULL OR freeze_reason = $1)
             AND ($2::bigint[] IS NULL OR id = ANY($2))",
        )
        .bind(reason)
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(row_to_object).collect()
    }

    async fn replace_attachment_links(&self, object_id: ObjectId, attachment_ids: &[AttachmentId]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        sqlx::query("DELETE FROM object_attachment_links WHERE object_id = $1")
            .bind(object_id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        for attachment_id in attachment_ids {
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

    async fn insert_placeholders(&self, ids: &[ObjectId]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for id in ids {
            sqlx::query("INSERT INTO objects (id, title) VALUES ($1, '') ON CONFLICT (id) DO NOTHING")
                .bind(id.value())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}
