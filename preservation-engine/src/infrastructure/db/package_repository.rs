// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use preservation_domain::entities::Package;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::PackageRepository;
use preservation_domain::value_objects::{AttachmentId, ObjectId, PackageId};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> DomainError {
    DomainError::Internal(err.to_string())
}

fn row_to_package(row: &sqlx::postgres::PgRow) -> Result<Package, DomainError> {
    Ok(Package::from_row(
        PackageId::new(row.try_get::<i64, _>("id").map_err(map_sqlx)?),
        ObjectId::new(row.try_get::<i64, _>("object_id").map_err(map_sqlx)?),
        row.try_get("sip_filename").map_err(map_sqlx)?,
        row.try_get("sip_id").map_err(map_sqlx)?,
        row.try_get("downloaded").map_err(map_sqlx)?,
        row.try_get("packaged").map_err(map_sqlx)?,
        row.try_get("uploaded").map_err(map_sqlx)?,
        row.try_get("rejected").map_err(map_sqlx)?,
        row.try_get("preserved").map_err(map_sqlx)?,
        row.try_get("cancelled").map_err(map_sqlx)?,
        row.try_get("object_modified_date").map_err(map_sqlx)?,
        row.try_get("created_date").map_err(map_sqlx)?,
        row.try_get("metadata_hash").map_err(map_sqlx)?,
        row.try_get("attachment_metadata_hash").map_err(map_sqlx)?,
    ))
}

#[async_trait::async_trait]
impl PackageRepository for PostgresPackageRepository {
    async fn find_by_id(&self, id: PackageId) -> Result<Option<Package>, DomainError> {
        let row = sqlx::query("SELECT * FROM packages WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_to_package).transpose()
    }

    async fn find_latest_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError> {
        let row = sqlx::query(
            "SELECT * FROM packages WHERE object_id = $1 ORDER BY created_date DESC, id DESC LIMIT 1",
        )
        .bind(object_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(row_to_package).transpose()
    }

    async fn find_latest_for_objects(&self, object_ids: &[ObjectId]) -> Result<HashMap<ObjectId, Package>, DomainError> {
        let raw_ids: Vec<i64> = object_ids.iter().map(|id| id.value()).collect();
        let rows = sqlx::query(
            "SELECT DISTINCT ON (object_id) * FROM packages
             WHERE object_id = ANY($1)
             ORDER BY object_id, created_date DESC, id DESC",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in &rows {
            let package = row_to_package(row)?;
            out.insert(package.object_id(), package);
        }
        Ok(out)
    }

    async fn insert_downloaded(&self, package: &Package) -> Result<PackageId, DomainError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO packages (object_id, sip_filename, sip_id, downloaded, object_modified_date, created_date, metadata_hash, attachment_metadata_hash)
             VALUES ($1, $2, $3, true, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(package.object_id().value())
        .bind(package.sip_filename())
        .bind(package.sip_id())
        .bind(package.object_modified_date())
        .bind(package.created_date())
        .bind(package.metadata_hash().map(|h| h.as_str()))
        .bind(package.attachment_metadata_hash().to_column())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(PackageId::new(id))
    }

    async fn link_attachments(&self, package_id: PackageId, attachment_ids: &[AttachmentId]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for attachment_id in attachment_ids {
            sqlx::query(
                "INSERT INTO package_attachment_links (package_id, attachment_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(package_id.value())
            .bind(attachment_id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn mark_packaged(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("UPDATE packages SET packaged = true WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn mark_uploaded(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("UPDATE packages SET uploaded = true WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn mark_preserved(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("UPDATE packages SET preserved = true WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn mark_rejected(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("UPDATE packages SET rejected = true WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn mark_cancelled(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("UPDATE packages SET cancelled = true WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_awaiting_confirmation(&self) -> Result<Vec<Package>, DomainError> {
        let rows = sqlx::query("SELECT * FROM packages WHERE uploaded AND NOT (preserved OR rejected OR cancelled)")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(row_to_package).collect()
    }

    async fn find_sip_filenames_known(&self, sip_filenames: &[String]) -> Result<Vec<String>, DomainError> {
        let rows = sqlx::query("SELECT sip_filename FROM packages WHERE sip_filename = ANY($1)")
            .bind(sip_filenames)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("sip_filename").map_err(map_sqlx))
            .collect()
    }

    async fn find_latest_preserved_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError> {
        let row = sqlx::query(
            "SELECT * FROM packages WHERE object_id = $1 AND preserved
             ORDER BY created_date DESC, id DESC LIMIT 1",
        )
        .bind(object_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(row_to_package).transpose()
    }

    async fn find_by_object_and_sip_id(&self, object_id: ObjectId, sip_id: &str) -> Result<Option<Package>, DomainError> {
        let row = sqlx::query("SELECT * FROM packages WHERE object_id = $1 AND sip_id = $2")
            .bind(object_id.value())
            .bind(sip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_to_package).transpose()
    }

    async fn find_by_sip_filename(&self, sip_filename: &str) -> Result<Option<Package>, DomainError> {
        let row = sqlx::query("SELECT * FROM packages WHERE sip_filename = $1")
            .bind(sip_filename)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_to_package).transpose()
    }

    async fn find_recent_confirmed_sip_filenames(&self, since: chrono::DateTime<chrono::Utc>) -> Result<std::collections::HashSet<String>, DomainError> {
        let rows = sqlx::query(
            "SELECT sip_filename FROM packages WHERE created_date > $1 AND (preserved OR rejected)",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("sip_filename").map_err(map_sqlx))
            .collect()
    }

    async fn delete_package(&self, id: PackageId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_dangling_object_ids(&self) -> Result<Vec<ObjectId>, DomainError> {
        let rows = sqlx::query(
            "SELECT o.id FROM objects o
             JOIN packages p ON p.id = o.latest_package_id
             WHERE NOT p.uploaded AND (p.downloaded OR p.packaged)",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|row| row.try_get::<i64, _>("id").map(ObjectId::new).map_err(map_sqlx))
            .collect()
    }
}
