// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `freeze_running_object` (§4.3.1's "Freezing semantics in stage
//! handlers"): the failure-path freeze a stage job performs when a
//! collaborator reports `PreservationFailed`. Distinct from the
//! administrative bulk freeze in `application::workflow::freeze`, which
//! runs under the workflow lock over many objects at once; this one runs
//! already inside the per-object lock for exactly one object.

use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::{FreezeSource, ObjectId};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub async fn freeze_running_object(
    objects: &Arc<dyn ObjectRepository>,
    packages: &Arc<dyn PackageRepository>,
    object_id: ObjectId,
    sip_id: &str,
    freeze_reason: &str,
    package_dir: &Path,
    archive_dir: &Path,
) -> Result<(), crate::error::EngineError> {
    let mut object = objects
        .find_by_id(object_id)
        .await?
        .ok_or(preservation_domain::error::DomainError::ObjectNotFound(object_id.value()))?;
    object.freeze(freeze_reason, FreezeSource::Automatic);
    objects.update(&object).await?;

    if let Some(mut package) = packages.find_latest_for_object(object_id).await? {
        if package.sip_id() == sip_id && !package.is_terminal() {
            let _ = package.mark_cancelled();
            packages.mark_cancelled(package.id()).await?;
        }

        let working_dir = package.workflow_log_dir(package_dir);
        let archive_target = package.archive_log_dir(archive_dir);
        if let Err(err) = best_effort_archive_logs(&working_dir, &archive_target).await {
            warn!(object_id = %object_id, error = %err, "best-effort log archive failed during freeze");
        }
    }

    Ok(())
}

/// Copies the working log directory into the archive tree and removes the
/// working directory. Every I/O failure here is swallowed by the caller
/// (§4.3.1): an absent working directory is the common case, not an error.
pub(crate) async fn best_effort_archive_logs(working_dir: &Path, archive_dir: &Path) -> std::io::Result<()> {
    if !working_dir.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(archive_dir).await?;
    let mut entries = tokio::fs::read_dir(working_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let dest = archive_dir.join(entry.file_name());
        tokio::fs::copy(entry.path(), &dest).await?;
    }
    tokio::fs::remove_dir_all(working_dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStore;
    use chrono::Utc;
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::PackageId;

    #[tokio::test]
    async fn cancels_matching_in_flight_package_and_tolerates_missing_workdir() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        let package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-1", Utc::now(), None, None, None);
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));

        freeze_running_object(
            &(store.clone() as Arc<dyn ObjectRepository>),
            &(store.clone() as Arc<dyn PackageRepository>),
            ObjectId::new(1),
            "sip-1",
            "disk full",
            Path::new("/nonexistent/packages"),
            Path::new("/nonexistent/archive"),
        )
        .await
        .unwrap();

        let object = store.object(ObjectId::new(1));
        assert!(object.frozen());
        assert_eq!(object.freeze_source(), Some(FreezeSource::Automatic));
        assert!(store.package(PackageId::new(1)).cancelled());
    }

    #[tokio::test]
    async fn does_not_cancel_a_package_from_a_different_sip_attempt() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        let package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-old", Utc::now(), None, None, None);
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));

        freeze_running_object(
            &(store.clone() as Arc<dyn ObjectRepository>),
            &(store.clone() as Arc<dyn PackageRepository>),
            ObjectId::new(1),
            "sip-new",
            "disk full",
            Path::new("/nonexistent/packages"),
            Path::new("/nonexistent/archive"),
        )
        .await
        .unwrap();

        assert!(!store.package(PackageId::new(1)).cancelled());
    }
}
