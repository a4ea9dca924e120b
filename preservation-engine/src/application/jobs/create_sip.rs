// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `create_sip` (§4.3.2), grounded in
//! `original_source/src/passari_workflow/jobs/create_sip.py`.

use super::freeze::freeze_running_object;
use crate::error::EngineError;
use crate::infrastructure::queue::{stage_job_id, JobStore, Stage};
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::services::SipBuilder;
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct CreateSipDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub builder: Arc<dyn SipBuilder>,
    pub jobs: Arc<dyn JobStore>,
    pub package_dir: std::path::PathBuf,
    pub archive_dir: std::path::PathBuf,
}

#[instrument(skip(deps), fields(object_id = %object_id, sip_id = %sip_id))]
pub async fn create_sip(deps: &CreateSipDeps, object_id: ObjectId, sip_id: &str) -> Result<(), EngineError> {
    let package = deps
        .packages
        .find_by_object_and_sip_id(object_id, sip_id)
        .await?
        .ok_or_else(|| DomainError::PackageNotFound(sip_id.to_string()))?;

    // §4.3.2 step 1: the most recent *preserved* package (if any) decides
    // whether this is a first submission or an update.
    let (create_date, modify_date, update) = match deps.packages.find_latest_preserved_for_object(object_id).await? {
        None => (package.created_date(), None, false),
        Some(preserved) => (preserved.created_date(), Some(package.created_date()), true),
    };

    let package_dir = package.workflow_log_dir(&deps.package_dir);
    let build_result = deps
        .builder
        .build(object_id, &package_dir, sip_id, create_date, modify_date, update)
        .await;

    match build_result {
        Ok(()) => {}
        Err(DomainError::PreservationFailed(reason)) => {
            freeze_running_object(
                &deps.objects,
                &deps.packages,
                object_id,
                sip_id,
                &reason,
                &deps.package_dir,
                &deps.archive_dir,
            )
            .await?;
            info!(object_id = %object_id, reason = %reason, "froze object on preservation failure during create_sip");
            return Ok(());
        }
        Err(other) => return Err(other.into()),
    }

    deps.packages.mark_packaged(package.id()).await?;

    let mut object = deps
        .objects
        .find_by_id(object_id)
        .await?
        .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
    object.set_latest_package_id(Some(package.id()));
    deps.objects.update(&object).await?;

    deps.jobs.enqueue(Stage::SubmitSip, object_id).await?;
    info!(job = %stage_job_id(Stage::SubmitSip, object_id), "enqueued");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeJobStore, FakeStore, StubBuilder};
    use chrono::Utc;
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::PackageId;
    use std::sync::Arc;

    fn package(id: i64, object_id: i64, sip_id: &str) -> Package {
        Package::new_downloaded(PackageId::new(id), ObjectId::new(object_id), format!("obj{object_id}.tar"), sip_id, Utc::now(), None, None, None)
    }

    #[tokio::test]
    async fn first_submission_has_no_modify_date_and_enqueues_submit() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        let pkg = package(1, 1, "20200101-000000");
        object.set_latest_package_id(Some(pkg.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(pkg));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = CreateSipDeps {
            objects: store.clone(),
            packages: store.clone(),
            builder: Arc::new(StubBuilder::succeeding()),
            jobs: jobs.clone(),
            package_dir: std::path::PathBuf::from("/tmp/packages"),
            archive_dir: std::path::PathBuf::from("/tmp/archive"),
        };

        create_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap();

        let stored = store.package(PackageId::new(1));
        assert!(stored.packaged());
        assert!(jobs.is_pending(Stage::SubmitSip, ObjectId::new(1)));
    }

    #[tokio::test]
    async fn preservation_failure_freezes_object() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        let pkg = package(1, 1, "20200101-000000");
        object.set_latest_package_id(Some(pkg.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(pkg));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = CreateSipDeps {
            objects: store.clone(),
            packages: store.clone(),
            builder: Arc::new(StubBuilder { fail: Some(DomainError::PreservationFailed("bad sip".into())) }),
            jobs,
            package_dir: std::path::PathBuf::from("/tmp/packages"),
            archive_dir: std::path::PathBuf::from("/tmp/archive"),
        };

        create_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap();

        assert!(store.object(ObjectId::new(1)).frozen());
        assert!(!store.package(PackageId::new(1)).packaged());
    }
}
