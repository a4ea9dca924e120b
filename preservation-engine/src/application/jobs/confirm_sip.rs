// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `confirm_sip` (§4.3.4), grounded in
//! `original_source/src/passari_workflow/jobs/confirm_sip.py`. The
//! `<sip_filename>.status` file is written by the DPRES reconciler
//! (§4.6 step 4) before this job is enqueued; any content other than the
//! literal strings `accepted`/`rejected` is a hard error.

use crate::error::EngineError;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::services::SipConfirmer;
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ConfirmSipDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub confirmer: Arc<dyn SipConfirmer>,
    pub package_dir: std::path::PathBuf,
    pub archive_dir: std::path::PathBuf,
}

#[instrument(skip(deps), fields(object_id = %object_id, sip_id = %sip_id))]
pub async fn confirm_sip(deps: &ConfirmSipDeps, object_id: ObjectId, sip_id: &str) -> Result<(), EngineError> {
    let package = deps
        .packages
        .find_by_object_and_sip_id(object_id, sip_id)
        .await?
        .ok_or_else(|| DomainError::PackageNotFound(sip_id.to_string()))?;

    let working_dir = package.workflow_log_dir(&deps.package_dir);
    let status_path = working_dir.join(format!("{}.status", package.sip_filename()));
    let raw_status = tokio::fs::read_to_string(&status_path)
        .await
        .map_err(|err| DomainError::Internal(format!("reading {}: {err}", status_path.display())))?;
    let accepted = match raw_status.trim() {
        "accepted" => true,
        "rejected" => false,
        other => return Err(DomainError::InvalidStatusFile(other.to_string()).into()),
    };

    deps.confirmer
        .confirm(object_id, &working_dir, &deps.archive_dir, sip_id, accepted)
        .await?;

    if accepted {
        deps.packages.mark_preserved(package.id()).await?;
        let mut object = deps
            .objects
            .find_by_id(object_id)
            .await?
            .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
        object.mark_preserved();
        deps.objects.update(&object).await?;
    } else {
        deps.packages.mark_rejected(package.id()).await?;
    }

    info!(object_id = %object_id, accepted, "confirmed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeStore, StubConfirmer};
    use chrono::Utc;
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::PackageId;
    use std::sync::Arc;

    async fn setup(status: &str) -> (Arc<FakeStore>, ConfirmSipDeps, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let mut package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "20200101-000000", Utc::now(), None, None, None);
        package.mark_packaged().unwrap();
        package.mark_uploaded().unwrap();
        let working_dir = package.workflow_log_dir(tmp.path());
        tokio::fs::create_dir_all(&working_dir).await.unwrap();
        tokio::fs::write(working_dir.join("obj1.tar.status"), status).await.unwrap();

        let object = Object::new(ObjectId::new(1), "t", None, None);
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));
        let deps = ConfirmSipDeps {
            objects: store.clone(),
            packages: store.clone(),
            confirmer: Arc::new(StubConfirmer),
            package_dir: tmp.path().to_path_buf(),
            archive_dir: tmp.path().join("archive"),
        };
        (store, deps, tmp)
    }

    /// §8 scenario 1/5: an `accepted` status file marks the package and
    /// the owning object preserved.
    #[tokio::test]
    async fn accepted_status_marks_package_and_object_preserved() {
        let (store, deps, _tmp) = setup("accepted").await;

        confirm_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap();

        assert!(store.package(PackageId::new(1)).preserved());
        assert!(store.object(ObjectId::new(1)).preserved());
    }

    #[tokio::test]
    async fn rejected_status_marks_package_rejected_without_preserving_object() {
        let (store, deps, _tmp) = setup("rejected").await;

        confirm_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap();

        assert!(store.package(PackageId::new(1)).rejected());
        assert!(!store.object(ObjectId::new(1)).preserved());
    }

    #[tokio::test]
    async fn garbage_status_content_is_a_hard_error() {
        let (_store, deps, _tmp) = setup("maybe").await;

        let err = confirm_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::InvalidStatusFile(_))));
    }
}
