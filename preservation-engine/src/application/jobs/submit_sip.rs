// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `submit_sip` (§4.3.3), grounded in
//! `original_source/src/passari_workflow/jobs/submit_sip.py`. No next-stage
//! enqueue happens here: confirmation is driven asynchronously by the DPRES
//! reconciler (§4.6), not by this handler.

use crate::error::EngineError;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::PackageRepository;
use preservation_domain::services::SipUploader;
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct SubmitSipDeps {
    pub packages: Arc<dyn PackageRepository>,
    pub uploader: Arc<dyn SipUploader>,
    pub package_dir: std::path::PathBuf,
}

#[instrument(skip(deps), fields(object_id = %object_id, sip_id = %sip_id))]
pub async fn submit_sip(deps: &SubmitSipDeps, object_id: ObjectId, sip_id: &str) -> Result<(), EngineError> {
    let package = deps
        .packages
        .find_by_object_and_sip_id(object_id, sip_id)
        .await?
        .ok_or_else(|| DomainError::PackageNotFound(sip_id.to_string()))?;

    if package.uploaded() {
        return Err(DomainError::InvalidOperation(format!(
            "package {} is already uploaded",
            package.sip_filename()
        ))
        .into());
    }

    let package_dir = package.workflow_log_dir(&deps.package_dir);
    deps.uploader.upload(object_id, &package_dir, package.sip_filename()).await?;

    deps.packages.mark_uploaded(package.id()).await?;

    let archive_path = package_dir.join(package.sip_filename());
    if let Err(err) = tokio::fs::remove_file(&archive_path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(object_id = %object_id, error = %err, "failed to delete local SIP archive after upload");
        }
    }

    info!(object_id = %object_id, sip_filename = %package.sip_filename(), "uploaded, awaiting DPRES reconciliation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeStore, StubUploader};
    use chrono::Utc;
    use preservation_domain::entities::Package;
    use preservation_domain::value_objects::PackageId;
    use std::sync::Arc;

    #[tokio::test]
    async fn successful_upload_marks_uploaded_and_removes_local_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "20200101-000000", Utc::now(), None, None, None);
        let working_dir = package.workflow_log_dir(tmp.path());
        tokio::fs::create_dir_all(&working_dir).await.unwrap();
        tokio::fs::write(working_dir.join("obj1.tar"), b"sip bytes").await.unwrap();
        let store = Arc::new(FakeStore::new().with_package(package));
        let deps = SubmitSipDeps { packages: store.clone(), uploader: Arc::new(StubUploader), package_dir: tmp.path().to_path_buf() };

        submit_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap();

        assert!(store.package(PackageId::new(1)).uploaded());
        assert!(!working_dir.join("obj1.tar").exists());
    }

    #[tokio::test]
    async fn already_uploaded_package_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let mut package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "20200101-000000", Utc::now(), None, None, None);
        package.mark_packaged().unwrap();
        package.mark_uploaded().unwrap();
        let store = Arc::new(FakeStore::new().with_package(package));
        let deps = SubmitSipDeps { packages: store, uploader: Arc::new(StubUploader), package_dir: tmp.path().to_path_buf() };

        let err = submit_sip(&deps, ObjectId::new(1), "20200101-000000").await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::InvalidOperation(_))));
    }
}
