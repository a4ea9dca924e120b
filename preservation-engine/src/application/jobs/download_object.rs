// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `download_object` (§4.3.1), grounded in
//! `original_source/src/passari_workflow/jobs/download_object.py`.

use super::freeze::freeze_running_object;
use crate::error::EngineError;
use crate::infrastructure::queue::{stage_job_id, JobStore, Stage};
use chrono::Utc;
use preservation_domain::entities::Package;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{AttachmentRepository, ObjectRepository, PackageRepository};
use preservation_domain::services::ObjectDownloader;
use preservation_domain::value_objects::{ObjectId, PackageId};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct DownloadObjectDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub downloader: Arc<dyn ObjectDownloader>,
    pub jobs: Arc<dyn JobStore>,
    pub package_dir: std::path::PathBuf,
    pub archive_dir: std::path::PathBuf,
}

#[instrument(skip(deps), fields(object_id = %object_id))]
pub async fn download_object(deps: &DownloadObjectDeps, object_id: ObjectId) -> Result<(), EngineError> {
    let sip_id = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let package_dir = deps.package_dir.join(object_id.to_string()).join(&sip_id);

    let outcome = match deps.downloader.download(object_id, &package_dir, &sip_id).await {
        Ok(outcome) => outcome,
        Err(DomainError::PreservationFailed(reason)) => {
            freeze_running_object(
                &deps.objects,
                &deps.packages,
                object_id,
                &sip_id,
                &reason,
                &deps.package_dir,
                &deps.archive_dir,
            )
            .await?;
            info!(object_id = %object_id, reason = %reason, "froze object on preservation failure during download");
            return Ok(());
        }
        Err(other) => return Err(other.into()),
    };

    let object = deps
        .objects
        .find_by_id(object_id)
        .await?
        .ok_or(DomainError::ObjectNotFound(object_id.value()))?;

    let package = Package::new_downloaded(
        PackageId::new(0), // assigned by the store on insert
        object_id,
        outcome.sip_filename.clone(),
        sip_id.clone(),
        Utc::now(),
        outcome.object_modified_date,
        object.metadata_hash().map(|h| h.to_string()),
        object.attachment_metadata_hash().to_column(),
    );

    let package_id = deps.packages.insert_downloaded(&package).await.map_err(|err| {
        if matches!(err, DomainError::UniquenessCollision(_)) {
            err
        } else {
            DomainError::UniquenessCollision(outcome.sip_filename.clone())
        }
    })?;

    if !outcome.attachment_ids.is_empty() {
        deps.attachments.insert_placeholders(&outcome.attachment_ids).await?;
    }
    deps.packages.link_attachments(package_id, &outcome.attachment_ids).await?;

    let mut object = object;
    object.set_latest_package_id(Some(package_id));
    deps.objects.update(&object).await?;

    deps.jobs.enqueue(Stage::CreateSip, object_id).await?;
    info!(job = %stage_job_id(Stage::CreateSip, object_id), "enqueued");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeJobStore, FakeStore, StubDownloader};
    use preservation_domain::entities::Object;
    use preservation_domain::value_objects::AttachmentDigest;
    use std::sync::Arc;

    fn deps(store: Arc<FakeStore>, jobs: Arc<FakeJobStore>, downloader: StubDownloader) -> DownloadObjectDeps {
        DownloadObjectDeps {
            objects: store.clone(),
            attachments: store.clone(),
            packages: store,
            downloader: Arc::new(downloader),
            jobs,
            package_dir: std::path::PathBuf::from("/tmp/packages"),
            archive_dir: std::path::PathBuf::from("/tmp/archive"),
        }
    }

    /// §8 scenario 1, download half: a first-time-eligible object gets a
    /// downloaded Package and `create_sip` enqueued.
    #[tokio::test]
    async fn successful_download_creates_package_and_enqueues_create_sip() {
        let mut object = Object::new(ObjectId::new(1), "t", Some(Utc::now() - chrono::Duration::days(31)), None);
        object.apply_sync_update("t".into(), Some("h1".into()), None);
        object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);
        let store = Arc::new(FakeStore::new().with_object(object));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs.clone(), StubDownloader::succeeding("object1-sip.tar", None));

        download_object(&deps, ObjectId::new(1)).await.unwrap();

        let object = store.object(ObjectId::new(1));
        assert!(object.latest_package_id().is_some());
        let package = store.package(object.latest_package_id().unwrap());
        assert!(package.downloaded());
        assert_eq!(package.sip_filename(), "object1-sip.tar");
        assert!(jobs.is_pending(Stage::CreateSip, ObjectId::new(1)));
    }

    /// §8 scenario 3: a `PreservationFailed` downloader error freezes the
    /// object automatically and never reaches the create_sip queue.
    #[tokio::test]
    async fn preservation_failure_freezes_object_without_enqueueing() {
        let object = Object::new(ObjectId::new(1), "t", Some(Utc::now() - chrono::Duration::days(31)), None);
        let store = Arc::new(FakeStore::new().with_object(object));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs.clone(), StubDownloader::failing_preservation("Unsupported file format: wad"));

        download_object(&deps, ObjectId::new(1)).await.unwrap();

        let object = store.object(ObjectId::new(1));
        assert!(object.frozen());
        assert_eq!(object.freeze_reason(), Some("Unsupported file format: wad"));
        assert_eq!(object.freeze_source(), Some(preservation_domain::value_objects::FreezeSource::Automatic));
        assert!(!jobs.is_pending(Stage::CreateSip, ObjectId::new(1)));
    }

    /// Duplicate `sip_filename` on insert is a uniqueness collision, not a
    /// silent overwrite (§7's "fatal, indicates a clock-collision bug").
    #[tokio::test]
    async fn duplicate_sip_filename_is_a_uniqueness_collision() {
        let mut object = Object::new(ObjectId::new(1), "t", Some(Utc::now() - chrono::Duration::days(31)), None);
        object.apply_sync_update("t".into(), Some("h1".into()), None);
        object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);
        let existing = Package::new_downloaded(
            PackageId::new(99),
            ObjectId::new(2),
            "collision.tar",
            "20200101-000000",
            Utc::now(),
            None,
            None,
            None,
        );
        let store = Arc::new(FakeStore::new().with_object(object).with_package(existing));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs, StubDownloader::succeeding("collision.tar", None));

        let err = download_object(&deps, ObjectId::new(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::UniquenessCollision(_))));
    }
}
