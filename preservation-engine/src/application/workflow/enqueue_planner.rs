// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Enqueue Planner (§4.7), grounded in
//! `original_source/src/passari_workflow/scripts/enqueue_objects.py`.
//! `enqueue_objects` is also itself enqueueable as a single job on the
//! `enqueue_objects` queue (§4.2) so interactive callers don't block on a
//! long-running scan; that wrapping happens at the presentation layer,
//! not here.

use crate::error::EngineError;
use crate::infrastructure::queue::locks::{WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE};
use crate::infrastructure::queue::{DistributedLock, JobStore, Stage};
use chrono::Duration;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::ObjectId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::info;

/// Objects are pulled from the eligibility query this many at a time
/// (§4.7's "Stream results page-by-page").
const ENQUEUE_PAGE_SIZE: i64 = 500;

pub struct EnqueuePlannerDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub jobs: Arc<dyn JobStore>,
    pub lock: Arc<dyn DistributedLock>,
    pub preservation_delay: Duration,
    pub update_delay: Duration,
}

/// Schedules up to `object_count` fresh `download_object` jobs for
/// eligible, not-yet-enqueued objects.
pub async fn enqueue_objects(
    deps: &EnqueuePlannerDeps,
    object_count: i64,
    random: bool,
    object_ids: Option<&[ObjectId]>,
) -> Result<u64, EngineError> {
    let handle = deps
        .lock
        .acquire(WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE, StdDuration::from_secs(30))
        .await?;
    let result = enqueue_objects_locked(deps, object_count, random, object_ids).await;
    deps.lock.release(handle).await?;
    result
}

async fn enqueue_objects_locked(
    deps: &EnqueuePlannerDeps,
    object_count: i64,
    random: bool,
    object_ids: Option<&[ObjectId]>,
) -> Result<u64, EngineError> {
    let already_enqueued: HashSet<ObjectId> = deps.jobs.enqueued_object_ids().await?;
    let mut scheduled = 0u64;
    let mut offset = 0i64;

    loop {
        if scheduled >= object_count as u64 {
            break;
        }
        let page = deps
            .objects
            .find_preservation_pending(
                deps.preservation_delay,
                deps.update_delay,
                object_ids,
                random,
                offset,
                ENQUEUE_PAGE_SIZE,
            )
            .await?;
        if page.is_empty() {
            break;
        }
        let page_len = page.len() as i64;

        for object in page {
            if scheduled >= object_count as u64 {
                break;
            }
            if already_enqueued.contains(&object.id()) {
                continue;
            }
            deps.jobs.enqueue(Stage::DownloadObject, object.id()).await?;
            scheduled += 1;
        }

        offset += page_len;
        if page_len < ENQUEUE_PAGE_SIZE {
            break;
        }
    }

    info!(scheduled, "enqueue planner scheduled download jobs");
    Ok(scheduled)
}

/// Re-enqueues a single rejected object outside the normal eligibility
/// sweep (§4.7). Requires the object's latest package to be `rejected` and
/// the object not currently present on any queue.
pub async fn reenqueue_object(deps: &EnqueuePlannerDeps, object_id: ObjectId) -> Result<(), EngineError> {
    let enqueued = deps.jobs.enqueued_object_ids().await?;
    if enqueued.contains(&object_id) {
        return Err(EngineError::ReenqueueRefused(object_id, "object already has a job enqueued".to_string()));
    }

    let latest = deps.packages.find_latest_for_object(object_id).await?;
    let is_rejected = latest.as_ref().is_some_and(|p| p.rejected());
    if !is_rejected {
        return Err(EngineError::ReenqueueRefused(object_id, "latest package is not rejected".to_string()));
    }

    let mut object = deps
        .objects
        .find_by_id(object_id)
        .await?
        .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
    object.set_latest_package_id(None);
    deps.objects.update(&object).await?;

    deps.jobs.delete_jobs_for_object(object_id).await?;
    deps.jobs.enqueue(Stage::DownloadObject, object_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeJobStore, FakeStore, NoopLock};
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::{AttachmentDigest, PackageId};

    fn deps(store: Arc<FakeStore>, jobs: Arc<FakeJobStore>) -> EnqueuePlannerDeps {
        EnqueuePlannerDeps {
            objects: store.clone(),
            packages: store,
            jobs,
            lock: Arc::new(NoopLock),
            preservation_delay: Duration::days(30),
            update_delay: Duration::days(30),
        }
    }

    fn eligible_object(id: i64) -> Object {
        let mut object = Object::new(ObjectId::new(id), "t", Some(chrono::Utc::now() - Duration::days(31)), None);
        object.apply_sync_update("t".into(), Some("h1".into()), None);
        object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);
        object
    }

    /// §8 scenario 1: `enqueue_objects(10)` schedules exactly one
    /// `download_object` job for the single eligible object.
    #[tokio::test]
    async fn schedules_exactly_one_download_job_for_the_only_eligible_object() {
        let store = Arc::new(FakeStore::new().with_object(eligible_object(1)));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store, jobs.clone());

        let scheduled = enqueue_objects(&deps, 10, false, None).await.unwrap();

        assert_eq!(scheduled, 1);
        assert!(jobs.is_pending(Stage::DownloadObject, ObjectId::new(1)));
    }

    #[tokio::test]
    async fn already_enqueued_objects_are_skipped() {
        let store = Arc::new(FakeStore::new().with_object(eligible_object(1)));
        let jobs = Arc::new(FakeJobStore::new());
        jobs.enqueue(Stage::DownloadObject, ObjectId::new(1)).await.unwrap();
        let deps = deps(store, jobs.clone());

        let scheduled = enqueue_objects(&deps, 10, false, None).await.unwrap();

        assert_eq!(scheduled, 0);
    }

    #[tokio::test]
    async fn stops_at_object_count() {
        let mut store = FakeStore::new();
        for id in 1..=5 {
            store = store.with_object(eligible_object(id));
        }
        let store = Arc::new(store);
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store, jobs.clone());

        let scheduled = enqueue_objects(&deps, 2, false, None).await.unwrap();

        assert_eq!(scheduled, 2);
    }

    #[tokio::test]
    async fn reenqueue_requires_rejected_latest_package() {
        let object = eligible_object(1);
        let store = Arc::new(FakeStore::new().with_object(object));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store, jobs);

        let err = reenqueue_object(&deps, ObjectId::new(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::ReenqueueRefused(_, _)));
    }

    #[tokio::test]
    async fn reenqueue_clears_latest_package_and_schedules_download() {
        let mut object = eligible_object(1);
        let mut package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-1", chrono::Utc::now(), None, None, None);
        package.mark_packaged().unwrap();
        package.mark_uploaded().unwrap();
        package.mark_rejected().unwrap();
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs.clone());

        reenqueue_object(&deps, ObjectId::new(1)).await.unwrap();

        assert!(store.object(ObjectId::new(1)).latest_package_id().is_none());
        assert!(jobs.is_pending(Stage::DownloadObject, ObjectId::new(1)));
    }
}
