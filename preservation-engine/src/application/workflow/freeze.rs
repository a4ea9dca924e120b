// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bulk administrative freeze (§4.4), grounded in
//! `original_source/src/passari_workflow/scripts/freeze_objects.py`.
//! Distinct from [`crate::application::jobs::freeze::freeze_running_object`],
//! which is the failure-path freeze a single stage job performs already
//! inside its own per-object lock; this one runs over many objects at once
//! under the global workflow lock.

use crate::application::jobs::freeze::best_effort_archive_logs;
use crate::error::EngineError;
use crate::infrastructure::queue::locks::{WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE};
use crate::infrastructure::queue::{DistributedLock, JobStore};
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::{FreezeSource, ObjectId};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct FreezeDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub jobs: Arc<dyn JobStore>,
    pub lock: Arc<dyn DistributedLock>,
    pub package_dir: std::path::PathBuf,
    pub archive_dir: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FreezeOutcome {
    pub freeze_count: u64,
    pub cancel_count: u64,
}

/// Freezes every object in `object_ids`, under the workflow lock.
///
/// Refuses with [`DomainError::WorkflowJobRunning`] (no partial effect) if
/// any supplied object currently has a *running* job — pending/failed jobs
/// don't block a freeze, only a job a worker is actively executing.
pub async fn freeze_objects(
    deps: &FreezeDeps,
    object_ids: &[ObjectId],
    reason: &str,
    source: FreezeSource,
    delete_jobs: bool,
) -> Result<FreezeOutcome, EngineError> {
    let handle = deps
        .lock
        .acquire(WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE, Duration::from_secs(30))
        .await?;
    let result = freeze_objects_locked(deps, object_ids, reason, source, delete_jobs).await;
    deps.lock.release(handle).await?;
    result
}

async fn freeze_objects_locked(
    deps: &FreezeDeps,
    object_ids: &[ObjectId],
    reason: &str,
    source: FreezeSource,
    delete_jobs: bool,
) -> Result<FreezeOutcome, EngineError> {
    let running = deps.jobs.running_object_ids().await?;
    let running_targets: Vec<i64> = object_ids.iter().filter(|id| running.contains(id)).map(|id| id.value()).collect();
    if !running_targets.is_empty() {
        return Err(DomainError::WorkflowJobRunning(running_targets).into());
    }

    let mut freeze_count = 0u64;
    let mut cancel_count = 0u64;

    for &object_id in object_ids {
        let mut object = deps
            .objects
            .find_by_id(object_id)
            .await?
            .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
        object.freeze(reason, source);
        deps.objects.update(&object).await?;
        freeze_count += 1;

        if let Some(mut package) = deps.packages.find_latest_for_object(object_id).await? {
            if !package.is_terminal() {
                let _ = package.mark_cancelled();
                deps.packages.mark_cancelled(package.id()).await?;
                cancel_count += 1;
            }

            let working_dir = package.workflow_log_dir(&deps.package_dir);
            let archive_target = package.archive_log_dir(&deps.archive_dir);
            if let Err(err) = best_effort_archive_logs(&working_dir, &archive_target).await {
                tracing::warn!(object_id = %object_id, error = %err, "best-effort log archive failed during bulk freeze");
            }

            if delete_jobs {
                deps.jobs.delete_jobs_for_object(object_id).await?;
                if working_dir.exists() {
                    let _ = tokio::fs::remove_dir_all(&working_dir).await;
                }
            }
        } else if delete_jobs {
            deps.jobs.delete_jobs_for_object(object_id).await?;
        }
    }

    info!(freeze_count, cancel_count, "bulk freeze complete");
    Ok(FreezeOutcome { freeze_count, cancel_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeJobStore, FakeStore, NoopLock};
    use chrono::Utc;
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::PackageId;

    fn deps(store: Arc<FakeStore>, jobs: Arc<FakeJobStore>) -> FreezeDeps {
        FreezeDeps {
            objects: store.clone(),
            packages: store,
            jobs,
            lock: Arc::new(NoopLock),
            package_dir: std::path::PathBuf::from("/nonexistent/packages"),
            archive_dir: std::path::PathBuf::from("/nonexistent/archive"),
        }
    }

    #[tokio::test]
    async fn freezes_objects_and_cancels_non_terminal_latest_packages() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        let package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-1", Utc::now(), None, None, None);
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs);

        let outcome = freeze_objects(&deps, &[ObjectId::new(1)], "operator request", FreezeSource::User, false).await.unwrap();

        assert_eq!(outcome.freeze_count, 1);
        assert_eq!(outcome.cancel_count, 1);
        assert!(store.object(ObjectId::new(1)).frozen());
        assert!(store.package(PackageId::new(1)).cancelled());
    }

    #[tokio::test]
    async fn refuses_when_a_target_has_a_running_job() {
        let object = Object::new(ObjectId::new(1), "t", None, None);
        let store = Arc::new(FakeStore::new().with_object(object));
        let jobs = Arc::new(FakeJobStore::new());
        jobs.enqueue(crate::infrastructure::queue::Stage::DownloadObject, ObjectId::new(1)).await.unwrap();
        jobs.dequeue(crate::infrastructure::queue::Stage::DownloadObject).await.unwrap();
        let deps = deps(store, jobs);

        let err = freeze_objects(&deps, &[ObjectId::new(1)], "operator request", FreezeSource::User, false).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::WorkflowJobRunning(_))));
    }

    #[tokio::test]
    async fn delete_jobs_removes_queued_entries() {
        let object = Object::new(ObjectId::new(1), "t", None, None);
        let store = Arc::new(FakeStore::new().with_object(object));
        let jobs = Arc::new(FakeJobStore::new());
        jobs.enqueue(crate::infrastructure::queue::Stage::CreateSip, ObjectId::new(1)).await.unwrap();
        let deps = deps(store, jobs.clone());

        freeze_objects(&deps, &[ObjectId::new(1)], "operator request", FreezeSource::User, true).await.unwrap();

        assert!(jobs.enqueued_object_ids().await.unwrap().is_empty());
    }
}
