// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bulk unfreeze (§4.4), grounded in
//! `original_source/src/passari_workflow/scripts/unfreeze_objects.py`.

use crate::error::EngineError;
use crate::infrastructure::queue::locks::{WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE};
use crate::infrastructure::queue::{DistributedLock, JobStore, Stage};
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct UnfreezeDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub jobs: Arc<dyn JobStore>,
    pub lock: Arc<dyn DistributedLock>,
}

pub struct UnfreezeRequest<'a> {
    pub reason: Option<&'a str>,
    pub ids: Option<&'a [ObjectId]>,
    pub enqueue: bool,
}

/// Returns the ids unfrozen. At least one of `reason`/`ids` must be
/// supplied — matching nothing is refused, not silently a no-op, because an
/// operator call with neither usually means a typo'd filter.
pub async fn unfreeze_objects(deps: &UnfreezeDeps, request: UnfreezeRequest<'_>) -> Result<Vec<ObjectId>, EngineError> {
    if request.reason.is_none() && request.ids.is_none() {
        return Err(DomainError::InvalidOperation(
            "unfreeze requires at least one of: reason filter, explicit object ids".to_string(),
        )
        .into());
    }

    let handle = deps
        .lock
        .acquire(WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE, Duration::from_secs(30))
        .await?;
    let result = unfreeze_objects_locked(deps, request).await;
    deps.lock.release(handle).await?;
    result
}

async fn unfreeze_objects_locked(deps: &UnfreezeDeps, request: UnfreezeRequest<'_>) -> Result<Vec<ObjectId>, EngineError> {
    let frozen = deps.objects.find_frozen(request.reason, request.ids).await?;
    let mut unfrozen = Vec::with_capacity(frozen.len());

    for mut object in frozen {
        let object_id = object.id();
        object.unfreeze();

        let latest_is_preserved = match deps.packages.find_latest_for_object(object_id).await? {
            Some(package) => package.preserved(),
            None => false,
        };
        if !latest_is_preserved {
            object.set_latest_package_id(None);
        }

        deps.objects.update(&object).await?;
        unfrozen.push(object_id);

        if request.enqueue {
            deps.jobs.enqueue(Stage::DownloadObject, object_id).await?;
        }
    }

    info!(count = unfrozen.len(), "bulk unfreeze complete");
    Ok(unfrozen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeJobStore, FakeStore, NoopLock};
    use chrono::Utc;
    use preservation_domain::entities::{Object, Package};
    use preservation_domain::value_objects::{FreezeSource, PackageId};

    fn deps(store: Arc<FakeStore>, jobs: Arc<FakeJobStore>) -> UnfreezeDeps {
        UnfreezeDeps { objects: store.clone(), packages: store, jobs, lock: Arc::new(NoopLock) }
    }

    /// §8's freeze/unfreeze round-trip: `latest_package` only clears when
    /// the prior package was not preserved.
    #[tokio::test]
    async fn unfreeze_nulls_latest_package_when_not_preserved() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        object.freeze("operator request", FreezeSource::User);
        let package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-1", Utc::now(), None, None, None);
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs);

        let request = UnfreezeRequest { reason: None, ids: Some(&[ObjectId::new(1)]), enqueue: false };
        let unfrozen = unfreeze_objects(&deps, request).await.unwrap();

        assert_eq!(unfrozen, vec![ObjectId::new(1)]);
        let object = store.object(ObjectId::new(1));
        assert!(!object.frozen());
        assert!(object.latest_package_id().is_none());
    }

    #[tokio::test]
    async fn unfreeze_keeps_latest_package_when_preserved() {
        let mut object = Object::new(ObjectId::new(1), "t", None, None);
        object.freeze("operator request", FreezeSource::User);
        let mut package = Package::new_downloaded(PackageId::new(1), ObjectId::new(1), "obj1.tar", "sip-1", Utc::now(), None, None, None);
        package.mark_packaged().unwrap();
        package.mark_uploaded().unwrap();
        package.mark_preserved().unwrap();
        object.set_latest_package_id(Some(package.id()));
        let store = Arc::new(FakeStore::new().with_object(object).with_package(package));
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store.clone(), jobs);

        let request = UnfreezeRequest { reason: None, ids: Some(&[ObjectId::new(1)]), enqueue: false };
        unfreeze_objects(&deps, request).await.unwrap();

        assert_eq!(store.object(ObjectId::new(1)).latest_package_id(), Some(PackageId::new(1)));
    }

    #[tokio::test]
    async fn requires_a_reason_or_explicit_ids() {
        let store = Arc::new(FakeStore::new());
        let jobs = Arc::new(FakeJobStore::new());
        let deps = deps(store, jobs);

        let request = UnfreezeRequest { reason: None, ids: None, enqueue: false };
        let err = unfreeze_objects(&deps, request).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::InvalidOperation(_))));
    }
}
