// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `reset-workflow` (§3's Package lifecycle note, §8 scenario 6), grounded
//! in `original_source/src/passari_workflow/scripts/reset_workflow.py`.
//! Cancels every Object's still-in-flight package attempt: any latest
//! package that has not yet been uploaded to DPRES is deleted outright (no
//! external system has a copy of it to reconcile against) and the Object's
//! `latest_package` pointer is nulled so it re-enters eligibility
//! evaluation. A package that has already been uploaded is left untouched
//! — only the DPRES reconciler or an operator freeze can settle it from
//! there.
//!
//! Unlike freeze/unfreeze, this takes no caller-supplied id list: the
//! original is a post-backup-restoration recovery tool that scans the
//! whole table for the dangling candidate set itself
//! (`find_dangling_object_ids`, every Object whose latest package is
//! `uploaded == false AND (downloaded OR packaged)`).

use crate::error::EngineError;
use crate::infrastructure::queue::locks::{WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE};
use crate::infrastructure::queue::DistributedLock;
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ResetDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub lock: Arc<dyn DistributedLock>,
    pub package_dir: std::path::PathBuf,
}

/// Resets the in-flight package of every dangling object found by
/// `find_dangling_object_ids`. Returns the ids whose package was actually
/// cancelled.
pub async fn reset_workflow(deps: &ResetDeps) -> Result<Vec<ObjectId>, EngineError> {
    let handle = deps
        .lock
        .acquire(WORKFLOW_LOCK_KEY, WORKFLOW_LOCK_LEASE, Duration::from_secs(30))
        .await?;
    let result = reset_workflow_locked(deps).await;
    deps.lock.release(handle).await?;
    result
}

async fn reset_workflow_locked(deps: &ResetDeps) -> Result<Vec<ObjectId>, EngineError> {
    let object_ids = deps.packages.find_dangling_object_ids().await?;
    info!(count = object_ids.len(), "found dangling objects");
    let mut reset_ids = Vec::new();

    for object_id in object_ids {
        let Some(package) = deps.packages.find_latest_for_object(object_id).await? else {
            continue;
        };
        if package.uploaded() {
            continue;
        }

        let mut object = deps
            .objects
            .find_by_id(object_id)
            .await?
            .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
        object.set_latest_package_id(None);
        deps.objects.update(&object).await?;

        let working_dir = package.workflow_log_dir(&deps.package_dir);
        deps.packages.delete_package(package.id()).await?;
        if working_dir.exists() {
            if let Err(err) = tokio::fs::remove_dir_all(&working_dir).await {
                warn!(object_id = %object_id, error = %err, "best-effort working directory removal failed during reset");
            }
        }

        reset_ids.push(object_id);
    }

    info!(count = reset_ids.len(), "workflow reset complete");
    Ok(reset_ids)
}
