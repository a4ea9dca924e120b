// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker-loop dispatch (§5's "parallel workers, any number per queue").
//! Each stage queue only ever carries an object id (§4.2's job-id
//! convention); `create_sip`/`submit_sip`/`confirm_sip` additionally need
//! the in-flight `sip_id`, which this module derives from the object's
//! `latest_package_id` at dequeue time rather than threading it through the
//! queue itself.

use super::{confirm_sip, create_sip, download_object, submit_sip, with_object_lock};
use crate::error::EngineError;
use crate::infrastructure::queue::{DistributedLock, JobStore, Stage};
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{ObjectRepository, PackageRepository};
use preservation_domain::value_objects::ObjectId;
use std::sync::Arc;
use tracing::warn;

pub struct WorkerDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub download: download_object::DownloadObjectDeps,
    pub create: create_sip::CreateSipDeps,
    pub submit: submit_sip::SubmitSipDeps,
    pub confirm: confirm_sip::ConfirmSipDeps,
    pub jobs: Arc<dyn JobStore>,
    pub lock: Arc<dyn DistributedLock>,
}

/// Dequeues and runs at most one job from `stage`. Returns `true` if a job
/// was found (whether it then succeeded or failed), `false` if the queue
/// was empty — callers use this to decide whether to poll again
/// immediately or back off.
pub async fn run_one(deps: &WorkerDeps, stage: Stage) -> Result<bool, EngineError> {
    let Some(object_id) = deps.jobs.dequeue(stage).await? else {
        return Ok(false);
    };

    let objects = &deps.objects;
    let packages = &deps.packages;
    let result = with_object_lock(deps.lock.as_ref(), object_id, || async move {
        match stage {
            Stage::DownloadObject => download_object::download_object(&deps.download, object_id).await,
            Stage::CreateSip => {
                let sip_id = current_sip_id(objects, packages, object_id).await?;
                create_sip::create_sip(&deps.create, object_id, &sip_id).await
            }
            Stage::SubmitSip => {
                let sip_id = current_sip_id(objects, packages, object_id).await?;
                submit_sip::submit_sip(&deps.submit, object_id, &sip_id).await
            }
            Stage::ConfirmSip => {
                let sip_id = current_sip_id(objects, packages, object_id).await?;
                confirm_sip::confirm_sip(&deps.confirm, object_id, &sip_id).await
            }
            Stage::EnqueueObjects => Ok(()),
        }
    })
    .await;

    match result {
        Ok(()) => deps.jobs.mark_finished(stage, object_id).await?,
        Err(err) => {
            warn!(object_id = %object_id, stage = stage.queue_name(), error = %err, "stage job failed");
            deps.jobs.mark_failed(stage, object_id, &err.to_string()).await?;
        }
    }
    Ok(true)
}

async fn current_sip_id(
    objects: &Arc<dyn ObjectRepository>,
    packages: &Arc<dyn PackageRepository>,
    object_id: ObjectId,
) -> Result<String, EngineError> {
    let object = objects
        .find_by_id(object_id)
        .await?
        .ok_or(DomainError::ObjectNotFound(object_id.value()))?;
    let package_id = object
        .latest_package_id()
        .ok_or_else(|| DomainError::PackageNotFound(format!("object {object_id} has no latest package")))?;
    let package = packages
        .find_by_id(package_id)
        .await?
        .ok_or_else(|| DomainError::PackageNotFound(package_id.to_string()))?;
    Ok(package.sip_id().to_string())
}
