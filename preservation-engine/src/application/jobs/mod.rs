// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Stage job handlers (§4.3). Each public entry point wraps its body in the
//! per-object lock envelope described in §4.2/§5: acquire `lock-object-<id>`
//! for the whole handler duration, run the stage body, release.

pub mod confirm_sip;
pub mod create_sip;
pub mod dispatch;
pub mod download_object;
pub mod freeze;
pub mod submit_sip;

pub use dispatch::{run_one, WorkerDeps};

use crate::error::EngineError;
use crate::infrastructure::queue::{locks::object_lock_key, DistributedLock};
use std::future::Future;
use std::time::Duration;

/// The per-object lock acquire/release envelope every stage handler runs
/// under (§4.2's "per-object mutex", §5's ordering guarantee). A held lock
/// must outlive the longest plausible stage execution, so the acquire
/// timeout here is generous relative to the 4-hour job timeout: a worker
/// that cannot get the lock within a minute is contending with a stuck
/// peer, not a slow one, and should fail fast instead.
pub async fn with_object_lock<F, Fut, T>(
    lock: &dyn DistributedLock,
    object_id: preservation_domain::value_objects::ObjectId,
    body: F,
) -> Result<T, EngineError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let key = object_lock_key(object_id);
    let handle = lock
        .acquire(&key, Duration::from_secs(4 * 60 * 60), Duration::from_secs(60))
        .await?;
    let result = body().await;
    lock.release(handle).await?;
    result
}
