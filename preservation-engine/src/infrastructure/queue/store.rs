// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The job-store port (§4.2). Grounded in
//! `original_source/src/passari_workflow/queue/queues.py`'s RQ wrapper: a
//! pending list, a started-job registry, and a failed-job registry per
//! queue, addressed by a job id that always encodes `<stage>_<object_id>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preservation_domain::value_objects::ObjectId;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The four stage queues plus the auxiliary planner queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DownloadObject,
    CreateSip,
    SubmitSip,
    ConfirmSip,
    EnqueueObjects,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::DownloadObject,
        Stage::CreateSip,
        Stage::SubmitSip,
        Stage::ConfirmSip,
        Stage::EnqueueObjects,
    ];

    pub const ALL_STAGE_QUEUES: [Stage; 4] =
        [Stage::DownloadObject, Stage::CreateSip, Stage::SubmitSip, Stage::ConfirmSip];

    pub fn queue_name(&self) -> &'static str {
        match self {
            Stage::DownloadObject => "download_object",
            Stage::CreateSip => "create_sip",
            Stage::SubmitSip => "submit_sip",
            Stage::ConfirmSip => "confirm_sip",
            Stage::EnqueueObjects => "enqueue_objects",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.queue_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Started,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub stage: Stage,
    pub object_id: ObjectId,
    pub state: JobState,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}

/// `<stage>_<object_id>`, per §4.2's job-id convention.
pub fn stage_job_id(stage: Stage, object_id: ObjectId) -> String {
    format!("{}_{}", stage.queue_name(), object_id)
}

/// Parses the trailing integer off any job id, regardless of stage name.
pub fn job_id_to_object_id(job_id: &str) -> Option<ObjectId> {
    let underscore = job_id.rfind('_')?;
    job_id[underscore + 1..].parse::<i64>().ok().map(ObjectId::new)
}

/// Default job timeout (§4.2): jobs exceeding this are considered failed.
pub const DEFAULT_JOB_TIMEOUT_SECS: i64 = 4 * 60 * 60;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Enqueues a job with id `stage_job_id(stage, object_id)`. A no-op
    /// (not an error) if a job with that id is already pending or started —
    /// the id convention itself enforces at-most-one-scheduled.
    async fn enqueue(&self, stage: Stage, object_id: ObjectId) -> Result<(), crate::error::EngineError>;

    /// Pops the next pending job off `stage`'s queue and marks it started,
    /// atomically from the worker's point of view. Returns `None` when the
    /// queue is empty. The worker loop (§5's "parallel workers, any number
    /// per queue") is the only caller.
    async fn dequeue(&self, stage: Stage) -> Result<Option<ObjectId>, crate::error::EngineError>;

    /// Marks a job started; called by the handler envelope before running
    /// the stage body.
    async fn mark_started(&self, stage: Stage, object_id: ObjectId) -> Result<(), crate::error::EngineError>;

    /// Marks a pending/started job finished, removing it from every
    /// registry.
    async fn mark_finished(&self, stage: Stage, object_id: ObjectId) -> Result<(), crate::error::EngineError>;

    /// Moves a job to the failed registry with a failure message.
    async fn mark_failed(&self, stage: Stage, object_id: ObjectId, reason: &str) -> Result<(), crate::error::EngineError>;

    /// Union of pending, started, and failed job object ids across every
    /// stage queue.
    async fn enqueued_object_ids(&self) -> Result<HashSet<ObjectId>, crate::error::EngineError>;

    /// Started-only object ids across every stage queue.
    async fn running_object_ids(&self) -> Result<HashSet<ObjectId>, crate::error::EngineError>;

    /// Reverse mapping from object id to the queue names (including the
    /// virtual `failed` queue) it currently appears on.
    async fn object_id_to_queues(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, Vec<String>>, crate::error::EngineError>;

    /// Removes every job whose id matches `*_<object_id>` across all
    /// stages and registries. Returns the count removed.
    async fn delete_jobs_for_object(&self, object_id: ObjectId) -> Result<u64, crate::error::EngineError>;
}
