// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `JobStore` over Redis. Each stage queue keeps three keys: a pending list
//! (`queue:<stage>:pending`), a started hash (`queue:<stage>:started`,
//! job id → started-at), and a failed hash (`queue:<stage>:failed`, job id
//! → failure message). This mirrors RQ's own `Queue`/`StartedJobRegistry`/
//! `FailedJobRegistry` split closely enough that the operational semantics
//! (§4.2) carry over directly.

use super::store::{job_id_to_object_id, stage_job_id, JobStore, Stage};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::Utc;
use preservation_domain::value_objects::ObjectId;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::{HashMap, HashSet};

pub struct RedisJobStore {
    conn: ConnectionManager,
}

impl RedisJobStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn pending_key(stage: Stage) -> String {
        format!("queue:{}:pending", stage.queue_name())
    }

    fn started_key(stage: Stage) -> String {
        format!("queue:{}:started", stage.queue_name())
    }

    fn failed_key(stage: Stage) -> String {
        format!("queue:{}:failed", stage.queue_name())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn enqueue(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let id = stage_job_id(stage, object_id);
        let already_pending: bool = conn.lpos(Self::pending_key(stage), &id, Default::default()).await.map(|p: Option<i64>| p.is_some())?;
        let already_started: bool = conn.hexists(Self::started_key(stage), &id).await?;
        if already_pending || already_started {
            return Ok(());
        }
        conn.rpush::<_, _, ()>(Self::pending_key(stage), &id).await?;
        Ok(())
    }

    async fn mark_started(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let id = stage_job_id(stage, object_id);
        conn.lrem::<_, _, ()>(Self::pending_key(stage), 0, &id).await?;
        conn.hset::<_, _, _, ()>(Self::started_key(stage), &id, Utc::now().timestamp()).await?;
        Ok(())
    }

    async fn dequeue(&self, stage: Stage) -> Result<Option<ObjectId>, EngineError> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.lpop(Self::pending_key(stage), None).await?;
        let Some(id) = id else {
            return Ok(None);
        };
        conn.hset::<_, _, _, ()>(Self::started_key(stage), &id, Utc::now().timestamp()).await?;
        Ok(job_id_to_object_id(&id))
    }

    async fn mark_finished(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let id = stage_job_id(stage, object_id);
        conn.lrem::<_, _, ()>(Self::pending_key(stage), 0, &id).await?;
        conn.hdel::<_, _, ()>(Self::started_key(stage), &id).await?;
        conn.hdel::<_, _, ()>(Self::failed_key(stage), &id).await?;
        Ok(())
    }

    async fn mark_failed(&self, stage: Stage, object_id: ObjectId, reason: &str) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let id = stage_job_id(stage, object_id);
        conn.lrem::<_, _, ()>(Self::pending_key(stage), 0, &id).await?;
        conn.hdel::<_, _, ()>(Self::started_key(stage), &id).await?;
        conn.hset::<_, _, _, ()>(Self::failed_key(stage), &id, reason).await?;
        Ok(())
    }

    async fn enqueued_object_ids(&self) -> Result<HashSet<ObjectId>, EngineError> {
        let mut conn = self.conn.clone();
        let mut ids = HashSet::new();
        for stage in Stage::ALL_STAGE_QUEUES {
            let pending: Vec<String> = conn.lrange(Self::pending_key(stage), 0, -1).await?;
            let started: Vec<String> = conn.hkeys(Self::started_key(stage)).await?;
            let failed: Vec<String> = conn.hkeys(Self::failed_key(stage)).await?;
            for job_id in pending.iter().chain(started.iter()).chain(failed.iter()) {
                if let Some(object_id) = job_id_to_object_id(job_id) {
                    ids.insert(object_id);
                }
            }
        }
        Ok(ids)
    }

    async fn running_object_ids(&self) -> Result<HashSet<ObjectId>, EngineError> {
        let mut conn = self.conn.clone();
        let mut ids = HashSet::new();
        for stage in Stage::ALL_STAGE_QUEUES {
            let started: Vec<String> = conn.hkeys(Self::started_key(stage)).await?;
            for job_id in started {
                if let Some(object_id) = job_id_to_object_id(&job_id) {
                    ids.insert(object_id);
                }
            }
        }
        Ok(ids)
    }

    async fn object_id_to_queues(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, Vec<String>>, EngineError> {
        let mut conn = self.conn.clone();
        let wanted: HashSet<ObjectId> = ids.iter().copied().collect();
        let mut out: HashMap<ObjectId, Vec<String>> = HashMap::new();
        for stage in Stage::ALL_STAGE_QUEUES {
            let pending: Vec<String> = conn.lrange(Self::pending_key(stage), 0, -1).await?;
            let started: Vec<String> = conn.hkeys(Self::started_key(stage)).await?;
            let failed: Vec<String> = conn.hkeys(Self::failed_key(stage)).await?;
            for job_id in pending.iter().chain(started.iter()) {
                if let Some(object_id) = job_id_to_object_id(job_id) {
                    if wanted.contains(&object_id) {
                        out.entry(object_id).or_default().push(stage.queue_name().to_string());
                    }
                }
            }
            for job_id in &failed {
                if let Some(object_id) = job_id_to_object_id(job_id) {
                    if wanted.contains(&object_id) {
                        out.entry(object_id).or_default().push("failed".to_string());
                    }
                }
            }
        }
        Ok(out)
    }

    async fn delete_jobs_for_object(&self, object_id: ObjectId) -> Result<u64, EngineError> {
        let mut conn = self.conn.clone();
        let mut removed = 0u64;
        for stage in Stage::ALL_STAGE_QUEUES {
            let id = stage_job_id(stage, object_id);
            let from_pending: i64 = conn.lrem(Self::pending_key(stage), 0, &id).await?;
            let from_started: i64 = conn.hdel(Self::started_key(stage), &id).await?;
            let from_failed: i64 = conn.hdel(Self::failed_key(stage), &id).await?;
            removed += (from_pending + from_started + from_failed) as u64;
        }
        Ok(removed)
    }
}
