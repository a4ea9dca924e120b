// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The RQ-like job queue (§4.2): named stage queues, distributed locks, and
//! the heartbeat registry, all backed by one Redis connection.

pub mod heartbeat;
pub mod locks;
pub mod redis_job_store;
pub mod store;

pub use heartbeat::{HeartbeatSource, Heartbeats};
pub use locks::{DistributedLock, RedisLock};
pub use redis_job_store::RedisJobStore;
pub use store::{job_id_to_object_id, stage_job_id, Job, JobState, JobStore, Stage};
