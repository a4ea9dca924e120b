// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Distributed locks (§4.2, §5): `lock-object-<id>` held by stage handlers
//! for the whole handler body, and `workflow-lock` (15-minute lease) held
//! by the planner, freeze, unfreeze, and reset operations. Both are a
//! Redis `SET key value NX PX millis` plus a Lua-scripted compare-and-delete
//! release, the standard single-instance Redlock pattern.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use uuid::Uuid;

pub const WORKFLOW_LOCK_KEY: &str = "workflow-lock";
pub const WORKFLOW_LOCK_LEASE: Duration = Duration::from_secs(15 * 60);

pub fn object_lock_key(object_id: impl std::fmt::Display) -> String {
    format!("lock-object-{object_id}")
}

/// A held lock; dropping it does not release it — callers must call
/// [`DistributedLock::release`] explicitly so release failures are
/// observable instead of silently swallowed in a `Drop` impl.
pub struct LockHandle {
    pub key: String,
    pub token: String,
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Blocks until the lock is acquired (or `timeout` elapses), retrying
    /// at a short fixed interval. The workflow lock's 15-minute lease
    /// means a crashed holder always eventually yields it.
    async fn acquire(&self, key: &str, lease: Duration, timeout: Duration) -> Result<LockHandle, crate::error::EngineError>;

    async fn release(&self, handle: LockHandle) -> Result<(), crate::error::EngineError>;
}

pub struct RedisLock {
    conn: ConnectionManager,
}

impl RedisLock {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(&self, key: &str, lease: Duration, timeout: Duration) -> Result<LockHandle, crate::error::EngineError> {
        let token = Uuid::new_v4().to_string();
        let mut conn = self.conn.clone();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let acquired: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(lease.as_millis() as u64)
                .query_async(&mut conn)
                .await?;
            if acquired.is_some() {
                return Ok(LockHandle { key: key.to_string(), token });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(crate::error::EngineError::LockContended(key.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    async fn release(&self, handle: LockHandle) -> Result<(), crate::error::EngineError> {
        const RELEASE_SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        let mut conn = self.conn.clone();
        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&handle.key)
            .arg(&handle.token)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }
}
