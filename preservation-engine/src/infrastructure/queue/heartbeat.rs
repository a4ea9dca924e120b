// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Heartbeat registry (§4.8), named per
//! `original_source/src/passari_workflow/heartbeat.py`'s `HeartbeatSource`
//! enum. Each source's last-successful-run timestamp is stored under
//! `heartbeat:<source>` as a UNIX timestamp; external monitoring polls
//! [`Heartbeats::get_heartbeats`] to alert on a stalled recurring task.

use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeartbeatSource {
    SyncProcessedSips,
    SyncAttachments,
    SyncObjects,
    SyncHashes,
}

impl HeartbeatSource {
    pub const ALL: [HeartbeatSource; 4] = [
        HeartbeatSource::SyncProcessedSips,
        HeartbeatSource::SyncAttachments,
        HeartbeatSource::SyncObjects,
        HeartbeatSource::SyncHashes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HeartbeatSource::SyncProcessedSips => "sync_processed_sips",
            HeartbeatSource::SyncAttachments => "sync_attachments",
            HeartbeatSource::SyncObjects => "sync_objects",
            HeartbeatSource::SyncHashes => "sync_hashes",
        }
    }

    fn redis_key(&self) -> String {
        format!("heartbeat:{}", self.name())
    }
}

pub struct Heartbeats {
    conn: ConnectionManager,
}

impl Heartbeats {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn submit(&self, source: HeartbeatSource) -> Result<(), crate::error::EngineError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        conn.set::<_, _, ()>(source.redis_key(), now).await?;
        Ok(())
    }

    pub async fn get_heartbeats(&self) -> Result<HashMap<HeartbeatSource, Option<DateTime<Utc>>>, crate::error::EngineError> {
        let mut conn = self.conn.clone();
        let mut out = HashMap::with_capacity(HeartbeatSource::ALL.len());
        for source in HeartbeatSource::ALL {
            let raw: Option<i64> = conn.get(source.redis_key()).await?;
            out.insert(source, raw.and_then(|secs| Utc.timestamp_opt(secs, 0).single()));
        }
        Ok(out)
    }
}
