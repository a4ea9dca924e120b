// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};

/// Resumable-offset and prior-run cursor for one named recurring sync
/// (`sync_objects`, `sync_attachments`). Created lazily on first use.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    name: String,
    start_sync_date: Option<DateTime<Utc>>,
    prev_start_sync_date: Option<DateTime<Utc>>,
    offset: i64,
}

impl SyncStatus {
    pub fn new_idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_sync_date: None,
            prev_start_sync_date: None,
            offset: 0,
        }
    }

    pub fn from_row(
        name: String,
        start_sync_date: Option<DateTime<Utc>>,
        prev_start_sync_date: Option<DateTime<Utc>>,
        offset: i64,
    ) -> Self {
        Self { name, start_sync_date, prev_start_sync_date, offset }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_sync_date(&self) -> Option<DateTime<Utc>> {
        self.start_sync_date
    }

    pub fn prev_start_sync_date(&self) -> Option<DateTime<Utc>> {
        self.prev_start_sync_date
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Marks the start of a new run if one isn't already in progress.
    /// Returns `true` if this call actually set `start_sync_date` (the
    /// caller must persist the change in that case).
    pub fn begin_if_idle(&mut self, now: DateTime<Utc>) -> bool {
        if self.start_sync_date.is_none() {
            self.start_sync_date = Some(now);
            true
        } else {
            false
        }
    }

    pub fn update_offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    /// Rolls the cursor on successful full completion: the just-finished
    /// run's start becomes the next run's "modified since" boundary.
    pub fn finish(&mut self) {
        self.prev_start_sync_date = self.start_sync_date.take();
        self.offset = 0;
    }
}
