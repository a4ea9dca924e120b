// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::entities::SyncStatus;
use crate::error::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait SyncStatusRepository: Send + Sync {
    async fn get(&self, kind: &str) -> Result<SyncStatus, DomainError>;

    async fn save(&self, status: &SyncStatus) -> Result<(), DomainError>;
}
