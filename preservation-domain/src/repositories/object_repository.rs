// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::entities::Object;
use crate::error::DomainError;
use crate::value_objects::ObjectId;
use async_trait::async_trait;
use chrono::Duration;

/// Persistence port for Objects, including the two eligibility query
/// transformations §4.1 requires: `find_preservation_pending` and its
/// complement, each of which must partition the full object set.
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Object>, DomainError>;

    async fn save_new(&self, object: &Object) -> Result<(), DomainError>;

    async fn update(&self, object: &Object) -> Result<(), DomainError>;

    async fn bulk_insert(&self, objects: &[Object]) -> Result<(), DomainError>;

    async fn bulk_update_sync_fields(&self, objects: &[Object]) -> Result<(), DomainError>;

    async fn exists_all(&self, ids: &[ObjectId]) -> Result<Vec<ObjectId>, DomainError>;

    /// Fetches the full current rows for any of `ids` that exist, so a
    /// sync caller can apply its never-regress guard in memory before
    /// writing an update back (§4.5).
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Object>, DomainError>;

    /// Objects for which `preservation_pending` holds, restricted to
    /// `object_ids` when provided, paged `limit`-at-a-time from `offset`,
    /// ordered randomly when `random_order` is set.
    async fn find_preservation_pending(
        &self,
        preservation_delay: Duration,
        update_delay: Duration,
        object_ids: Option<&[ObjectId]>,
        random_order: bool,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Object>, DomainError>;

    /// The complement of `find_preservation_pending` over the whole table;
    /// used only by the partition-invariant tests (§8).
    async fn count_preservation_excluded(
        &self,
        preservation_delay: Duration,
        update_delay: Duration,
    ) -> Result<i64, DomainError>;

    async fn count_preservation_pending(
        &self,
        preservation_delay: Duration,
        update_delay: Duration,
    ) -> Result<i64, DomainError>;

    async fn find_frozen(&self, reason: Option<&str>, ids: Option<&[ObjectId]>) -> Result<Vec<Object>, DomainError>;

    async fn replace_attachment_links(&self, object_id: ObjectId, attachment_ids: &[crate::value_objects::AttachmentId]) -> Result<(), DomainError>;

    /// Inserts placeholder rows for object ids referenced by an attachment
    /// sync page but not yet seen by the object sync itself (§4.5
    /// cross-reference resolution, the mirror image of
    /// `AttachmentRepository::insert_placeholders`).
    async fn insert_placeholders(&self, ids: &[ObjectId]) -> Result<(), DomainError>;
}
