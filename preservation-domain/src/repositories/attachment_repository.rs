// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::entities::Attachment;
use crate::error::DomainError;
use crate::value_objects::AttachmentId;
use async_trait::async_trait;

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, DomainError>;

    async fn find_by_ids(&self, ids: &[AttachmentId]) -> Result<Vec<Attachment>, DomainError>;

    async fn bulk_insert(&self, attachments: &[Attachment]) -> Result<(), DomainError>;

    async fn bulk_update_sync_fields(&self, attachments: &[Attachment]) -> Result<(), DomainError>;

    /// Inserts placeholder rows for attachment ids referenced by an object
    /// sync page but not yet seen by the attachment sync itself (§4.2.2
    /// cross-reference resolution).
    async fn insert_placeholders(&self, ids: &[AttachmentId]) -> Result<(), DomainError>;

    /// Replaces the full set of Objects an Attachment is cross-referenced
    /// with — the mirror image of `ObjectRepository::replace_attachment_links`,
    /// used by `sync_attachments` (§4.5). The union for the whole chunk is
    /// applied, not a diff against what was there before.
    async fn replace_object_links(&self, attachment_id: AttachmentId, object_ids: &[crate::value_objects::ObjectId]) -> Result<(), DomainError>;
}
