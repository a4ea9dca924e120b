// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The CMS HTTP API client port (spec.md's "deliberately out of scope"
//! collaborator). What the sync engine needs is a paged, resumable pull of
//! object/attachment records with cross-references — this is that contract,
//! not the wire protocol behind it.

use crate::value_objects::{AttachmentId, ObjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One CMS object record as delivered by the upstream paged iterator.
#[derive(Debug, Clone)]
pub struct CmsObjectRecord {
    pub id: ObjectId,
    pub title: String,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub metadata_hash: Option<String>,
    pub attachment_ids: Vec<AttachmentId>,
}

/// One CMS attachment record.
#[derive(Debug, Clone)]
pub struct CmsAttachmentRecord {
    pub id: AttachmentId,
    pub filename: String,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub metadata_hash: Option<String>,
    pub object_ids: Vec<ObjectId>,
}

/// A single page pulled from the upstream iterator.
pub struct Page<T> {
    pub records: Vec<T>,
    /// `true` when this was the last page available for the current
    /// `(offset, modified_since)` cursor.
    pub exhausted: bool,
}

#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Pulls up to `limit` object records starting at `offset`, restricted
    /// to records modified at/after `modified_since` when provided (a
    /// `None` value means a full sweep).
    async fn fetch_objects_page(
        &self,
        offset: i64,
        modified_since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Page<CmsObjectRecord>, crate::error::DomainError>;

    async fn fetch_attachments_page(
        &self,
        offset: i64,
        modified_since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Page<CmsAttachmentRecord>, crate::error::DomainError>;
}
