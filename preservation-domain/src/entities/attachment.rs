// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::value_objects::{AttachmentId, MetadataHash};
use chrono::{DateTime, Utc};

/// One CMS multimedia record, shared across any number of Objects and
/// Packages (captured via association tables, not here).
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    id: AttachmentId,
    filename: String,
    created_date: Option<DateTime<Utc>>,
    modified_date: Option<DateTime<Utc>>,
    metadata_hash: Option<MetadataHash>,
}

impl Attachment {
    pub fn new(
        id: AttachmentId,
        filename: impl Into<String>,
        created_date: Option<DateTime<Utc>>,
        modified_date: Option<DateTime<Utc>>,
        metadata_hash: Option<String>,
    ) -> Self {
        Self {
            id,
            filename: filename.into(),
            created_date,
            modified_date,
            metadata_hash: metadata_hash.map(MetadataHash::new),
        }
    }

    /// A placeholder row created when CMS Sync encounters a cross-reference
    /// to an attachment id it hasn't fetched the full record for yet.
    pub fn placeholder(id: AttachmentId) -> Self {
        Self {
            id,
            filename: String::new(),
            created_date: None,
            modified_date: None,
            metadata_hash: None,
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }

    pub fn modified_date(&self) -> Option<DateTime<Utc>> {
        self.modified_date
    }

    pub fn metadata_hash(&self) -> Option<&MetadataHash> {
        self.metadata_hash.as_ref()
    }

    pub fn apply_sync_update(
        &mut self,
        filename: String,
        created_date: Option<DateTime<Utc>>,
        modified_date: Option<DateTime<Utc>>,
        metadata_hash: Option<String>,
    ) {
        self.filename = filename;
        self.created_date = created_date;
        self.modified_date = modified_date;
        self.metadata_hash = metadata_hash.map(MetadataHash::new);
    }
}
