// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::error::DomainError;
use crate::value_objects::{AttachmentDigest, MetadataHash, ObjectId, PackageId};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// One packaging attempt of one Object. The four stage flags
/// (`downloaded`, `packaged`, `uploaded`) plus the mutually-exclusive
/// terminal trio (`preserved`, `rejected`, `cancelled`) are monotone: once
/// set they are never cleared within the lifetime of a single Package row.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    id: PackageId,
    object_id: ObjectId,
    sip_filename: String,
    sip_id: String,
    downloaded: bool,
    packaged: bool,
    uploaded: bool,
    rejected: bool,
    preserved: bool,
    cancelled: bool,
    object_modified_date: Option<DateTime<Utc>>,
    created_date: DateTime<Utc>,
    metadata_hash: Option<MetadataHash>,
    attachment_metadata_hash: AttachmentDigest,
}

impl Package {
    #[allow(clippy::too_many_arguments)]
    pub fn new_downloaded(
        id: PackageId,
        object_id: ObjectId,
        sip_filename: impl Into<String>,
        sip_id: impl Into<String>,
        created_date: DateTime<Utc>,
        object_modified_date: Option<DateTime<Utc>>,
        metadata_hash: Option<String>,
        attachment_metadata_hash: Option<String>,
    ) -> Self {
        Self {
            id,
            object_id,
            sip_filename: sip_filename.into(),
            sip_id: sip_id.into(),
            downloaded: true,
            packaged: false,
            uploaded: false,
            rejected: false,
            preserved: false,
            cancelled: false,
            object_modified_date,
            created_date,
            metadata_hash: metadata_hash.map(MetadataHash::new),
            attachment_metadata_hash: AttachmentDigest::from_column(attachment_metadata_hash.as_deref()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_row(
        id: PackageId,
        object_id: ObjectId,
        sip_filename: String,
        sip_id: String,
        downloaded: bool,
        packaged: bool,
        uploaded: bool,
        rejected: bool,
        preserved: bool,
        cancelled: bool,
        object_modified_date: Option<DateTime<Utc>>,
        created_date: DateTime<Utc>,
        metadata_hash: Option<String>,
        attachment_metadata_hash: Option<String>,
    ) -> Self {
        Self {
            id,
            object_id,
            sip_filename,
            sip_id,
            downloaded,
            packaged,
            uploaded,
            rejected,
            preserved,
            cancelled,
            object_modified_date,
            created_date,
            metadata_hash: metadata_hash.map(MetadataHash::new),
            attachment_metadata_hash: AttachmentDigest::from_column(attachment_metadata_hash.as_deref()),
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn sip_filename(&self) -> &str {
        &self.sip_filename
    }

    pub fn sip_id(&self) -> &str {
        &self.sip_id
    }

    pub fn downloaded(&self) -> bool {
        self.downloaded
    }

    pub fn packaged(&self) -> bool {
        self.packaged
    }

    pub fn uploaded(&self) -> bool {
        self.uploaded
    }

    pub fn rejected(&self) -> bool {
        self.rejected
    }

    pub fn preserved(&self) -> bool {
        self.preserved
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn object_modified_date(&self) -> Option<DateTime<Utc>> {
        self.object_modified_date
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn metadata_hash(&self) -> Option<&MetadataHash> {
        self.metadata_hash.as_ref()
    }

    pub fn attachment_metadata_hash(&self) -> &AttachmentDigest {
        &self.attachment_metadata_hash
    }

    pub fn is_terminal(&self) -> bool {
        self.preserved || self.rejected || self.cancelled
    }

    pub fn mark_packaged(&mut self) -> Result<(), DomainError> {
        if !self.downloaded {
            return Err(DomainError::Validation(format!(
                "package {} cannot be packaged before download",
                self.sip_filename
            )));
        }
        self.packaged = true;
        Ok(())
    }

    pub fn mark_uploaded(&mut self) -> Result<(), DomainError> {
        if self.uploaded {
            return Err(DomainError::InvalidOperation(format!(
                "package {} is already uploaded",
                self.sip_filename
            )));
        }
        self.uploaded = true;
        Ok(())
    }

    pub fn mark_preserved(&mut self) -> Result<(), DomainError> {
        self.set_terminal(true, false, false)
    }

    pub fn mark_rejected(&mut self) -> Result<(), DomainError> {
        self.set_terminal(false, true, false)
    }

    pub fn mark_cancelled(&mut self) -> Result<(), DomainError> {
        self.set_terminal(false, false, true)
    }

    fn set_terminal(&mut self, preserved: bool, rejected: bool, cancelled: bool) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::Validation(format!(
                "package {} already has a terminal state (preserved={}, rejected={}, cancelled={})",
                self.sip_filename, self.preserved, self.rejected, self.cancelled
            )));
        }
        self.preserved = preserved;
        self.rejected = rejected;
        self.cancelled = cancelled;
        Ok(())
    }

    /// Working directory while the package is in flight:
    /// `<package_dir>/<object_id>/<sip_id>`.
    pub fn workflow_log_dir(&self, package_dir: &Path) -> PathBuf {
        package_dir.join(self.object_id.to_string()).join(&self.sip_id)
    }

    /// Long-term archive directory once logs are moved out of the working
    /// tree: `<archive_dir>/<object_id>/<sip_id>`.
    pub fn archive_log_dir(&self, archive_dir: &Path) -> PathBuf {
        archive_dir.join(self.object_id.to_string()).join(&self.sip_id)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let terminal_count = [self.preserved, self.rejected, self.cancelled]
            .into_iter()
            .filter(|b| *b)
            .count();
        if terminal_count > 1 {
            return Err(DomainError::Validation(format!(
                "package {} has more than one terminal flag set",
                self.sip_filename
            )));
        }
        if self.preserved && !(self.uploaded && self.packaged && self.downloaded) {
            return Err(DomainError::Validation(format!(
                "package {} is preserved but missing an earlier stage flag",
                self.sip_filename
            )));
        }
        if self.packaged && !self.downloaded {
            return Err(DomainError::Validation(format!(
                "package {} is packaged but not downloaded",
                self.sip_filename
            )));
        }
        Ok(())
    }
}
