// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ports for the external collaborators spec.md treats as out of scope: the
//! SIP construction library's download/build/upload/confirm steps. Stage
//! job handlers in `preservation-engine` depend on these traits, not on a
//! concrete implementation, so the handler logic is testable with fakes.

use crate::error::DomainError;
use crate::value_objects::{AttachmentId, ObjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Result of a successful download (§4.3.1 step 2).
pub struct DownloadOutcome {
    pub sip_filename: String,
    pub attachment_ids: Vec<AttachmentId>,
    pub object_modified_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ObjectDownloader: Send + Sync {
    /// Downloads the Object's current CMS representation into
    /// `package_dir`. `PreservationFailed` triggers an automatic freeze;
    /// `OutOfDiskSpace` is re-raised for operator attention; any other
    /// error fails the job for queue retry.
    async fn download(
        &self,
        object_id: ObjectId,
        package_dir: &Path,
        sip_id: &str,
    ) -> Result<DownloadOutcome, DomainError>;
}

#[async_trait]
pub trait SipBuilder: Send + Sync {
    /// Builds the SIP archive for an already-downloaded package.
    /// `create_date`/`modify_date` encode first-submission vs. update, per
    /// §4.3.2 step 1.
    async fn build(
        &self,
        object_id: ObjectId,
        package_dir: &Path,
        sip_id: &str,
        create_date: DateTime<Utc>,
        modify_date: Option<DateTime<Utc>>,
        update: bool,
    ) -> Result<(), DomainError>;
}

#[async_trait]
pub trait SipUploader: Send + Sync {
    /// Uploads the SIP archive to DPRES over its submission channel.
    async fn upload(&self, object_id: ObjectId, package_dir: &Path, sip_filename: &str) -> Result<(), DomainError>;
}

#[async_trait]
pub trait SipConfirmer: Send + Sync {
    /// Performs the final archival step: moves logs/reports into the
    /// long-term archive layout and clears the working directory.
    async fn confirm(
        &self,
        object_id: ObjectId,
        package_dir: &Path,
        archive_dir: &Path,
        sip_id: &str,
        accepted: bool,
    ) -> Result<(), DomainError>;
}
