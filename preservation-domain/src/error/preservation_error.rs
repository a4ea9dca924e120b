// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// Domain-level failures of the preservation workflow.
///
/// `PreservationFailed` is deliberately not the enum's own name: it models
/// one specific external failure kind (the downloader/builder/uploader
/// reporting that a record cannot be preserved), not the whole error
/// surface. Stage job handlers catch exactly that variant at entry and
/// translate it into an automatic freeze; every other variant propagates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Raised by an external collaborator (downloader, SIP builder) to
    /// signal that the record itself cannot be preserved. Caught at stage
    /// entry and translated into `freeze_running_object`.
    #[error("preservation failed: {0}")]
    PreservationFailed(String),

    /// Out-of-disk-space while producing or staging a SIP. Re-raised with
    /// operator guidance; the job is left on the failed registry.
    #[error("insufficient disk space while processing object {object_id}: {detail}")]
    OutOfDiskSpace { object_id: i64, detail: String },

    /// A bulk freeze was refused because one or more targets have a
    /// currently-running (not merely pending/failed) job.
    #[error("refusing to freeze: job currently running for object id(s) {0:?}")]
    WorkflowJobRunning(Vec<i64>),

    /// Precondition refusal surfaced to the caller without retry: a
    /// re-enqueue of a non-rejected or still-enqueued object, an unfreeze
    /// call with neither a reason nor explicit ids, or similar.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The `<sip_filename>.status` file produced by the DPRES reconciler
    /// held something other than the literal strings `accepted`/`rejected`.
    #[error("invalid status file content: {0}")]
    InvalidStatusFile(String),

    /// Duplicate `sip_filename` on package creation: a clock-collision bug,
    /// not a retryable condition.
    #[error("uniqueness collision on sip_filename: {0}")]
    UniquenessCollision(String),

    #[error("object {0} not found")]
    ObjectNotFound(i64),

    #[error("package with sip_filename {0} not found")]
    PackageNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn preservation_failed(message: impl Into<String>) -> Self {
        Self::PreservationFailed(message.into())
    }

    pub fn out_of_disk_space(object_id: i64, detail: impl Into<String>) -> Self {
        Self::OutOfDiskSpace { object_id, detail: detail.into() }
    }

    /// Whether this failure is the "freeze and move on" kind rather than a
    /// hard stop. Only `PreservationFailed` is recoverable in this sense:
    /// the stage job itself returns success after freezing the object.
    pub fn is_preservation_failure(&self) -> bool {
        matches!(self, Self::PreservationFailed(_))
    }
}
