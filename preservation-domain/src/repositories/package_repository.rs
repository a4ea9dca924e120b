// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::entities::Package;
use crate::error::DomainError;
use crate::value_objects::{AttachmentId, ObjectId, PackageId};
use async_trait::async_trait;

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn find_by_id(&self, id: PackageId) -> Result<Option<Package>, DomainError>;

    /// The most recent package row for an object, if any — the `latest
    /// package` half of the §4.1 eligibility predicate's input.
    async fn find_latest_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError>;

    async fn find_latest_for_objects(
        &self,
        object_ids: &[ObjectId],
    ) -> Result<std::collections::HashMap<ObjectId, Package>, DomainError>;

    async fn insert_downloaded(&self, package: &Package) -> Result<PackageId, DomainError>;

    /// Snapshots which attachment versions this packaging attempt
    /// embedded (§3's Package↔Attachment relation). Distinct from
    /// `ObjectRepository::replace_attachment_links`: that one tracks the
    /// Object's *current* CMS cross-references as CMS Sync sees them,
    /// this one is a point-in-time record of one Package.
    async fn link_attachments(&self, package_id: PackageId, attachment_ids: &[AttachmentId]) -> Result<(), DomainError>;

    async fn mark_packaged(&self, id: PackageId) -> Result<(), DomainError>;

    async fn mark_uploaded(&self, id: PackageId) -> Result<(), DomainError>;

    async fn mark_preserved(&self, id: PackageId) -> Result<(), DomainError>;

    async fn mark_rejected(&self, id: PackageId) -> Result<(), DomainError>;

    async fn mark_cancelled(&self, id: PackageId) -> Result<(), DomainError>;

    /// Packages submitted but not yet confirmed, keyed by `sip_filename`,
    /// used by the reconciler to match DPRES day-folder reports back to a
    /// package row.
    async fn find_awaiting_confirmation(&self) -> Result<Vec<Package>, DomainError>;

    async fn find_sip_filenames_known(&self, sip_filenames: &[String]) -> Result<Vec<String>, DomainError>;

    /// The most recently *preserved* package for an object, used by
    /// `create_sip` (§4.3.2) to distinguish a first submission from an
    /// update and to derive the SIP builder's `create_date`/`modify_date`.
    async fn find_latest_preserved_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError>;

    /// Looks a package up by the `(object_id, sip_id)` pair a stage job
    /// carries forward from `download_object` through `confirm_sip`.
    async fn find_by_object_and_sip_id(&self, object_id: ObjectId, sip_id: &str) -> Result<Option<Package>, DomainError>;

    /// Looks a package up by its globally-unique `sip_filename`, used by
    /// `submit_sip` and the DPRES reconciler (§4.6).
    async fn find_by_sip_filename(&self, sip_filename: &str) -> Result<Option<Package>, DomainError>;

    /// Every package created after `since`, restricted to terminal
    /// preserved/rejected outcomes — the reconciler's skip-set
    /// optimization (§4.6).
    async fn find_recent_confirmed_sip_filenames(&self, since: chrono::DateTime<chrono::Utc>) -> Result<std::collections::HashSet<String>, DomainError>;

    /// Deletes one package row. The caller (the workflow-reset operation,
    /// §9's "Ownership" note) is responsible for nulling the owning
    /// Object's `latest_package_id` separately; only the in-flight package
    /// being reset is removed, not the object's whole package history.
    async fn delete_package(&self, id: PackageId) -> Result<(), DomainError>;

    /// Objects whose latest package has not been uploaded but has been
    /// downloaded or packaged — the candidate set `reset_workflow()` acts
    /// on after a database restore (§4.4's supplement, grounded in
    /// `original_source/src/passari_workflow/scripts/reset_workflow.py`).
    async fn find_dangling_object_ids(&self) -> Result<Vec<ObjectId>, DomainError>;
}
