// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::error::DomainError;
use crate::value_objects::{AttachmentDigest, FreezeSource, MetadataHash, ObjectId, PackageId};
use chrono::{DateTime, Utc};

/// One CMS record tracked through the preservation workflow.
///
/// `modified_date` is maintained by CMS Sync as the maximum of the record's
/// own modification timestamp and the modification timestamps of all its
/// attachments; this entity does not recompute it, it only stores the value
/// its caller hands in.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    id: ObjectId,
    title: String,
    preserved: bool,
    frozen: bool,
    freeze_reason: Option<String>,
    freeze_source: Option<FreezeSource>,
    created_date: Option<DateTime<Utc>>,
    modified_date: Option<DateTime<Utc>>,
    metadata_hash: Option<MetadataHash>,
    attachment_metadata_hash: AttachmentDigest,
    latest_package_id: Option<PackageId>,
}

impl Object {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ObjectId,
        title: impl Into<String>,
        created_date: Option<DateTime<Utc>>,
        modified_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            preserved: false,
            frozen: false,
            freeze_reason: None,
            freeze_source: None,
            created_date,
            modified_date,
            metadata_hash: None,
            attachment_metadata_hash: AttachmentDigest::NotComputed,
            latest_package_id: None,
        }
    }

    /// Reconstructs an Object from persisted column values. Used by
    /// repository adapters; does not re-validate CMS-origin invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_row(
        id: ObjectId,
        title: String,
        preserved: bool,
        frozen: bool,
        freeze_reason: Option<String>,
        freeze_source: Option<FreezeSource>,
        created_date: Option<DateTime<Utc>>,
        modified_date: Option<DateTime<Utc>>,
        metadata_hash: Option<String>,
        attachment_metadata_hash: Option<String>,
        latest_package_id: Option<PackageId>,
    ) -> Self {
        Self {
            id,
            title,
            preserved,
            frozen,
            freeze_reason,
            freeze_source,
            created_date,
            modified_date,
            metadata_hash: metadata_hash.map(MetadataHash::new),
            attachment_metadata_hash: AttachmentDigest::from_column(attachment_metadata_hash.as_deref()),
            latest_package_id,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn preserved(&self) -> bool {
        self.preserved
    }

    pub fn frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze_reason(&self) -> Option<&str> {
        self.freeze_reason.as_deref()
    }

    pub fn freeze_source(&self) -> Option<FreezeSource> {
        self.freeze_source
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

    pub fn attachment_metadata_hash(&self) -> &AttachmentDigest {
        &self.attachment_metadata_hash
    }

    pub fn latest_package_id(&self) -> Option<PackageId> {
        self.latest_package_id
    }

    pub fn set_latest_package_id(&mut self, package_id: Option<PackageId>) {
        self.latest_package_id = package_id;
    }

    /// Applied by CMS Sync: never regresses `modified_date` (§4.5's
    /// "never regress" guard lives here so every caller gets it for free).
    pub fn apply_sync_update(&mut self, title: String, metadata_hash: Option<String>, modified_date: Option<DateTime<Utc>>) {
        self.title = title;
        self.metadata_hash = metadata_hash.map(MetadataHash::new);
        if let Some(incoming) = modified_date {
            let regresses = self.modified_date.is_some_and(|current| current >= incoming);
            if !regresses {
                self.modified_date = Some(incoming);
            }
        }
    }

    pub fn set_attachment_metadata_hash(&mut self, digest: AttachmentDigest) {
        self.attachment_metadata_hash = digest;
    }

    /// Administrative or automatic freeze. `source = Automatic` is used
    /// exclusively by the stage-job failure path; administrative bulk
    /// freeze always supplies `User`.
    pub fn freeze(&mut self, reason: impl Into<String>, source: FreezeSource) {
        self.frozen = true;
        self.freeze_reason = Some(reason.into());
        self.freeze_source = Some(source);
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
        self.freeze_reason = None;
        self.freeze_source = None;
    }

    pub fn mark_preserved(&mut self) {
        self.preserved = true;
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.frozen && self.freeze_source.is_none() {
            return Err(DomainError::Validation(format!(
                "object {} is frozen but has no freeze_source",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_update_never_regresses_modified_date() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::hours(1);
        let mut object = Object::new(ObjectId::new(1), "a", Some(t0), Some(t1));
        object.apply_sync_update("a".into(), None, Some(t0));
        assert_eq!(object.modified_date(), Some(t1));
    }

    #[test]
    fn sync_update_advances_modified_date() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::hours(1);
        let mut object = Object::new(ObjectId::new(1), "a", Some(t0), Some(t0));
        object.apply_sync_update("a".into(), None, Some(t1));
        assert_eq!(object.modified_date(), Some(t1));
    }

    #[test]
    fn frozen_without_source_fails_validation() {
        let mut object = Object::new(ObjectId::new(1), "a", None, None);
        object.frozen = true;
        assert!(object.validate().is_err());
    }

    #[test]
    fn freeze_then_unfreeze_clears_all_fields() {
        let mut object = Object::new(ObjectId::new(1), "a", None, None);
        object.freeze("bad format", FreezeSource::Automatic);
        assert!(object.frozen());
        object.unfreeze();
        assert!(!object.frozen());
        assert!(object.freeze_reason().is_none());
        assert!(object.freeze_source().is_none());
    }
}
