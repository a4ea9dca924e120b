// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The preservation-eligibility predicate (§4.1).
//!
//! `preservation_pending` is the one decision function the rest of the
//! workflow defers to: CMS Sync feeds it, the Enqueue Planner evaluates it,
//! and its SQL-query counterpart in the infrastructure layer must partition
//! every Object identically to this in-memory version (see §8's
//! partition-invariant tests in `preservation-engine`).
//!
//! Delays are passed in explicitly rather than read from a global, per the
//! Design Notes: the predicate is otherwise pure and injectable in tests.

use crate::entities::{Object, Package};
use chrono::{DateTime, Duration, Utc};

/// A read-only view of the latest package relevant to eligibility. Callers
/// (repository adapters, tests) build this from a `Package` or directly
/// from a joined query row — it only needs the four fields the predicate
/// reads.
#[derive(Debug, Clone, Copy)]
pub struct LatestPackageView<'a> {
    pub object_modified_date: Option<DateTime<Utc>>,
    pub metadata_hash: Option<&'a str>,
    pub attachment_metadata_hash: Option<&'a str>,
    pub cancelled: bool,
}

impl<'a> LatestPackageView<'a> {
    pub fn from_package(package: &'a Package) -> Self {
        Self {
            object_modified_date: package.object_modified_date(),
            metadata_hash: package.metadata_hash().map(|h| h.as_str()),
            attachment_metadata_hash: match package.attachment_metadata_hash() {
                crate::value_objects::AttachmentDigest::Digest(d) => Some(d.as_str()),
                crate::value_objects::AttachmentDigest::NoAttachments => Some(""),
                crate::value_objects::AttachmentDigest::NotComputed => None,
            },
        }
    }
}

/// Null-safe equality per §4.1/§9: `None == None` is true, and `None` is
/// distinct from every `Some(_)`.
fn temporal_eq(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> bool {
    a == b
}

/// `preservation_pending(o)`, in-memory form. See §4.1 for the three
/// branches (first-time, update, retry) this implements.
pub fn preservation_pending(
    object: &Object,
    latest_package: Option<LatestPackageView<'_>>,
    now: DateTime<Utc>,
    preservation_delay: Duration,
    update_delay: Duration,
) -> bool {
    if object.frozen() {
        return false;
    }

    let metadata_complete = object.metadata_hash().is_some()
        && matches!(
            object.attachment_metadata_hash(),
            crate::value_objects::AttachmentDigest::Digest(_) | crate::value_objects::AttachmentDigest::NoAttachments
        );
    if !metadata_complete {
        return false;
    }

    match latest_package {
        None => {
            // First-time: no attempt yet, and the object is old enough
            // (or has no created_date at all) that the preservation delay
            // has elapsed.
            object.created_date().map_or(true, |created| created < now - preservation_delay)
        }
        Some(latest) => {
            if latest.cancelled {
                // Retry: a cancelled latest package makes the object
                // immediately pending regardless of delays.
                return true;
            }

            let modified_changed = !temporal_eq(latest.object_modified_date, object.modified_date());
            if !modified_changed {
                return false;
            }

            let delay_elapsed = match latest.object_modified_date {
                None => true,
                Some(last_modified) => last_modified < now - update_delay,
            };
            if !delay_elapsed {
                return false;
            }

            let object_metadata_hash = object.metadata_hash().map(|h| h.as_str());
            let object_attachment_hash = match object.attachment_metadata_hash() {
                crate::value_objects::AttachmentDigest::Digest(d) => Some(d.as_str()),
                crate::value_objects::AttachmentDigest::NoAttachments => Some(""),
                crate::value_objects::AttachmentDigest::NotComputed => None,
            };

            latest.metadata_hash != object_metadata_hash || latest.attachment_metadata_hash != object_attachment_hash
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::value_objects::{AttachmentDigest, FreezeSource, ObjectId};
    use proptest::prelude::*;

    proptest! {
        /// First-time branch boundary (§8): for any delay and any signed
        /// offset from it, `created_date = now - delay + offset` is
        /// pending iff `offset` is strictly negative (i.e. `created_date`
        /// is strictly older than `now - delay`).
        #[test]
        fn first_time_boundary_matches_offset_sign(delay_days in 1i64..365, offset_secs in -3600i64..3600i64) {
            let now = Utc::now();
            let delay = Duration::days(delay_days);
            let created = now - delay + Duration::seconds(offset_secs);
            let mut object = Object::new(ObjectId::new(1), "t", Some(created), None);
            object.apply_sync_update("t".into(), Some("h1".into()), None);
            object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);

            let pending = preservation_pending(&object, None, now, delay, delay);
            prop_assert_eq!(pending, offset_secs < 0);
        }

        /// A frozen object is never pending, no matter what its hashes,
        /// dates, or latest package look like.
        #[test]
        fn frozen_objects_are_never_pending(
            created_offset_days in -400i64..400i64,
            has_metadata in any::<bool>(),
            cancelled in any::<bool>(),
        ) {
            let now = Utc::now();
            let mut object = Object::new(ObjectId::new(1), "t", Some(now - Duration::days(created_offset_days)), None);
            if has_metadata {
                object.apply_sync_update("t".into(), Some("h1".into()), None);
                object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);
            }
            object.freeze("frozen for property test", FreezeSource::User);

            let latest = LatestPackageView {
                object_modified_date: None,
                metadata_hash: Some("h1"),
                attachment_metadata_hash: Some(""),
                cancelled,
            };
            prop_assert!(!preservation_pending(&object, Some(latest), now, Duration::days(30), Duration::days(30)));
        }

        /// A cancelled latest package always makes an unfrozen,
        /// metadata-complete object pending, independent of how far its
        /// `object_modified_date` is from the object's own `modified_date`.
        #[test]
        fn cancelled_latest_package_always_pending_when_unfrozen(
            modified_gap_days in 0i64..400i64,
            hashes_match in any::<bool>(),
        ) {
            let now = Utc::now();
            let mut object = Object::new(ObjectId::new(1), "t", Some(now - Duration::days(500)), Some(now));
            object.apply_sync_update("t".into(), Some("h1".into()), Some(now));
            object.set_attachment_metadata_hash(AttachmentDigest::NoAttachments);

            let latest = LatestPackageView {
                object_modified_date: Some(now - Duration::days(modified_gap_days)),
                metadata_hash: Some(if hashes_match { "h1" } else { "h2" }),
                attachment_metadata_hash: Some(""),
                cancelled: true,
            };
            prop_assert!(preservation_pending(&object, Some(latest), now, Duration::days(30), Duration::days(30)));
        }
    }
}
