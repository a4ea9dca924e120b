// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Type-safe 64-bit integer identifiers.
//!
//! Object, Attachment and Package identities are assigned by the relational
//! store (bigint primary keys), not generated client-side — unlike the
//! ULID-based ids elsewhere in this codebase's lineage. A thin newtype per
//! entity still buys the same benefit: the compiler refuses to let an
//! `ObjectId` stand in for a `PackageId`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! integer_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

integer_id!(ObjectId);
integer_id!(AttachmentId);
integer_id!(PackageId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_types_do_not_unify() {
        let object_id = ObjectId::new(1);
        let attachment_id = AttachmentId::new(1);
        assert_eq!(object_id.value(), attachment_id.value());
        // The assertion above compares the underlying i64s explicitly;
        // `object_id == attachment_id` would not type-check.
    }

    #[test]
    fn display_matches_integer() {
        assert_eq!(PackageId::new(42).to_string(), "42");
    }
}
