// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Metadata hash value objects.
//!
//! `metadata_hash` is a plain hex-64 SHA-256 digest, or absent while the CMS
//! sync hasn't yet populated it. `attachment_metadata_hash` has a third
//! state on top of that: the empty string is a legitimate value meaning
//! "this object has no attachments", distinct from "not yet computed".

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 digest rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataHash(String);

impl MetadataHash {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three states `attachment_metadata_hash` can occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentDigest {
    /// Null column: the hash sync hasn't walked this Object yet, or one of
    /// its attachments is still missing its own `metadata_hash`.
    NotComputed,
    /// Empty-string sentinel: the Object genuinely has zero attachments.
    NoAttachments,
    /// SHA-256 of the sorted, concatenated attachment hashes.
    Digest(String),
}

impl AttachmentDigest {
    /// Maps the nullable-text-with-empty-sentinel column shape onto the
    /// three logical states.
    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            None => Self::NotComputed,
            Some("") => Self::NoAttachments,
            Some(hex) => Self::Digest(hex.to_string()),
        }
    }

    /// Inverse of [`from_column`](Self::from_column).
    pub fn to_column(&self) -> Option<String> {
        match self {
            Self::NotComputed => None,
            Self::NoAttachments => Some(String::new()),
            Self::Digest(hex) => Some(hex.clone()),
        }
    }

    pub fn is_computed(&self) -> bool {
        !matches!(self, Self::NotComputed)
    }
}

/// Computes the attachment_metadata_hash for one Object from its
/// attachments' own `metadata_hash` values.
///
/// Returns `None` if any attachment's hash is missing (the caller should
/// skip the update and count it, per §4.5's hash-sync skip rule). An empty
/// slice produces the empty-string sentinel.
pub fn compute_attachment_metadata_hash(attachment_hashes: &[Option<&str>]) -> Option<String> {
    if attachment_hashes.is_empty() {
        return Some(String::new());
    }

    let mut hashes: Vec<&str> = Vec::with_capacity(attachment_hashes.len());
    for hash in attachment_hashes {
        hashes.push((*hash)?);
    }
    hashes.sort_unstable();

    let mut hasher = Sha256::new();
    for hash in hashes {
        hasher.update(hash.as_bytes());
    }
    Some(hex::encode(hasher.finalize()))
}
