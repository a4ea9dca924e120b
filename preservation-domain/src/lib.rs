// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Preservation Domain
//!
//! Core business logic of the digital-preservation pipeline: the entities
//! that model an archival Object moving through packaging and submission,
//! the eligibility rule that decides when an Object is due for
//! (re-)preservation, and the ports every external collaborator must
//! satisfy. This crate is independent of Postgres, Redis, HTTP, and SFTP —
//! those live in `preservation-engine`.
//!
//! ## Entities
//!
//! - [`Object`]: a CMS record tracked for preservation, carrying freeze
//!   state and a pointer to its most recent [`Package`].
//! - [`Attachment`]: a CMS file attached to one or more Objects.
//! - [`Package`]: one pass of an Object through download → create → submit →
//!   confirm, with a terminal outcome of preserved, rejected, or cancelled.
//! - [`SyncStatus`]: the resumable cursor for a recurring CMS pull.
//!
//! ## Value Objects
//!
//! - [`ObjectId`], [`AttachmentId`], [`PackageId`]: relational identifiers,
//!   distinct wrapper types around `i64` so they cannot be swapped by
//!   accident at a call site.
//! - [`FreezeSource`]: distinguishes an operator-initiated freeze from one
//!   raised automatically by a failed stage.
//! - [`MetadataHash`] / [`AttachmentDigest`]: the change-detection digest
//!   used to decide whether a sync update actually altered anything.
//!
//! ## Domain Services
//!
//! [`preservation_pending`] is the eligibility predicate: given an Object,
//! its latest Package (if any), and the two configured delays, it decides
//! whether the Object is due for a fresh preservation attempt. Everything
//! else in [`services`] is a port — [`CmsClient`], [`DpresTransport`],
//! [`ObjectDownloader`], [`SipBuilder`], [`SipUploader`], [`SipConfirmer`] —
//! describing what `preservation-engine`'s adapters must provide without
//! naming the concrete technology behind them.
//!
//! ## Repositories
//!
//! [`ObjectRepository`], [`AttachmentRepository`], [`PackageRepository`],
//! and [`SyncStatusRepository`] abstract persistence as a collection-style
//! interface so the eligibility rule and stage handlers never issue SQL
//! directly.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{Attachment, Object, Package, SyncStatus};
pub use error::DomainError;
pub use repositories::{AttachmentRepository, ObjectRepository, PackageRepository, SyncStatusRepository};
pub use services::{
    CmsAttachmentRecord, CmsClient, CmsObjectRecord, DownloadOutcome, DpresTransport, ObjectDownloader, Page,
    RemoteDirEntry, SipBuilder, SipConfirmer, SipUploader, preservation_pending, LatestPackageView,
};
pub use value_objects::{
    compute_attachment_metadata_hash, AttachmentDigest, AttachmentId, FreezeSource, MetadataHash, ObjectId, PackageId,
};
