// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain services: the eligibility predicate and the ports for every
//! external collaborator spec.md treats as out of scope.

pub mod cms_client;
pub mod collaborators;
pub mod dpres_transport;
pub mod eligibility;

pub use cms_client::{CmsAttachmentRecord, CmsClient, CmsObjectRecord, Page};
pub use collaborators::{DownloadOutcome, ObjectDownloader, SipBuilder, SipConfirmer, SipUploader};
pub use dpres_transport::{DpresTransport, RemoteDirEntry};
pub use eligibility::{preservation_pending, LatestPackageView};
