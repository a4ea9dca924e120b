// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CMS Sync (§4.5) and the DPRES reconciler (§4.6) — the two long-running
//! recurring services, as opposed to the per-object `jobs` handlers.

pub mod cms_sync;
pub mod dpres_reconciler;

pub use cms_sync::{sync_attachments, sync_hashes, sync_objects, CmsSyncDeps, HashSyncSummary, ObjectAttachmentHashLookup, SyncSummary};
pub use dpres_reconciler::{sync_processed_sips, DpresReconcilerDeps, ReconcileSummary, DEFAULT_LOOKBACK_DAYS};
