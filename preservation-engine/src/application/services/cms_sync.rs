// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CMS Sync (§4.5), grounded in
//! `original_source/src/passari_workflow/scripts/sync_objects.py` and
//! `sync_attachments.py`. `sync_objects` and `sync_attachments` share the
//! same resumable-paged-pull shape; `sync_hashes` is a separate full-table
//! walk that recomputes `attachment_metadata_hash`.

use crate::error::EngineError;
use crate::infrastructure::queue::{HeartbeatSource, Heartbeats};
use chrono::Utc;
use preservation_domain::entities::{Attachment, Object};
use preservation_domain::repositories::{AttachmentRepository, ObjectRepository, SyncStatusRepository};
use preservation_domain::services::{CmsAttachmentRecord, CmsClient, CmsObjectRecord};
use preservation_domain::value_objects::{compute_attachment_metadata_hash, AttachmentDigest, ObjectId};
use std::sync::Arc;
use tracing::info;

/// Page size for `sync_objects`/`sync_attachments` (§4.5).
const SYNC_CHUNK_SIZE: i64 = 500;
/// Page size for `sync_hashes` (§4.5).
const HASH_CHUNK_SIZE: i64 = 2000;

pub struct CmsSyncDeps {
    pub objects: Arc<dyn ObjectRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    pub sync_status: Arc<dyn SyncStatusRepository>,
    pub cms: Arc<dyn CmsClient>,
    pub heartbeats: Arc<Heartbeats>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncSummary {
    pub inserted: u64,
    pub updated: u64,
}

/// Resolves the `(offset, modified_since)` cursor per §4.5's control flow,
/// and — when `save_progress` — marks the run started if one wasn't
/// already in progress.
async fn begin_run(sync_status: &Arc<dyn SyncStatusRepository>, name: &str, save_progress: bool) -> Result<(i64, Option<chrono::DateTime<Utc>>), EngineError> {
    if !save_progress {
        return Ok((0, None));
    }
    let mut status = sync_status.get(name).await?;
    if status.begin_if_idle(Utc::now()) {
        sync_status.save(&status).await?;
    }
    Ok((status.offset(), status.prev_start_sync_date()))
}

async fn persist_offset(sync_status: &Arc<dyn SyncStatusRepository>, name: &str, offset: i64, save_progress: bool) -> Result<(), EngineError> {
    if !save_progress {
        return Ok(());
    }
    let mut status = sync_status.get(name).await?;
    status.update_offset(offset);
    sync_status.save(&status).await
        .map_err(Into::into)
}

async fn finish_run(sync_status: &Arc<dyn SyncStatusRepository>, name: &str, save_progress: bool) -> Result<(), EngineError> {
    if !save_progress {
        return Ok(());
    }
    let mut status = sync_status.get(name).await?;
    status.finish();
    sync_status.save(&status).await.map_err(Into::into)
}

/// `sync_objects` (§4.5).
pub async fn sync_objects(deps: &CmsSyncDeps, save_progress: bool) -> Result<SyncSummary, EngineError> {
    const NAME: &str = "sync_objects";
    let (mut offset, modified_since) = begin_run(&deps.sync_status, NAME, save_progress).await?;
    let mut summary = SyncSummary::default();

    loop {
        let page = deps.cms.fetch_objects_page(offset, modified_since, SYNC_CHUNK_SIZE).await?;
        if page.records.is_empty() && page.exhausted {
            break;
        }

        let ids: Vec<ObjectId> = page.records.iter().map(|r| r.id).collect();
        let existing = deps.objects.find_by_ids(&ids).await?;

        let mut new_objects = Vec::new();
        let mut updated_objects = Vec::new();
        for record in &page.records {
            if let Some(mut current) = existing.iter().find(|o| o.id() == record.id).cloned() {
                current.apply_sync_update(record.title.clone(), record.metadata_hash.clone(), record.modified_date);
                updated_objects.push(current);
            } else {
                let mut fresh = Object::new(record.id, record.title.clone(), record.created_date, record.modified_date);
                fresh.apply_sync_update(record.title.clone(), record.metadata_hash.clone(), record.modified_date);
                new_objects.push(fresh);
            }
        }

        if !new_objects.is_empty() {
            deps.objects.bulk_insert(&new_objects).await?;
            summary.inserted += new_objects.len() as u64;
        }
        if !updated_objects.is_empty() {
            deps.objects.bulk_update_sync_fields(&updated_objects).await?;
            summary.updated += updated_objects.len() as u64;
        }

        for record in &page.records {
            let unknown: Vec<_> = record
                .attachment_ids
                .iter()
                .copied()
                .filter(|id| !deps.attachments.find_by_ids(&[*id]).await.map(|v| !v.is_empty()).unwrap_or(false))
                .collect();
            if !unknown.is_empty() {
                deps.attachments.insert_placeholders(&unknown).await?;
            }
            deps.objects.replace_attachment_links(record.id, &record.attachment_ids).await?;
        }

        deps.heartbeats.submit(HeartbeatSource::SyncObjects).await?;
        offset += page.records.len() as i64;
        persist_offset(&deps.sync_status, NAME, offset, save_progress).await?;

        if page.exhausted {
            break;
        }
    }

    finish_run(&deps.sync_status, NAME, save_progress).await?;
    info!(inserted = summary.inserted, updated = summary.updated, "sync_objects complete");
    Ok(summary)
}

/// `sync_attachments` (§4.5). Near-identical control flow to `sync_objects`;
/// the one semantic difference is that attachment modification dates
/// propagate onto every linked Object's `modified_date` (never regressing
/// it), since that is how attachment changes feed the eligibility
/// predicate.
pub async fn sync_attachments(deps: &CmsSyncDeps, save_progress: bool) -> Result<SyncSummary, EngineError> {
    const NAME: &str = "sync_attachments";
    let (mut offset, modified_since) = begin_run(&deps.sync_status, NAME, save_progress).await?;
    let mut summary = SyncSummary::default();

    loop {
        let page = deps.cms.fetch_attachments_page(offset, modified_since, SYNC_CHUNK_SIZE).await?;
        if page.records.is_empty() && page.exhausted {
            break;
        }

        let ids: Vec<_> = page.records.iter().map(|r| r.id).collect();
        let existing = deps.attachments.find_by_ids(&ids).await?;

        let mut new_attachments = Vec::new();
        let mut updated_attachments = Vec::new();
        for record in &page.records {
            if let Some(mut current) = existing.iter().find(|a| a.id() == record.id).cloned() {
                current.apply_sync_update(record.filename.clone(), record.created_date, record.modified_date, record.metadata_hash.clone());
                updated_attachments.push(current);
            } else {
                updated_attachments_push_new(&mut new_attachments, record);
            }
        }

        if !new_attachments.is_empty() {
            deps.attachments.bulk_insert(&new_attachments).await?;
            summary.inserted += new_attachments.len() as u64;
        }
        if !updated_attachments.is_empty() {
            deps.attachments.bulk_update_sync_fields(&updated_attachments).await?;
            summary.updated += updated_attachments.len() as u64;
        }

        for record in &page.records {
            let unknown_object_ids: Vec<_> = {
                let mut unknown = Vec::new();
                for object_id in &record.object_ids {
                    if deps.objects.find_by_ids(&[*object_id]).await?.is_empty() {
                        unknown.push(*object_id);
                    }
                }
                unknown
            };
            if !unknown_object_ids.is_empty() {
                deps.objects.insert_placeholders(&unknown_object_ids).await?;
            }
            deps.attachments.replace_object_links(record.id, &record.object_ids).await?;

            if let Some(modified) = record.modified_date {
                let linked = deps.objects.find_by_ids(&record.object_ids).await?;
                let mut bumped = Vec::new();
                for mut object in linked {
                    let needs_bump = object.modified_date().is_none_or(|current| current < modified);
                    if needs_bump {
                        object.apply_sync_update(object.title().to_string(), object.metadata_hash().map(|h| h.as_str().to_string()), Some(modified));
                        bumped.push(object);
                    }
                }
                if !bumped.is_empty() {
                    deps.objects.bulk_update_sync_fields(&bumped).await?;
                }
            }
        }

        deps.heartbeats.submit(HeartbeatSource::SyncAttachments).await?;
        offset += page.records.len() as i64;
        persist_offset(&deps.sync_status, NAME, offset, save_progress).await?;

        if page.exhausted {
            break;
        }
    }

    finish_run(&deps.sync_status, NAME, save_progress).await?;
    info!(inserted = summary.inserted, updated = summary.updated, "sync_attachments complete");
    Ok(summary)
}

fn updated_attachments_push_new(new_attachments: &mut Vec<Attachment>, record: &CmsAttachmentRecord) {
    new_attachments.push(Attachment::new(
        record.id,
        record.filename.clone(),
        record.created_date,
        record.modified_date,
        record.metadata_hash.clone(),
    ));
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HashSyncSummary {
    pub updated: u64,
    pub skipped: u64,
}

/// `sync_hashes` (§4.5): walks every Object in id order, recomputing
/// `attachment_metadata_hash` from its current Attachments. Objects with
/// any attachment still missing its own `metadata_hash` are skipped, not
/// treated as an error — the hash will be computed once that attachment's
/// own sync catches up.
pub async fn sync_hashes(
    objects: &Arc<dyn ObjectRepository>,
    attachments_by_object: &Arc<dyn ObjectAttachmentHashLookup>,
    heartbeats: &Arc<Heartbeats>,
) -> Result<HashSyncSummary, EngineError> {
    let mut summary = HashSyncSummary::default();
    let mut offset = 0i64;

    loop {
        let page_ids = attachments_by_object.page_object_ids(offset, HASH_CHUNK_SIZE).await?;
        if page_ids.is_empty() {
            break;
        }
        let page_len = page_ids.len() as i64;

        let current_objects = objects.find_by_ids(&page_ids).await?;
        let mut hashes_by_object = attachments_by_object.attachment_hashes_for_objects(&page_ids).await?;
        let mut to_update = Vec::new();
        for mut object in current_objects {
            let hashes = hashes_by_object.remove(&object.id()).unwrap_or_default();
            if hashes.is_empty() {
                let computed = compute_attachment_metadata_hash(&[]).unwrap();
                if object.attachment_metadata_hash().to_column().as_deref() != Some(computed.as_str()) {
                    object.set_attachment_metadata_hash(AttachmentDigest::Digest(computed));
                    to_update.push(object);
                }
                continue;
            }
            let refs: Vec<Option<&str>> = hashes.iter().map(|h| h.as_deref()).collect();
            match compute_attachment_metadata_hash(&refs) {
                None => {
                    summary.skipped += 1;
                }
                Some(computed) => {
                    let current = object.attachment_metadata_hash().to_column();
                    if current.as_deref() != Some(computed.as_str()) {
                        object.set_attachment_metadata_hash(AttachmentDigest::Digest(computed));
                        to_update.push(object);
                    }
                }
            }
        }

        if !to_update.is_empty() {
            objects.bulk_update_sync_fields(&to_update).await?;
            summary.updated += to_update.len() as u64;
        }

        offset += page_len;
        if page_len < HASH_CHUNK_SIZE {
            break;
        }
    }

    heartbeats.submit(HeartbeatSource::SyncHashes).await?;
    info!(updated = summary.updated, skipped = summary.skipped, "sync_hashes complete");
    Ok(summary)
}

/// Narrow port `sync_hashes` needs on top of `ObjectRepository`: the id
/// paging and the attachment-hash join, each issued as its own bulk query
/// (§4.5's "exactly two bulk queries" to avoid N+1) — one query pages
/// object ids, the other joins the whole page out to its attachments in
/// a single round-trip.
#[async_trait::async_trait]
pub trait ObjectAttachmentHashLookup: Send + Sync {
    async fn page_object_ids(&self, offset: i64, limit: i64) -> Result<Vec<ObjectId>, EngineError>;
    async fn attachment_hashes_for_objects(
        &self,
        object_ids: &[ObjectId],
    ) -> Result<std::collections::HashMap<ObjectId, Vec<Option<String>>>, EngineError>;
}
