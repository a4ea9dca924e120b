// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-memory fakes for the application layer's ports, used only by
//! `#[cfg(test)]` modules across `application::jobs` and
//! `application::workflow`. Mirrors the teacher's note in
//! `application::use_cases::list_pipelines` that use-case tests "typically
//! use mock repositories" — here the mocks are plain `Mutex`-guarded maps
//! rather than a generated mock crate, since every port this workspace
//! defines is a small hand-written trait.

#![cfg(test)]

use crate::error::EngineError;
use crate::infrastructure::queue::{locks::LockHandle, DistributedLock, JobStore, Stage};
use async_trait::async_trait;
use preservation_domain::entities::{Attachment, Object, Package};
use preservation_domain::error::DomainError;
use preservation_domain::repositories::{AttachmentRepository, ObjectRepository, PackageRepository};
use preservation_domain::services::{DownloadOutcome, ObjectDownloader, SipBuilder, SipConfirmer, SipUploader};
use preservation_domain::value_objects::{AttachmentId, ObjectId, PackageId};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Object + Package storage shared by every fake repository in a test, so
/// a handler's writes through one port are visible to assertions made
/// through another — the same way a single Postgres transaction would be.
#[derive(Default)]
pub struct FakeStore {
    pub objects: Mutex<HashMap<ObjectId, Object>>,
    pub attachments: Mutex<HashMap<AttachmentId, Attachment>>,
    pub packages: Mutex<HashMap<PackageId, Package>>,
    pub next_package_id: Mutex<i64>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self { next_package_id: Mutex::new(1), ..Default::default() }
    }

    pub fn with_object(self, object: Object) -> Self {
        self.objects.lock().unwrap().insert(object.id(), object);
        self
    }

    pub fn with_package(self, package: Package) -> Self {
        self.packages.lock().unwrap().insert(package.id(), package);
        self
    }

    pub fn object(&self, id: ObjectId) -> Object {
        self.objects.lock().unwrap().get(&id).cloned().expect("object present in fake store")
    }

    pub fn package(&self, id: PackageId) -> Package {
        self.packages.lock().unwrap().get(&id).cloned().expect("package present in fake store")
    }
}

#[async_trait]
impl ObjectRepository for FakeStore {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Object>, DomainError> {
        Ok(self.objects.lock().unwrap().get(&id).cloned())
    }

    async fn save_new(&self, object: &Object) -> Result<(), DomainError> {
        self.objects.lock().unwrap().insert(object.id(), object.clone());
        Ok(())
    }

    async fn update(&self, object: &Object) -> Result<(), DomainError> {
        self.objects.lock().unwrap().insert(object.id(), object.clone());
        Ok(())
    }

    async fn bulk_insert(&self, objects: &[Object]) -> Result<(), DomainError> {
        let mut guard = self.objects.lock().unwrap();
        for object in objects {
            guard.insert(object.id(), object.clone());
        }
        Ok(())
    }

    async fn bulk_update_sync_fields(&self, objects: &[Object]) -> Result<(), DomainError> {
        self.bulk_insert(objects).await
    }

    async fn exists_all(&self, ids: &[ObjectId]) -> Result<Vec<ObjectId>, DomainError> {
        let guard = self.objects.lock().unwrap();
        Ok(ids.iter().copied().filter(|id| guard.contains_key(id)).collect())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Object>, DomainError> {
        let guard = self.objects.lock().unwrap();
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn find_preservation_pending(
        &self,
        preservation_delay: chrono::Duration,
        update_delay: chrono::Duration,
        object_ids: Option<&[ObjectId]>,
        _random_order: bool,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Object>, DomainError> {
        let guard = self.objects.lock().unwrap();
        let packages = self.packages.lock().unwrap();
        let mut matching: Vec<Object> = guard
            .values()
            .filter(|object| object_ids.map_or(true, |ids| ids.contains(&object.id())))
            .filter(|object| {
                let latest = object
                    .latest_package_id()
                    .and_then(|id| packages.get(&id))
                    .map(preservation_domain::LatestPackageView::from_package);
                preservation_domain::preservation_pending(object, latest, chrono::Utc::now(), preservation_delay, update_delay)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.id().value());
        let start = offset.max(0) as usize;
        Ok(matching.into_iter().skip(start).take(limit.max(0) as usize).collect())
    }

    async fn count_preservation_excluded(
        &self,
        preservation_delay: chrono::Duration,
        update_delay: chrono::Duration,
    ) -> Result<i64, DomainError> {
        let guard = self.objects.lock().unwrap();
        let packages = self.packages.lock().unwrap();
        Ok(guard
            .values()
            .filter(|object| {
                let latest = object
                    .latest_package_id()
                    .and_then(|id| packages.get(&id))
                    .map(preservation_domain::LatestPackageView::from_package);
                !preservation_domain::preservation_pending(object, latest, chrono::Utc::now(), preservation_delay, update_delay)
            })
            .count() as i64)
    }

    async fn count_preservation_pending(
        &self,
        preservation_delay: chrono::Duration,
        update_delay: chrono::Duration,
    ) -> Result<i64, DomainError> {
        let guard = self.objects.lock().unwrap();
        let packages = self.packages.lock().unwrap();
        Ok(guard
            .values()
            .filter(|object| {
                let latest = object
                    .latest_package_id()
                    .and_then(|id| packages.get(&id))
                    .map(preservation_domain::LatestPackageView::from_package);
                preservation_domain::preservation_pending(object, latest, chrono::Utc::now(), preservation_delay, update_delay)
            })
            .count() as i64)
    }

    async fn find_frozen(&self, reason: Option<&str>, ids: Option<&[ObjectId]>) -> Result<Vec<Object>, DomainError> {
        let guard = self.objects.lock().unwrap();
        Ok(guard
            .values()
            .filter(|object| object.frozen())
            .filter(|object| reason.map_or(true, |r| object.freeze_reason() == Some(r)))
            .filter(|object| ids.map_or(true, |ids| ids.contains(&object.id())))
            .cloned()
            .collect())
    }

    async fn replace_attachment_links(&self, _object_id: ObjectId, _attachment_ids: &[AttachmentId]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn insert_placeholders(&self, _ids: &[ObjectId]) -> Result<(), DomainError> {
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for FakeStore {
    async fn find_by_id(&self, id: PackageId) -> Result<Option<Package>, DomainError> {
        Ok(self.packages.lock().unwrap().get(&id).cloned())
    }

    async fn find_latest_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError> {
        let object = self.objects.lock().unwrap().get(&object_id).cloned();
        let Some(latest_id) = object.and_then(|o| o.latest_package_id()) else {
            return Ok(None);
        };
        Ok(self.packages.lock().unwrap().get(&latest_id).cloned())
    }

    async fn find_latest_for_objects(&self, object_ids: &[ObjectId]) -> Result<HashMap<ObjectId, Package>, DomainError> {
        let mut out = HashMap::new();
        for &id in object_ids {
            if let Some(p) = self.find_latest_for_object(id).await? {
                out.insert(id, p);
            }
        }
        Ok(out)
    }

    async fn insert_downloaded(&self, package: &Package) -> Result<PackageId, DomainError> {
        let mut guard = self.packages.lock().unwrap();
        if guard.values().any(|p| p.sip_filename() == package.sip_filename()) {
            return Err(DomainError::UniquenessCollision(package.sip_filename().to_string()));
        }
        let mut next = self.next_package_id.lock().unwrap();
        let id = PackageId::new(*next);
        *next += 1;
        let mut stored = package.clone();
        stored = Package::new_downloaded(
            id,
            stored.object_id(),
            stored.sip_filename(),
            stored.sip_id(),
            stored.created_date(),
            stored.object_modified_date(),
            stored.metadata_hash().map(|h| h.as_str().to_string()),
            stored.attachment_metadata_hash().to_column(),
        );
        guard.insert(id, stored);
        Ok(id)
    }

    async fn link_attachments(&self, _package_id: PackageId, _attachment_ids: &[AttachmentId]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn mark_packaged(&self, id: PackageId) -> Result<(), DomainError> {
        let mut guard = self.packages.lock().unwrap();
        let package = guard.get_mut(&id).ok_or_else(|| DomainError::PackageNotFound(id.to_string()))?;
        package.mark_packaged()
    }

    async fn mark_uploaded(&self, id: PackageId) -> Result<(), DomainError> {
        let mut guard = self.packages.lock().unwrap();
        let package = guard.get_mut(&id).ok_or_else(|| DomainError::PackageNotFound(id.to_string()))?;
        package.mark_uploaded()
    }

    async fn mark_preserved(&self, id: PackageId) -> Result<(), DomainError> {
        let mut guard = self.packages.lock().unwrap();
        let package = guard.get_mut(&id).ok_or_else(|| DomainError::PackageNotFound(id.to_string()))?;
        package.mark_preserved()
    }

    async fn mark_rejected(&self, id: PackageId) -> Result<(), DomainError> {
        let mut guard = self.packages.lock().unwrap();
        let package = guard.get_mut(&id).ok_or_else(|| DomainError::PackageNotFound(id.to_string()))?;
        package.mark_rejected()
    }

    async fn mark_cancelled(&self, id: PackageId) -> Result<(), DomainError> {
        let mut guard = self.packages.lock().unwrap();
        let package = guard.get_mut(&id).ok_or_else(|| DomainError::PackageNotFound(id.to_string()))?;
        package.mark_cancelled()
    }

    async fn find_awaiting_confirmation(&self) -> Result<Vec<Package>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard.values().filter(|p| p.uploaded() && !p.is_terminal()).cloned().collect())
    }

    async fn find_sip_filenames_known(&self, sip_filenames: &[String]) -> Result<Vec<String>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard
            .values()
            .map(|p| p.sip_filename().to_string())
            .filter(|name| sip_filenames.contains(name))
            .collect())
    }

    async fn find_latest_preserved_for_object(&self, object_id: ObjectId) -> Result<Option<Package>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard
            .values()
            .filter(|p| p.object_id() == object_id && p.preserved())
            .max_by_key(|p| p.created_date())
            .cloned())
    }

    async fn find_by_object_and_sip_id(&self, object_id: ObjectId, sip_id: &str) -> Result<Option<Package>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard.values().find(|p| p.object_id() == object_id && p.sip_id() == sip_id).cloned())
    }

    async fn find_by_sip_filename(&self, sip_filename: &str) -> Result<Option<Package>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard.values().find(|p| p.sip_filename() == sip_filename).cloned())
    }

    async fn find_recent_confirmed_sip_filenames(&self, since: chrono::DateTime<chrono::Utc>) -> Result<HashSet<String>, DomainError> {
        let guard = self.packages.lock().unwrap();
        Ok(guard
            .values()
            .filter(|p| p.created_date() > since && (p.preserved() || p.rejected()))
            .map(|p| p.sip_filename().to_string())
            .collect())
    }

    async fn delete_package(&self, id: PackageId) -> Result<(), DomainError> {
        self.packages.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn find_dangling_object_ids(&self) -> Result<Vec<ObjectId>, DomainError> {
        let packages = self.packages.lock().unwrap();
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .values()
            .filter(|object| {
                object
                    .latest_package_id()
                    .and_then(|id| packages.get(&id))
                    .is_some_and(|p| !p.uploaded())
            })
            .map(|o| o.id())
            .collect())
    }
}

#[async_trait]
impl AttachmentRepository for FakeStore {
    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, DomainError> {
        Ok(self.attachments.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[AttachmentId]) -> Result<Vec<Attachment>, DomainError> {
        let guard = self.attachments.lock().unwrap();
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn bulk_insert(&self, attachments: &[Attachment]) -> Result<(), DomainError> {
        let mut guard = self.attachments.lock().unwrap();
        for attachment in attachments {
            guard.insert(attachment.id(), attachment.clone());
        }
        Ok(())
    }

    async fn bulk_update_sync_fields(&self, attachments: &[Attachment]) -> Result<(), DomainError> {
        self.bulk_insert(attachments).await
    }

    async fn insert_placeholders(&self, _ids: &[AttachmentId]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn replace_object_links(&self, _attachment_id: AttachmentId, _object_ids: &[ObjectId]) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A no-op lock: acquire always succeeds immediately. Fine for
/// single-threaded handler tests where there is no contention to model.
pub struct NoopLock;

#[async_trait]
impl DistributedLock for NoopLock {
    async fn acquire(&self, key: &str, _lease: Duration, _timeout: Duration) -> Result<LockHandle, EngineError> {
        Ok(LockHandle { key: key.to_string(), token: "test".to_string() })
    }

    async fn release(&self, _handle: LockHandle) -> Result<(), EngineError> {
        Ok(())
    }
}

/// An in-memory job store, enough to exercise enqueue-side assertions
/// (§8's "exactly one `download_object_1`" style scenarios) without Redis.
#[derive(Default)]
pub struct FakeJobStore {
    pending: Mutex<HashMap<Stage, HashSet<ObjectId>>>,
    started: Mutex<HashMap<Stage, HashSet<ObjectId>>>,
    failed: Mutex<HashMap<Stage, HashMap<ObjectId, String>>>,
}

impl FakeJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, stage: Stage, object_id: ObjectId) -> bool {
        self.pending.lock().unwrap().get(&stage).is_some_and(|set| set.contains(&object_id))
    }
}

#[async_trait]
impl JobStore for FakeJobStore {
    async fn enqueue(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        self.pending.lock().unwrap().entry(stage).or_default().insert(object_id);
        Ok(())
    }

    async fn dequeue(&self, stage: Stage) -> Result<Option<ObjectId>, EngineError> {
        let mut pending = self.pending.lock().unwrap();
        let Some(set) = pending.get_mut(&stage) else { return Ok(None) };
        let Some(&id) = set.iter().next() else { return Ok(None) };
        set.remove(&id);
        self.started.lock().unwrap().entry(stage).or_default().insert(id);
        Ok(Some(id))
    }

    async fn mark_started(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        self.started.lock().unwrap().entry(stage).or_default().insert(object_id);
        Ok(())
    }

    async fn mark_finished(&self, stage: Stage, object_id: ObjectId) -> Result<(), EngineError> {
        if let Some(set) = self.started.lock().unwrap().get_mut(&stage) {
            set.remove(&object_id);
        }
        if let Some(set) = self.pending.lock().unwrap().get_mut(&stage) {
            set.remove(&object_id);
        }
        Ok(())
    }

    async fn mark_failed(&self, stage: Stage, object_id: ObjectId, reason: &str) -> Result<(), EngineError> {
        if let Some(set) = self.started.lock().unwrap().get_mut(&stage) {
            set.remove(&object_id);
        }
        self.failed.lock().unwrap().entry(stage).or_default().insert(object_id, reason.to_string());
        Ok(())
    }

    async fn enqueued_object_ids(&self) -> Result<HashSet<ObjectId>, EngineError> {
        let mut out = HashSet::new();
        for set in self.pending.lock().unwrap().values() {
            out.extend(set.iter().copied());
        }
        for set in self.started.lock().unwrap().values() {
            out.extend(set.iter().copied());
        }
        for map in self.failed.lock().unwrap().values() {
            out.extend(map.keys().copied());
        }
        Ok(out)
    }

    async fn running_object_ids(&self) -> Result<HashSet<ObjectId>, EngineError> {
        let mut out = HashSet::new();
        for set in self.started.lock().unwrap().values() {
            out.extend(set.iter().copied());
        }
        Ok(out)
    }

    async fn object_id_to_queues(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, Vec<String>>, EngineError> {
        let mut out: HashMap<ObjectId, Vec<String>> = HashMap::new();
        for &id in ids {
            let mut queues = Vec::new();
            for (stage, set) in self.pending.lock().unwrap().iter() {
                if set.contains(&id) {
                    queues.push(stage.queue_name().to_string());
                }
            }
            for (stage, set) in self.started.lock().unwrap().iter() {
                if set.contains(&id) {
                    queues.push(stage.queue_name().to_string());
                }
            }
            for map in self.failed.lock().unwrap().values() {
                if map.contains_key(&id) {
                    queues.push("failed".to_string());
                }
            }
            out.insert(id, queues);
        }
        Ok(out)
    }

    async fn delete_jobs_for_object(&self, object_id: ObjectId) -> Result<u64, EngineError> {
        let mut count = 0u64;
        for set in self.pending.lock().unwrap().values_mut() {
            if set.remove(&object_id) {
                count += 1;
            }
        }
        for set in self.started.lock().unwrap().values_mut() {
            if set.remove(&object_id) {
                count += 1;
            }
        }
        for map in self.failed.lock().unwrap().values_mut() {
            if map.remove(&object_id).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// A downloader stub whose outcome (or `PreservationFailed`) is fixed at
/// construction, per scenario.
pub struct StubDownloader {
    pub result: Mutex<Option<Result<DownloadOutcome, DomainError>>>,
}

impl StubDownloader {
    pub fn succeeding(sip_filename: impl Into<String>, object_modified_date: Option<chrono::DateTime<chrono::Utc>>) -> Self {
        Self {
            result: Mutex::new(Some(Ok(DownloadOutcome {
                sip_filename: sip_filename.into(),
                attachment_ids: Vec::new(),
                object_modified_date,
            }))),
        }
    }

    pub fn failing_preservation(reason: impl Into<String>) -> Self {
        Self { result: Mutex::new(Some(Err(DomainError::PreservationFailed(reason.into())))) }
    }
}

#[async_trait]
impl ObjectDownloader for StubDownloader {
    async fn download(&self, _object_id: ObjectId, _package_dir: &Path, _sip_id: &str) -> Result<DownloadOutcome, DomainError> {
        self.result.lock().unwrap().take().expect("stub downloader called at most once per test")
    }
}

pub struct StubBuilder {
    pub fail: Option<DomainError>,
}

impl StubBuilder {
    pub fn succeeding() -> Self {
        Self { fail: None }
    }
}

#[async_trait]
impl SipBuilder for StubBuilder {
    async fn build(
        &self,
        _object_id: ObjectId,
        _package_dir: &Path,
        _sip_id: &str,
        _create_date: chrono::DateTime<chrono::Utc>,
        _modify_date: Option<chrono::DateTime<chrono::Utc>>,
        _update: bool,
    ) -> Result<(), DomainError> {
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub struct StubUploader;

#[async_trait]
impl SipUploader for StubUploader {
    async fn upload(&self, _object_id: ObjectId, _package_dir: &Path, _sip_filename: &str) -> Result<(), DomainError> {
        Ok(())
    }
}

pub struct StubConfirmer;

#[async_trait]
impl SipConfirmer for StubConfirmer {
    async fn confirm(
        &self,
        _object_id: ObjectId,
        _package_dir: &Path,
        _archive_dir: &Path,
        _sip_id: &str,
        _accepted: bool,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}
