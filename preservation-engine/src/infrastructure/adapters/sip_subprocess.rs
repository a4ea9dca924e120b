// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Subprocess-backed collaborator adapters for the SIP construction library
//! (spec.md's "deliberately out of scope" lower-level SIP tooling). Each
//! stage hands off to an external command, per §5's "external
//! subprocess/HTTP calls" suspension points; stdout/stderr are captured for
//! the error path, and a non-zero exit maps to `DomainError::PreservationFailed`
//! so the stage job's freeze branch (§4.3.1/§4.3.2) can trigger on it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preservation_domain::error::DomainError;
use preservation_domain::services::{DownloadOutcome, ObjectDownloader, SipBuilder, SipConfirmer, SipUploader};
use preservation_domain::value_objects::{AttachmentId, ObjectId};
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub struct SipToolingConfig {
    pub download_object_bin: PathBuf,
    pub create_sip_bin: PathBuf,
    pub submit_sip_bin: PathBuf,
    pub confirm_sip_bin: PathBuf,
}

pub struct SipSubprocessAdapter {
    config: SipToolingConfig,
}

impl SipSubprocessAdapter {
    pub fn new(config: SipToolingConfig) -> Self {
        Self { config }
    }
}

async fn run(bin: &Path, args: &[&std::ffi::OsStr]) -> Result<std::process::Output, DomainError> {
    Command::new(bin)
        .args(args)
        .output()
        .await
        .map_err(|err| DomainError::Internal(format!("failed to spawn {}: {err}", bin.display())))
}

fn out_of_disk_space(stderr: &str) -> bool {
    stderr.contains("No space left on device") || stderr.contains("ENOSPC")
}

fn fail_on_status(bin: &Path, object_id: ObjectId, output: &std::process::Output) -> Result<(), DomainError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if out_of_disk_space(&stderr) {
        return Err(DomainError::out_of_disk_space(object_id.value(), stderr.trim().to_string()));
    }
    Err(DomainError::PreservationFailed(format!(
        "{} exited with {}: {}",
        bin.display(),
        output.status,
        stderr.trim()
    )))
}

#[async_trait]
impl ObjectDownloader for SipSubprocessAdapter {
    async fn download(&self, object_id: ObjectId, package_dir: &Path, sip_id: &str) -> Result<DownloadOutcome, DomainError> {
        let object_arg = object_id.to_string();
        let package_dir_str = package_dir.to_string_lossy().into_owned();
        let output = run(
            &self.config.download_object_bin,
            &[object_arg.as_ref(), package_dir_str.as_ref(), sip_id.as_ref()],
        )
        .await?;
        fail_on_status(&self.config.download_object_bin, object_id, &output)?;

        let manifest_path = package_dir.join(object_arg).join(sip_id).join("download-manifest.json");
        parse_download_manifest(&manifest_path).await
    }
}

#[derive(serde::Deserialize)]
struct DownloadManifest {
    sip_filename: String,
    attachment_ids: Vec<i64>,
    object_modified_date: Option<DateTime<Utc>>,
}

async fn parse_download_manifest(path: &Path) -> Result<DownloadOutcome, DomainError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| DomainError::Internal(format!("missing download manifest at {}: {err}", path.display())))?;
    let manifest: DownloadManifest =
        serde_json::from_str(&raw).map_err(|err| DomainError::Internal(format!("malformed download manifest: {err}")))?;
    Ok(DownloadOutcome {
        sip_filename: manifest.sip_filename,
        attachment_ids: manifest.attachment_ids.into_iter().map(AttachmentId::new).collect(),
        object_modified_date: manifest.object_modified_date,
    })
}

#[async_trait]
impl SipBuilder for SipSubprocessAdapter {
    async fn build(
        &self,
        object_id: ObjectId,
        package_dir: &Path,
        sip_id: &str,
        create_date: DateTime<Utc>,
        modify_date: Option<DateTime<Utc>>,
        update: bool,
    ) -> Result<(), DomainError> {
        let object_arg = object_id.to_string();
        let package_dir_str = package_dir.to_string_lossy().into_owned();
        let create_date_arg = create_date.to_rfc3339();
        let modify_date_arg = modify_date.map(|d| d.to_rfc3339()).unwrap_or_default();
        let update_arg = if update { "1" } else { "0" };
        let output = run(
            &self.config.create_sip_bin,
            &[
                object_arg.as_ref(),
                package_dir_str.as_ref(),
                sip_id.as_ref(),
                create_date_arg.as_ref(),
                modify_date_arg.as_ref(),
                update_arg.as_ref(),
            ],
        )
        .await?;
        fail_on_status(&self.config.create_sip_bin, object_id, &output)
    }
}

#[async_trait]
impl SipUploader for SipSubprocessAdapter {
    async fn upload(&self, object_id: ObjectId, package_dir: &Path, sip_filename: &str) -> Result<(), DomainError> {
        let object_arg = object_id.to_string();
        let package_dir_str = package_dir.to_string_lossy().into_owned();
        let output = run(
            &self.config.submit_sip_bin,
            &[object_arg.as_ref(), package_dir_str.as_ref(), sip_filename.as_ref()],
        )
        .await?;
        fail_on_status(&self.config.submit_sip_bin, object_id, &output)
    }
}

#[async_trait]
impl SipConfirmer for SipSubprocessAdapter {
    async fn confirm(
        &self,
        object_id: ObjectId,
        package_dir: &Path,
        archive_dir: &Path,
        sip_id: &str,
        accepted: bool,
    ) -> Result<(), DomainError> {
        let object_arg = object_id.to_string();
        let package_dir_str = package_dir.to_string_lossy().into_owned();
        let archive_dir_str = archive_dir.to_string_lossy().into_owned();
        let accepted_arg = if accepted { "accepted" } else { "rejected" };
        let output = run(
            &self.config.confirm_sip_bin,
            &[
                object_arg.as_ref(),
                package_dir_str.as_ref(),
                archive_dir_str.as_ref(),
                sip_id.as_ref(),
                accepted_arg.as_ref(),
            ],
        )
        .await?;
        fail_on_status(&self.config.confirm_sip_bin, object_id, &output)
    }
}
