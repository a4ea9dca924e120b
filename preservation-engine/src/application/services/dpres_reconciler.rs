// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DPRES Reconciler (§4.6), grounded in
//! `original_source/src/passari_workflow/scripts/sync_processed_sips.py`: an
//! SFTP day-folder scan that discovers accept/reject outcomes DPRES produced
//! out of band, feeds them back into the Package/Object state, and hands the
//! object off to `confirm_sip`.

use crate::error::EngineError;
use crate::infrastructure::queue::{HeartbeatSource, Heartbeats, JobStore, Stage};
use chrono::{DateTime, Duration, Utc};
use preservation_domain::repositories::PackageRepository;
use preservation_domain::services::DpresTransport;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Default day-folder lookback (§4.6).
pub const DEFAULT_LOOKBACK_DAYS: i64 = 31;

pub struct DpresReconcilerDeps {
    pub packages: Arc<dyn PackageRepository>,
    pub transport: Arc<dyn DpresTransport>,
    pub jobs: Arc<dyn JobStore>,
    pub heartbeats: Arc<Heartbeats>,
    pub package_dir: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Accepted,
    Rejected,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
        }
    }

    fn root(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
        }
    }
}

struct DiscoveredResult {
    sip_filename: String,
    report_dir: String,
    report_mtime: DateTime<Utc>,
    outcome: Outcome,
    /// Only set for rejected entries — the transfer directory to clean up
    /// after the report is consumed.
    transfer_dir_to_remove: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileSummary {
    pub confirmed: u64,
    pub skipped_already_known: u64,
}

/// `sync_processed_sips(days)` (§4.6).
#[instrument(skip(deps))]
pub async fn sync_processed_sips(deps: &DpresReconcilerDeps, days: i64) -> Result<ReconcileSummary, EngineError> {
    let days = if days <= 0 { DEFAULT_LOOKBACK_DAYS } else { days };
    let mut summary = ReconcileSummary::default();

    let skip_set = deps
        .packages
        .find_recent_confirmed_sip_filenames(Utc::now() - Duration::days(days + 2))
        .await?;

    let mut discovered: HashMap<String, DiscoveredResult> = HashMap::new();
    for outcome in [Outcome::Accepted, Outcome::Rejected] {
        scan_outcome_root(deps, outcome, days, &skip_set, &mut discovered, &mut summary).await?;
    }

    for (sip_filename, result) in discovered {
        match process_one(deps, &sip_filename, &result).await {
            Ok(true) => summary.confirmed += 1,
            Ok(false) => {}
            Err(err) => warn!(sip_filename, error = %err, "failed to reconcile sip"),
        }
    }

    deps.heartbeats.submit(HeartbeatSource::SyncProcessedSips).await?;
    info!(confirmed = summary.confirmed, "sync_processed_sips complete");
    Ok(summary)
}

async fn scan_outcome_root(
    deps: &DpresReconcilerDeps,
    outcome: Outcome,
    days: i64,
    skip_set: &std::collections::HashSet<String>,
    discovered: &mut HashMap<String, DiscoveredResult>,
    summary: &mut ReconcileSummary,
) -> Result<(), EngineError> {
    let today = Utc::now().date_naive();
    for offset in 0..days {
        let day = today - Duration::days(offset);
        let day_folder = format!("{}/{}", outcome.root(), day.format("%Y-%m-%d"));
        let sip_entries = match deps.transport.list_dir(&day_folder).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(EngineError::Sftp(err)),
        };

        for sip_entry in sip_entries.iter().filter(|e| e.is_dir) {
            let sip_filename = sip_entry.name.clone();
            if skip_set.contains(&sip_filename) {
                summary.skipped_already_known += 1;
                continue;
            }

            // `<transfer>-ingest-report.xml` (and its `.html` sibling) live
            // directly as files in `<sip_dir>`, not under a transfer
            // subdirectory; `transfer` is recovered by stripping the
            // `-ingest-report.xml` suffix off the report's filename.
            let sip_dir = format!("{}/{}", day_folder, sip_filename);
            let sip_dir_entries = deps.transport.list_dir(&sip_dir).await.map_err(EngineError::Sftp)?;

            let mut best: Option<(DateTime<Utc>, String)> = None;
            for entry in sip_dir_entries.iter().filter(|e| !e.is_dir && e.name.ends_with("-ingest-report.xml")) {
                let transfer = entry.name[..entry.name.len() - "-ingest-report.xml".len()].to_string();
                if best.as_ref().is_none_or(|(mtime, _)| entry.modified > *mtime) {
                    best = Some((entry.modified, transfer));
                }
            }

            let Some((report_mtime, _transfer)) = best else {
                continue;
            };
            let existing_mtime = discovered.get(&sip_filename).map(|r| r.report_mtime);
            if existing_mtime.is_some_and(|mtime| mtime >= report_mtime) {
                continue;
            }

            discovered.insert(
                sip_filename.clone(),
                DiscoveredResult {
                    sip_filename: sip_filename.clone(),
                    report_dir: sip_dir.clone(),
                    report_mtime,
                    outcome,
                    transfer_dir_to_remove: matches!(outcome, Outcome::Rejected)
                        .then(|| format!("{}/{}", sip_dir, sip_filename)),
                },
            );
        }
    }
    Ok(())
}

async fn process_one(deps: &DpresReconcilerDeps, sip_filename: &str, result: &DiscoveredResult) -> Result<bool, EngineError> {
    let package = deps.packages.find_by_sip_filename(sip_filename).await?;
    let Some(package) = package else {
        return Ok(false);
    };
    if package.preserved() || package.rejected() {
        return Ok(false);
    }

    let working_dir = package.workflow_log_dir(&deps.package_dir);
    tokio::fs::create_dir_all(&working_dir).await.map_err(EngineError::Sftp)?;
    download_reports(deps, &result.report_dir, &working_dir).await?;

    match result.outcome {
        Outcome::Accepted => {
            deps.packages.mark_preserved(package.id()).await?;
        }
        Outcome::Rejected => {
            deps.packages.mark_rejected(package.id()).await?;
            if let Some(transfer_dir) = &result.transfer_dir_to_remove {
                deps.transport.remove_dir_recursive(transfer_dir).await.map_err(EngineError::Sftp)?;
            }
        }
    }

    let status_path = working_dir.join(format!("{}.status", sip_filename));
    tokio::fs::write(&status_path, result.outcome.as_str()).await.map_err(EngineError::Sftp)?;

    deps.jobs.enqueue(Stage::ConfirmSip, package.object_id()).await?;
    Ok(true)
}

async fn download_reports(deps: &DpresReconcilerDeps, report_dir: &str, working_dir: &Path) -> Result<(), EngineError> {
    let entries = deps.transport.list_dir(report_dir).await.map_err(EngineError::Sftp)?;
    for entry in entries.iter().filter(|e| e.name.ends_with(".xml") || e.name.ends_with(".html")) {
        let remote_path = format!("{}/{}", report_dir, entry.name);
        let local_path = working_dir.join(&entry.name);
        deps.transport
            .download_file_atomic(&remote_path, &local_path)
            .await
            .map_err(EngineError::Sftp)?;
    }
    Ok(())
}
