// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap. Each variant of [`Commands`]
//! is one of the operational tools or stage-adjacent commands in the
//! external interface surface: the recurring syncs, the reconciler, the
//! enqueue planner, freeze/unfreeze/reset, database bootstrap, the DPRES
//! lookup tool, and the admin SQL shell.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "preservation-engine")]
#[command(about = concat!("Digital preservation orchestration pipeline v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging, overriding the configured log level
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path, overriding the search order in §6
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resumable paged sync of CMS objects into the local persistence model.
    SyncObjects {
        /// Disable the resumable cursor; always perform a full sweep
        /// without persisting progress between runs.
        #[arg(long)]
        no_save_progress: bool,
    },

    /// Resumable paged sync of CMS attachments into the local persistence model.
    SyncAttachments {
        #[arg(long)]
        no_save_progress: bool,
    },

    /// Full-table walk recomputing each Object's attachment_metadata_hash.
    SyncHashes,

    /// Reconciles DPRES SFTP ingest reports against awaiting packages.
    SyncProcessedSips {
        /// Number of day-folders to scan, counting back from today.
        #[arg(long, default_value_t = 31)]
        days: i64,
    },

    /// Schedules fresh preservation attempts for eligible objects.
    EnqueueObjects {
        /// Stop once this many objects have been scheduled.
        #[arg(long)]
        object_count: i64,

        /// Evaluate eligible objects in random order instead of id order.
        #[arg(long)]
        random: bool,

        /// Restrict eligibility evaluation to this explicit id list.
        #[arg(long, value_delimiter = ',')]
        object_ids: Option<Vec<i64>>,
    },

    /// Same as `enqueue-objects`, but submitted as a single job on the
    /// `enqueue_objects` queue so the invoking command returns immediately.
    DeferredEnqueueObjects {
        #[arg(long)]
        object_count: i64,

        #[arg(long)]
        random: bool,

        #[arg(long, value_delimiter = ',')]
        object_ids: Option<Vec<i64>>,
    },

    /// Schedules a fresh download for one previously-rejected object.
    ReenqueueObject {
        object_id: i64,
    },

    /// Freezes the given objects, cancelling any in-flight non-terminal package.
    FreezeObjects {
        #[arg(required = true, value_delimiter = ',')]
        object_ids: Vec<i64>,

        #[arg(long)]
        reason: String,

        #[arg(long, value_enum, default_value_t = FreezeSourceArg::User)]
        source: FreezeSourceArg,

        /// Also purge any queued/started/failed jobs and the object's
        /// working directory.
        #[arg(long)]
        delete_jobs: bool,
    },

    /// Unfreezes objects matching a reason filter and/or an explicit id list.
    UnfreezeObjects {
        #[arg(long)]
        reason: Option<String>,

        #[arg(long, value_delimiter = ',')]
        object_ids: Option<Vec<i64>>,

        /// Schedule a fresh download for each object unfrozen.
        #[arg(long)]
        enqueue: bool,
    },

    /// Resets workflow state after a database restore by discarding every
    /// dangling (downloaded-or-packaged but not-yet-uploaded) package and
    /// restoring its object to a pristine pre-download state. Scans the
    /// whole table itself; takes no object id list.
    ResetWorkflow {
        /// Confirms the reset should actually run. Without this flag the
        /// command only prints the help text — mirrors the original's
        /// `--perform-reset` safety gate.
        #[arg(long)]
        perform_reset: bool,
    },

    /// Creates the relational schema this pipeline depends on.
    CreatePasDb,

    /// Ad-hoc DPRES search/download, bypassing the workflow's own ports.
    DipTool {
        /// DPRES API base URL; falls back to the `DIP_TOOL_BASE_URL`
        /// environment variable when omitted.
        #[arg(long)]
        base_url: Option<String>,

        /// Accept self-signed/invalid TLS certificates.
        #[arg(long)]
        insecure: bool,

        #[command(subcommand)]
        action: DipToolAction,
    },

    /// Minimal interactive SQL shell against the configured database.
    PasShell,

    /// Runs the stage-job worker loop: dequeues and executes jobs from the
    /// given stage queues until a shutdown signal arrives. Stands in for
    /// the separate `rq worker <queue>` process the original deployment
    /// relies on — this crate's queue layout isn't RQ-wire-compatible, so
    /// it needs its own runner rather than the external `rq` CLI.
    Work {
        /// Stage queues to service, by name (`download-object`,
        /// `create-sip`, `submit-sip`, `confirm-sip`). Defaults to all four.
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<String>>,

        /// How long to sleep after finding every serviced queue empty
        /// before polling again, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        poll_interval_ms: u64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DipToolAction {
    /// Downloads one AIP's SIP package by id.
    Download {
        aip_id: String,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Lists known packages, optionally filtered by a free-text query.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        limit: u32,

        #[arg(long)]
        query: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeSourceArg {
    User,
    Automatic,
}

/// Parses `std::env::args()` into a [`Cli`].
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_freeze_objects_with_defaults() {
        let cli = Cli::parse_from(["preservation-engine", "freeze-objects", "1,2,3", "--reason", "operator request"]);
        match cli.command {
            Commands::FreezeObjects { object_ids, reason, source, delete_jobs } => {
                assert_eq!(object_ids, vec![1, 2, 3]);
                assert_eq!(reason, "operator request");
                assert_eq!(source, FreezeSourceArg::User);
                assert!(!delete_jobs);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_enqueue_objects_with_random_and_ids() {
        let cli = Cli::parse_from([
            "preservation-engine",
            "enqueue-objects",
            "--object-count",
            "10",
            "--random",
            "--object-ids",
            "4,5,6",
        ]);
        match cli.command {
            Commands::EnqueueObjects { object_count, random, object_ids } => {
                assert_eq!(object_count, 10);
                assert!(random);
                assert_eq!(object_ids, Some(vec![4, 5, 6]));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sync_processed_sips_default_days() {
        let cli = Cli::parse_from(["preservation-engine", "sync-processed-sips"]);
        match cli.command {
            Commands::SyncProcessedSips { days } => assert_eq!(days, 31),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_dip_tool_download() {
        let cli = Cli::parse_from(["preservation-engine", "dip-tool", "download", "aip-123"]);
        match cli.command {
            Commands::DipTool { action: DipToolAction::Download { aip_id, output }, base_url, insecure } => {
                assert_eq!(aip_id, "aip-123");
                assert_eq!(output, None);
                assert_eq!(base_url, None);
                assert!(!insecure);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
