// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # `preservation-engine` binary
//!
//! The composition root. Parses the CLI, loads configuration the
//! `preservation-bootstrap` way, wires the Postgres/Redis/SFTP adapters
//! behind the domain's ports, and dispatches to the application-layer
//! operation the chosen subcommand names. Everything past this file takes
//! plain values and connection handles — it never reaches back into
//! `preservation-bootstrap` or reads a config file itself.

mod application;
mod collaborator_config;
mod error;
mod infrastructure;
#[cfg(test)]
mod test_support;

use application::{admin, dip_tool, jobs, services, workflow};
use error::EngineError;
use infrastructure::adapters::{DpresSftpTransport, SipSubprocessAdapter};
use infrastructure::db::{
    pool, PostgresAttachmentRepository, PostgresHashLookup, PostgresObjectRepository, PostgresPackageRepository,
    PostgresSyncStatusRepository,
};
use infrastructure::queue::{heartbeat::Heartbeats, locks::RedisLock, redis_job_store::RedisJobStore, JobStore, Stage};
use preservation_bootstrap::cli::{parse_cli, Cli, Commands, DipToolAction, FreezeSourceArg};
use preservation_bootstrap::config::AppConfig;
use preservation_bootstrap::exit_code::ExitCode;
use preservation_bootstrap::signals::create_signal_handler;
use preservation_domain::value_objects::{FreezeSource, ObjectId};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing_subscriber::EnvFilter;

/// App name used for the config search order (§6) and the per-user config
/// directory (`AppConfig::load`).
const APP_NAME: &str = "preservation-workflow";

#[tokio::main]
async fn main() {
    let cli = parse_cli();
    let exit = run(cli).await;
    std::process::exit(exit.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    let config = match AppConfig::load(APP_NAME, cli.config.as_deref()) {
        Ok(config) => config.with_verbose(cli.verbose),
        Err(err) => {
            eprintln!("error loading configuration: {err}");
            return ExitCode::Config;
        }
    };
    init_tracing(&config);

    match dispatch(&config, cli.command).await {
        Ok(message) => {
            if let Some(message) = message {
                println!("{message}");
            }
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from_error(&err)
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let level = if config.is_verbose() { tracing::Level::DEBUG } else { config.logging().to_tracing_level() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Every repository/queue/lock/heartbeat handle most commands need,
/// assembled once per invocation so individual dispatch arms stay a few
/// lines each. Collaborator adapters (CMS/DPRES/SIP tooling) are built
/// lazily per command instead, so e.g. `pas-shell` never needs their
/// environment variables to be set.
struct Context {
    config: AppConfig,
    pool: sqlx::PgPool,
    objects: Arc<PostgresObjectRepository>,
    attachments: Arc<PostgresAttachmentRepository>,
    packages: Arc<PostgresPackageRepository>,
    sync_status: Arc<PostgresSyncStatusRepository>,
    jobs: Arc<RedisJobStore>,
    lock: Arc<RedisLock>,
    heartbeats: Arc<Heartbeats>,
}

async fn build_context(config: &AppConfig) -> Result<Context, EngineError> {
    let pool = pool::connect(&config.db().connection_url(), 10).await?;
    let redis_client = redis::Client::open(config.redis().connection_url()).map_err(EngineError::from)?;
    let conn = redis_client.get_connection_manager().await.map_err(EngineError::from)?;

    Ok(Context {
        config: config.clone(),
        pool: pool.clone(),
        objects: Arc::new(PostgresObjectRepository::new(pool.clone())),
        attachments: Arc::new(PostgresAttachmentRepository::new(pool.clone())),
        packages: Arc::new(PostgresPackageRepository::new(pool.clone())),
        sync_status: Arc::new(PostgresSyncStatusRepository::new(pool.clone())),
        jobs: Arc::new(RedisJobStore::new(conn.clone())),
        lock: Arc::new(RedisLock::new(conn.clone())),
        heartbeats: Arc::new(Heartbeats::new(conn)),
    })
}

async fn dispatch(config: &AppConfig, command: Commands) -> Result<Option<String>, EngineError> {
    // `create-pas-db`, `pas-shell`, and `dip-tool` only ever need a
    // database pool or an HTTP client, never the full `Context` — building
    // Redis and the collaborator adapters eagerly would make e.g.
    // `pas-shell` fail on a misconfigured SFTP key it never touches.
    match command {
        Commands::CreatePasDb => {
            let pool = pool::connect(&config.db().connection_url(), 5).await?;
            admin::create_database(&pool).await?;
            return Ok(Some("schema created".to_string()));
        }
        Commands::PasShell => {
            let pool = pool::connect(&config.db().connection_url(), 5).await?;
            admin::run_shell(&pool).await?;
            return Ok(None);
        }
        Commands::DipTool { base_url, insecure, action } => {
            let base_url = base_url
                .or_else(|| std::env::var("DIP_TOOL_BASE_URL").ok())
                .ok_or_else(|| EngineError::Config("dip-tool requires --base-url or DIP_TOOL_BASE_URL".to_string()))?;
            let dip_config = dip_tool::DipToolConfig { base_url, accept_invalid_certs: insecure };
            return match action {
                DipToolAction::Download { aip_id, output } => {
                    let path = dip_tool::download(&dip_config, &aip_id, output)
                        .await
                        .map_err(|err| EngineError::Config(err.to_string()))?;
                    Ok(Some(format!("downloaded {}", path.display())))
                }
                DipToolAction::List { page, limit, query } => {
                    let ids = dip_tool::list_pkgs(&dip_config, page, limit, query.as_deref())
                        .await
                        .map_err(|err| EngineError::Config(err.to_string()))?;
                    Ok(Some(ids.join("\n")))
                }
            };
        }
        _ => {}
    }

    let ctx = build_context(config).await?;

    match command {
        Commands::SyncObjects { no_save_progress } => {
            let cms = Arc::new(collaborator_config::cms_http_client()?);
            let deps = services::CmsSyncDeps {
                objects: ctx.objects.clone(),
                attachments: ctx.attachments.clone(),
                sync_status: ctx.sync_status.clone(),
                cms,
                heartbeats: ctx.heartbeats.clone(),
            };
            let summary = services::sync_objects(&deps, !no_save_progress).await?;
            Ok(Some(format!("{} inserted, {} updated", summary.inserted, summary.updated)))
        }
        Commands::SyncAttachments { no_save_progress } => {
            let cms = Arc::new(collaborator_config::cms_http_client()?);
            let deps = services::CmsSyncDeps {
                objects: ctx.objects.clone(),
                attachments: ctx.attachments.clone(),
                sync_status: ctx.sync_status.clone(),
                cms,
                heartbeats: ctx.heartbeats.clone(),
            };
            let summary = services::sync_attachments(&deps, !no_save_progress).await?;
            Ok(Some(format!("{} inserted, {} updated", summary.inserted, summary.updated)))
        }
        Commands::SyncHashes => {
            let hash_lookup: Arc<dyn services::ObjectAttachmentHashLookup> =
                Arc::new(PostgresHashLookup::new(ctx.pool.clone()));
            let objects: Arc<dyn preservation_domain::repositories::ObjectRepository> = ctx.objects.clone();
            let summary = services::sync_hashes(&objects, &hash_lookup, &ctx.heartbeats).await?;
            Ok(Some(format!("{} updated, {} skipped", summary.updated, summary.skipped)))
        }
        Commands::SyncProcessedSips { days } => {
            let transport = collaborator_config::dpres_sftp_config()
                .and_then(|cfg| DpresSftpTransport::connect(&cfg).map_err(EngineError::from))?;
            let deps = services::DpresReconcilerDeps {
                packages: ctx.packages.clone(),
                transport: Arc::new(transport),
                jobs: ctx.jobs.clone(),
                heartbeats: ctx.heartbeats.clone(),
                package_dir: ctx.config.package().package_dir.clone(),
            };
            let summary = services::sync_processed_sips(&deps, days).await?;
            Ok(Some(format!(
                "{} confirmed, {} already known",
                summary.confirmed, summary.skipped_already_known
            )))
        }
        Commands::EnqueueObjects { object_count, random, object_ids } => {
            let deps = enqueue_planner_deps(&ctx);
            let ids = object_ids.map(|ids| ids.into_iter().map(ObjectId::new).collect::<Vec<_>>());
            let count = workflow::enqueue_objects(&deps, object_count, random, ids.as_deref()).await?;
            Ok(Some(format!("{count} object(s) enqueued")))
        }
        Commands::DeferredEnqueueObjects { object_count, random, object_ids } => {
            let deps = enqueue_planner_deps(&ctx);
            let ids = object_ids.map(|ids| ids.into_iter().map(ObjectId::new).collect::<Vec<_>>());
            let count = workflow::enqueue_objects(&deps, object_count, random, ids.as_deref()).await?;
            Ok(Some(format!("deferred enqueue scheduled {count} object(s)")))
        }
        Commands::ReenqueueObject { object_id } => {
            let deps = enqueue_planner_deps(&ctx);
            workflow::reenqueue_object(&deps, ObjectId::new(object_id)).await?;
            Ok(Some(format!("object {object_id} reenqueued")))
        }
        Commands::FreezeObjects { object_ids, reason, source, delete_jobs } => {
            let deps = workflow::FreezeDeps {
                objects: ctx.objects.clone(),
                packages: ctx.packages.clone(),
                jobs: ctx.jobs.clone(),
                lock: ctx.lock.clone(),
                package_dir: ctx.config.package().package_dir.clone(),
                archive_dir: ctx.config.package().archive_dir.clone(),
            };
            let ids: Vec<ObjectId> = object_ids.into_iter().map(ObjectId::new).collect();
            let source = match source {
                FreezeSourceArg::User => FreezeSource::User,
                FreezeSourceArg::Automatic => FreezeSource::Automatic,
            };
            let outcome = workflow::freeze_objects(&deps, &ids, &reason, source, delete_jobs).await?;
            Ok(Some(format!(
                "{} object(s) frozen, {} package(s) cancelled",
                outcome.freeze_count, outcome.cancel_count
            )))
        }
        Commands::UnfreezeObjects { reason, object_ids, enqueue } => {
            let deps = workflow::UnfreezeDeps {
                objects: ctx.objects.clone(),
                packages: ctx.packages.clone(),
                jobs: ctx.jobs.clone(),
                lock: ctx.lock.clone(),
            };
            let ids: Option<Vec<ObjectId>> = object_ids.map(|ids| ids.into_iter().map(ObjectId::new).collect());
            let request = workflow::UnfreezeRequest { reason: reason.as_deref(), ids: ids.as_deref(), enqueue };
            let unfrozen = workflow::unfreeze_objects(&deps, request).await?;
            Ok(Some(format!("{} object(s) unfrozen", unfrozen.len())))
        }
        Commands::ResetWorkflow { perform_reset } => {
            if !perform_reset {
                return Ok(Some(
                    "pass --perform-reset to actually reset dangling packages (BEFORE PERFORMING A RESET ensure no jobs are on the workflow)"
                        .to_string(),
                ));
            }
            let deps = workflow::ResetDeps {
                objects: ctx.objects.clone(),
                packages: ctx.packages.clone(),
                lock: ctx.lock.clone(),
                package_dir: ctx.config.package().package_dir.clone(),
            };
            let reset = workflow::reset_workflow(&deps).await?;
            Ok(Some(format!("{} object(s) reset", reset.len())))
        }
        Commands::Work { stages, poll_interval_ms } => {
            run_workers(&ctx, stages, poll_interval_ms).await?;
            Ok(None)
        }
        Commands::CreatePasDb | Commands::PasShell | Commands::DipTool { .. } => {
            unreachable!("handled before Context was built")
        }
    }
}

fn enqueue_planner_deps(ctx: &Context) -> workflow::EnqueuePlannerDeps {
    workflow::EnqueuePlannerDeps {
        objects: ctx.objects.clone(),
        packages: ctx.packages.clone(),
        jobs: ctx.jobs.clone(),
        lock: ctx.lock.clone(),
        preservation_delay: chrono::Duration::from_std(ctx.config.package().preservation_delay)
            .unwrap_or_else(|_| chrono::Duration::zero()),
        update_delay: chrono::Duration::from_std(ctx.config.package().update_delay)
            .unwrap_or_else(|_| chrono::Duration::zero()),
    }
}

/// `work` (§5's "parallel workers, any number per queue"): loops
/// `jobs::run_one` over the requested stage queues until a shutdown signal
/// arrives, backing off by `poll_interval_ms` whenever every serviced queue
/// comes back empty. Stands in for the external `rq worker <queue>`
/// process the original deployment relies on.
async fn run_workers(ctx: &Context, stages: Option<Vec<String>>, poll_interval_ms: u64) -> Result<(), EngineError> {
    let stages = resolve_stages(stages)?;
    let sip_config = collaborator_config::sip_tooling_config()?;
    let sip_adapter: Arc<SipSubprocessAdapter> = Arc::new(SipSubprocessAdapter::new(sip_config));

    let deps = jobs::WorkerDeps {
        objects: ctx.objects.clone(),
        packages: ctx.packages.clone(),
        download: jobs::download_object::DownloadObjectDeps {
            objects: ctx.objects.clone(),
            attachments: ctx.attachments.clone(),
            packages: ctx.packages.clone(),
            downloader: sip_adapter.clone(),
            jobs: ctx.jobs.clone(),
            package_dir: ctx.config.package().package_dir.clone(),
            archive_dir: ctx.config.package().archive_dir.clone(),
        },
        create: jobs::create_sip::CreateSipDeps {
            objects: ctx.objects.clone(),
            packages: ctx.packages.clone(),
            builder: sip_adapter.clone(),
            jobs: ctx.jobs.clone(),
            package_dir: ctx.config.package().package_dir.clone(),
            archive_dir: ctx.config.package().archive_dir.clone(),
        },
        submit: jobs::submit_sip::SubmitSipDeps {
            packages: ctx.packages.clone(),
            uploader: sip_adapter.clone(),
            package_dir: ctx.config.package().package_dir.clone(),
        },
        confirm: jobs::confirm_sip::ConfirmSipDeps {
            objects: ctx.objects.clone(),
            packages: ctx.packages.clone(),
            confirmer: sip_adapter,
            package_dir: ctx.config.package().package_dir.clone(),
            archive_dir: ctx.config.package().archive_dir.clone(),
        },
        jobs: ctx.jobs.clone(),
        lock: ctx.lock.clone(),
    };

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let handler = create_signal_handler();
        handler
            .wait_for_signal(Box::new(move || {
                shutdown_signal.notify_one();
            }))
            .await;
    });

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                tracing::info!("worker loop shutting down");
                break;
            }
            found = poll_once(&deps, &stages) => {
                if !found? {
                    tokio::time::sleep(StdDuration::from_millis(poll_interval_ms)).await;
                }
            }
        }
    }
    Ok(())
}

async fn poll_once(deps: &jobs::WorkerDeps, stages: &[Stage]) -> Result<bool, EngineError> {
    let mut any = false;
    for &stage in stages {
        if jobs::run_one(deps, stage).await? {
            any = true;
        }
    }
    Ok(any)
}

fn resolve_stages(stages: Option<Vec<String>>) -> Result<Vec<Stage>, EngineError> {
    let Some(names) = stages else {
        return Ok(Stage::ALL_STAGE_QUEUES.to_vec());
    };
    names
        .iter()
        .map(|name| match name.replace('_', "-").as_str() {
            "download-object" => Ok(Stage::DownloadObject),
            "create-sip" => Ok(Stage::CreateSip),
            "submit-sip" => Ok(Stage::SubmitSip),
            "confirm-sip" => Ok(Stage::ConfirmSip),
            other => Err(EngineError::Config(format!("unknown stage queue {other:?}"))),
        })
        .collect()
}
