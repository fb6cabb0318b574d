//! Sync command - run one synchronization pass

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use gdsync_cache::{
    DatabasePool, SqliteBaselineStore, SqliteConflictStore, SqlitePendingIdentityStore,
};
use gdsync_conflict::{ConflictRegister, ReconciliationEngine};
use gdsync_core::config::Config;
use gdsync_drive::{
    allocator::DriveIdentityAllocator, client::DriveClient, oracle::DriveOracle,
    writer::DriveWriter,
};
use gdsync_sync::{DriverOptions, LocalTreeScanner, PassReport, SyncDriver};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::expand_tilde;
use crate::output::{Output, OutputFormat};
use crate::AppContext;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Number of reconciliation workers (overrides sync.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Reconcile and record conflicts without writing to Drive
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let out = Output::new(format);

        let mut config = ctx.config.clone();
        if let Some(workers) = self.workers {
            config.sync.workers = workers;
        }
        config.sync.root = expand_tilde(&config.sync.root);
        config.sync.state_db = expand_tilde(&config.sync.state_db);

        let errors = config.validate();
        if !errors.is_empty() {
            for error in &errors {
                out.error(&error.to_string());
            }
            anyhow::bail!("invalid configuration");
        }

        let token = match std::env::var(&config.drive.access_token_env) {
            Ok(token) if !token.trim().is_empty() => token,
            _ => {
                out.error(&format!(
                    "Set {} to a Google Drive access token",
                    config.drive.access_token_env
                ));
                anyhow::bail!("missing access token");
            }
        };

        let driver = build_driver(&config, token, self.dry_run).await?;

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing in-flight changes");
                signal_token.cancel();
            }
        });

        let result = driver.run_pass(&cancel).await;
        signal.abort();
        let report = result?;

        print_report(&report, &out)?;
        Ok(())
    }
}

/// Wires the SQLite state, the Drive adapters and the driver together
async fn build_driver(config: &Config, token: String, dry_run: bool) -> Result<SyncDriver> {
    let pool = DatabasePool::new(&config.sync.state_db)
        .await
        .context("Failed to open state database")?;

    let baseline = Arc::new(SqliteBaselineStore::new(pool.pool().clone()));
    let conflicts = Arc::new(SqliteConflictStore::new(pool.pool().clone()));
    let pending = Arc::new(SqlitePendingIdentityStore::new(pool.pool().clone()));
    let register = Arc::new(ConflictRegister::new(conflicts));

    let client = Arc::new(DriveClient::with_base_url(
        token,
        config.drive.api_base_url.as_str(),
    ));
    let oracle = Arc::new(
        DriveOracle::new(Arc::clone(&client), baseline.clone()).with_pending(pending.clone()),
    );
    let writer = Arc::new(DriveWriter::new(
        Arc::clone(&client),
        config.sync.root.clone(),
        config.drive.folder_id.clone(),
    ));
    let allocator = Arc::new(DriveIdentityAllocator::new(client));

    let scanner = Arc::new(LocalTreeScanner::new(
        config.sync.root.clone(),
        baseline.clone(),
        pending.clone(),
        allocator,
    ));
    let engine = Arc::new(ReconciliationEngine::new(oracle, register));

    info!(
        root = %config.sync.root.display(),
        workers = config.sync.workers,
        dry_run,
        "Sync driver ready"
    );

    Ok(SyncDriver::new(
        scanner,
        engine,
        writer,
        baseline,
        pending,
        DriverOptions {
            workers: config.sync.workers,
            dry_run,
        },
    ))
}

fn print_report(report: &PassReport, out: &Output) -> Result<()> {
    if out.is_json() {
        return out.document(report);
    }

    for line in summary_lines(report) {
        out.detail(&line);
    }

    if report.cancelled {
        out.warn("Pass was interrupted; deferred changes will be retried");
    } else if report.conflicts.is_empty() {
        out.success("Sync pass completed");
    } else {
        out.warn(&format!(
            "{} conflict(s) need attention; see 'gdsync conflicts list'",
            report.conflicts.len()
        ));
    }
    Ok(())
}

/// Human-readable breakdown of a pass
fn summary_lines(report: &PassReport) -> Vec<String> {
    let propagated = if report.dry_run {
        "Would propagate"
    } else {
        "Propagated"
    };

    let mut lines = vec![
        format!("Pass {} ({} ms)", report.pass_id, report.duration_ms),
        format!("{propagated}: {}", report.propagated.len()),
        format!("Unchanged: {}", report.no_ops.len()),
        format!("Conflicts: {}", report.conflicts.len()),
        format!("Deferred: {}", report.deferred.len()),
        format!("Skipped: {}", report.skipped.len()),
    ];
    if !report.postponed.is_empty() {
        lines.push(format!("Postponed: {}", report.postponed.len()));
    }

    for conflict in &report.conflicts {
        lines.push(format!(
            "  conflict {} (local {}, remote {})",
            conflict.change.identity(),
            conflict.change.kind(),
            conflict.remote
        ));
    }
    for failed in report.deferred.iter().chain(&report.skipped) {
        lines.push(format!("  {}: {}", failed.change.identity(), failed.reason));
    }
    for file in &report.postponed {
        lines.push(format!("  {}: {}", file.path, file.reason));
    }
    lines
}
