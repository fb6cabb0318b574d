//! Synchronization pass driver
//!
//! One pass: scan the local tree, reconcile every change, write the
//! propagatable ones to the remote and advance the baseline behind them.
//! Committing an `Added` change also releases the identity the scanner
//! reserved for it.
//!
//! Changes fan out to a fixed pool of worker tasks. Each worker owns an
//! mpsc channel and a change goes to worker `hash(identity) % workers`, so
//! all work for one identity runs on one task, in order. A failure of one
//! change never stops the others; it ends up in the [`PassReport`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use gdsync_conflict::{Reconciliation, ReconciliationEngine};
use gdsync_core::{
    domain::{BaselineEntry, Change, ChangeKind, FileIdentity, PassId, PostponedFile},
    ports::{IBaselineStore, ILocalScanner, IPendingIdentityStore, IRemoteWriter},
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::SyncError;

/// Queue depth per worker
const WORKER_QUEUE: usize = 64;

/// Tunables for a pass
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Number of worker tasks (at least 1)
    pub workers: usize,
    /// Reconcile without writing to the remote or advancing the baseline
    pub dry_run: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            dry_run: false,
        }
    }
}

/// A change that was not applied in this pass, and why
#[derive(Debug, Clone, Serialize)]
pub struct FailedChange {
    pub change: Change,
    pub reason: String,
}

/// A change held back by a conflict
#[derive(Debug, Clone, Serialize)]
pub struct ConflictedChange {
    pub change: Change,
    pub remote: ChangeKind,
}

/// Summary of one synchronization pass
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub pass_id: PassId,
    /// Changes written to the remote (or that would be, in a dry run)
    pub propagated: Vec<Change>,
    /// Changes both sides already agreed on
    pub no_ops: Vec<Change>,
    /// Changes held back by a recorded conflict
    pub conflicts: Vec<ConflictedChange>,
    /// Changes to retry on a later pass
    pub deferred: Vec<FailedChange>,
    /// Changes the remote answered inconsistently about
    pub skipped: Vec<FailedChange>,
    /// New local files the scan could not assign an identity to
    pub postponed: Vec<PostponedFile>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl PassReport {
    fn new(pass_id: PassId, dry_run: bool) -> Self {
        Self {
            pass_id,
            propagated: Vec::new(),
            no_ops: Vec::new(),
            conflicts: Vec::new(),
            deferred: Vec::new(),
            skipped: Vec::new(),
            postponed: Vec::new(),
            duration_ms: 0,
            dry_run,
            cancelled: false,
        }
    }

    /// Total number of changes the pass saw, postponed files excluded
    pub fn total(&self) -> usize {
        self.propagated.len()
            + self.no_ops.len()
            + self.conflicts.len()
            + self.deferred.len()
            + self.skipped.len()
    }

    fn absorb(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Propagated(change) => self.propagated.push(change),
            Outcome::NoOp(change) => self.no_ops.push(change),
            Outcome::Conflict(change, remote) => {
                self.conflicts.push(ConflictedChange { change, remote })
            }
            Outcome::Deferred(change, reason) => {
                self.deferred.push(FailedChange { change, reason })
            }
            Outcome::Skipped(change, reason) => self.skipped.push(FailedChange { change, reason }),
        }
    }
}

/// What happened to one change
#[derive(Debug)]
enum Outcome {
    Propagated(Change),
    NoOp(Change),
    Conflict(Change, ChangeKind),
    Deferred(Change, String),
    Skipped(Change, String),
}

/// Everything a worker needs to process a change
struct Pipeline {
    engine: Arc<ReconciliationEngine>,
    writer: Arc<dyn IRemoteWriter>,
    baseline: Arc<dyn IBaselineStore>,
    pending: Arc<dyn IPendingIdentityStore>,
    dry_run: bool,
}

impl Pipeline {
    async fn process(&self, change: Change, cancel: &CancellationToken) -> Outcome {
        let decision = match self.engine.reconcile(&change, cancel).await {
            Ok(decision) => decision,
            Err(err) if err.is_transient() => {
                debug!(identity = %change.identity(), error = %err, "Change deferred");
                return Outcome::Deferred(change, err.to_string());
            }
            Err(err) => {
                warn!(identity = %change.identity(), error = %err, "Change skipped");
                return Outcome::Skipped(change, err.to_string());
            }
        };

        match decision {
            Reconciliation::Propagate(_) => self.propagate(change, cancel).await,
            Reconciliation::NoOp => {
                // Only a double delete converges to a no-op; the file is gone
                // on both sides, so it leaves the baseline too.
                if !self.dry_run && change.kind() == ChangeKind::Deleted {
                    if let Err(err) = self.baseline.remove(change.identity()).await {
                        warn!(identity = %change.identity(), error = %err, "Failed to drop baseline");
                    }
                }
                Outcome::NoOp(change)
            }
            Reconciliation::Conflict { remote } => Outcome::Conflict(change, remote),
        }
    }

    async fn propagate(&self, change: Change, cancel: &CancellationToken) -> Outcome {
        if self.dry_run {
            return Outcome::Propagated(change);
        }
        if cancel.is_cancelled() {
            return Outcome::Deferred(change, "pass cancelled before propagation".to_string());
        }

        if let Err(err) = self.writer.propagate(&change).await {
            warn!(identity = %change.identity(), error = %format!("{err:#}"), "Propagation failed");
            return Outcome::Deferred(change, format!("{err:#}"));
        }

        if let Err(err) = self.commit_baseline(&change).await {
            warn!(
                identity = %change.identity(),
                error = %format!("{err:#}"),
                "Remote updated but baseline not advanced"
            );
            return Outcome::Deferred(change, format!("baseline commit failed: {err:#}"));
        }

        Outcome::Propagated(change)
    }

    async fn commit_baseline(&self, change: &Change) -> anyhow::Result<()> {
        match change.kind() {
            ChangeKind::Added | ChangeKind::Modified => {
                let snapshot = change.snapshot();
                let path = snapshot
                    .path()
                    .ok_or_else(|| anyhow::anyhow!("{} carries no local path", change.identity()))?;
                let entry = BaselineEntry::new(path, snapshot.clone())?;
                self.baseline.upsert(&entry).await?;

                if change.kind() == ChangeKind::Added {
                    // A leftover reservation is released by the next scan
                    if let Err(err) = self.pending.release(change.identity()).await {
                        warn!(
                            identity = %change.identity(),
                            error = %format!("{err:#}"),
                            "Failed to release identity reservation"
                        );
                    }
                }
                Ok(())
            }
            ChangeKind::Deleted => self.baseline.remove(change.identity()).await,
        }
    }
}

/// Drives synchronization passes
pub struct SyncDriver {
    scanner: Arc<dyn ILocalScanner>,
    pipeline: Arc<Pipeline>,
    workers: usize,
}

impl SyncDriver {
    pub fn new(
        scanner: Arc<dyn ILocalScanner>,
        engine: Arc<ReconciliationEngine>,
        writer: Arc<dyn IRemoteWriter>,
        baseline: Arc<dyn IBaselineStore>,
        pending: Arc<dyn IPendingIdentityStore>,
        options: DriverOptions,
    ) -> Self {
        Self {
            scanner,
            pipeline: Arc::new(Pipeline {
                engine,
                writer,
                baseline,
                pending,
                dry_run: options.dry_run,
            }),
            workers: options.workers.max(1),
        }
    }

    /// Runs one full pass
    ///
    /// Cancelling `cancel` stops outstanding oracle queries; the changes that
    /// did not finish are reported as deferred and `cancelled` is set.
    ///
    /// # Errors
    /// Returns `SyncError::Scan` if the local tree cannot be scanned, or
    /// `SyncError::Worker` if a worker task dies. Per-change failures and
    /// postponed new files are reported, not returned.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassReport, SyncError> {
        let start = Instant::now();
        let pass_id = PassId::new();
        let mut report = PassReport::new(pass_id, self.pipeline.dry_run);

        info!(pass_id = %pass_id, dry_run = self.pipeline.dry_run, "Starting sync pass");

        let scan = self.scanner.scan().await.map_err(SyncError::Scan)?;
        let changes = scan.changes;
        report.postponed = scan.postponed;

        if !changes.is_empty() {
            let workers = self.workers.min(changes.len());
            let mut senders = Vec::with_capacity(workers);
            let mut handles = Vec::with_capacity(workers);

            for worker in 0..workers {
                let (tx, rx) = mpsc::channel(WORKER_QUEUE);
                senders.push(tx);
                handles.push(tokio::spawn(run_worker(
                    worker,
                    rx,
                    Arc::clone(&self.pipeline),
                    cancel.clone(),
                )));
            }

            for change in changes {
                let bucket = bucket_for(change.identity(), workers);
                if let Err(mpsc::error::SendError(change)) = senders[bucket].send(change).await {
                    report.absorb(Outcome::Deferred(change, "worker stopped".to_string()));
                }
            }
            drop(senders);

            for handle in handles {
                let outcomes = handle
                    .await
                    .map_err(|e| SyncError::Worker(e.to_string()))?;
                for outcome in outcomes {
                    report.absorb(outcome);
                }
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pass_id = %pass_id,
            propagated = report.propagated.len(),
            no_ops = report.no_ops.len(),
            conflicts = report.conflicts.len(),
            deferred = report.deferred.len(),
            skipped = report.skipped.len(),
            postponed = report.postponed.len(),
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "Sync pass completed"
        );

        Ok(report)
    }
}

async fn run_worker(
    worker: usize,
    mut rx: mpsc::Receiver<Change>,
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    while let Some(change) = rx.recv().await {
        debug!(worker, identity = %change.identity(), kind = %change.kind(), "Processing change");
        outcomes.push(pipeline.process(change, &cancel).await);
    }
    outcomes
}

/// Maps an identity to a worker index
fn bucket_for(identity: &FileIdentity, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    identity.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}
