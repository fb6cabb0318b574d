//! Local tree scanner
//!
//! Walks the sync root, hashes every regular file with SHA-256 and diffs the
//! result against the baseline:
//!
//! - baseline entry whose file is gone: `Deleted` with the baseline snapshot
//! - baseline entry whose content changed: `Modified`
//! - file without a baseline entry: `Added` under a reserved identity
//!
//! Identities for new files are reserved in the `IPendingIdentityStore` and
//! reused by every later scan until the driver commits the file, so a failed
//! upload is retried under the same identity. When no identity can be had,
//! the file is postponed and the rest of the scan still goes through.
//!
//! Hidden entries (name starting with `.`) and anything that is neither a
//! regular file nor a directory are ignored.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use gdsync_core::{
    domain::{
        BaselineEntry, Change, Checksum, FileIdentity, FileSnapshot, LocalScan, PendingIdentity,
        PostponedFile,
    },
    ports::{IBaselineStore, IIdentityAllocator, ILocalScanner, IPendingIdentityStore},
};
use tracing::{debug, info, instrument, warn};

/// A regular file found under the sync root
#[derive(Debug)]
struct LocalFile {
    /// `/`-separated path relative to the root
    relative: String,
    checksum: Checksum,
    modified: DateTime<Utc>,
}

impl LocalFile {
    fn added(self, identity: FileIdentity) -> Change {
        Change::added(
            FileSnapshot::new(identity, self.checksum, self.modified).with_path(self.relative),
        )
    }

    fn postpone(self, reason: impl Into<String>) -> PostponedFile {
        PostponedFile {
            path: self.relative,
            reason: reason.into(),
        }
    }
}

/// `ILocalScanner` over a directory tree
pub struct LocalTreeScanner {
    root: PathBuf,
    baseline: Arc<dyn IBaselineStore>,
    pending: Arc<dyn IPendingIdentityStore>,
    allocator: Arc<dyn IIdentityAllocator>,
}

impl LocalTreeScanner {
    pub fn new(
        root: impl Into<PathBuf>,
        baseline: Arc<dyn IBaselineStore>,
        pending: Arc<dyn IPendingIdentityStore>,
        allocator: Arc<dyn IIdentityAllocator>,
    ) -> Self {
        Self {
            root: root.into(),
            baseline,
            pending,
            allocator,
        }
    }

    /// Returns the sync root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collects every visible regular file below the root
    async fn walk(&self) -> Result<Vec<LocalFile>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }

                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(err) => {
                        warn!(path = %path.display(), %err, "Skipping unreadable entry");
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    match self.read_file(&path).await {
                        Ok(Some(file)) => files.push(file),
                        Ok(None) => {}
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "Skipping file");
                        }
                    }
                }
            }
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }

    async fn read_file(&self, path: &Path) -> Result<Option<LocalFile>> {
        let Some(relative) = relative_path(&self.root, path) else {
            warn!(path = %path.display(), "Skipping path that is not valid UTF-8");
            return Ok(None);
        };

        let metadata = tokio::fs::metadata(path).await?;
        let content = tokio::fs::read(path).await?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(LocalFile {
            relative,
            checksum: Checksum::sha256(&content),
            modified,
        }))
    }

    /// Turns new files into `Added` changes, or postpones them
    ///
    /// Reservations for paths that are no longer new files are released.
    async fn assign_identities(&self, new_files: Vec<LocalFile>, scan: &mut LocalScan) {
        let reservations = match self.pending.list().await {
            Ok(reservations) => reservations,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Failed to load identity reservations");
                let reason = format!("identity reservations unavailable: {err:#}");
                scan.postponed
                    .extend(new_files.into_iter().map(|f| f.postpone(reason.clone())));
                return;
            }
        };

        let new_paths: HashSet<&str> = new_files.iter().map(|f| f.relative.as_str()).collect();
        let mut reserved: HashMap<String, FileIdentity> = HashMap::new();
        let mut stale = Vec::new();
        for reservation in reservations {
            if new_paths.contains(reservation.path()) {
                reserved.insert(reservation.path().to_string(), reservation.identity().clone());
            } else {
                stale.push(reservation);
            }
        }

        for reservation in stale {
            debug!(
                path = reservation.path(),
                identity = %reservation.identity(),
                "Releasing stale reservation"
            );
            if let Err(err) = self.pending.release(reservation.identity()).await {
                warn!(
                    identity = %reservation.identity(),
                    error = %format!("{err:#}"),
                    "Failed to release reservation"
                );
            }
        }

        let mut unassigned = Vec::new();
        for file in new_files {
            match reserved.remove(&file.relative) {
                Some(identity) => {
                    debug!(path = %file.relative, %identity, "Local file added, identity reused");
                    scan.changes.push(file.added(identity));
                }
                None => unassigned.push(file),
            }
        }

        if unassigned.is_empty() {
            return;
        }

        let wanted = unassigned.len();
        let identities = match self.allocator.allocate(wanted).await {
            Ok(identities) if identities.len() == wanted => identities,
            Ok(identities) => {
                let reason = format!("asked for {wanted} identities, got {}", identities.len());
                warn!(%reason, "Postponing new files");
                scan.postponed
                    .extend(unassigned.into_iter().map(|f| f.postpone(reason.clone())));
                return;
            }
            Err(err) => {
                warn!(
                    files = wanted,
                    error = %format!("{err:#}"),
                    "Identity allocation failed, postponing new files"
                );
                let reason = format!("identity allocation failed: {err:#}");
                scan.postponed
                    .extend(unassigned.into_iter().map(|f| f.postpone(reason.clone())));
                return;
            }
        };

        for (file, identity) in unassigned.into_iter().zip(identities) {
            let outcome = match PendingIdentity::new(file.relative.as_str(), identity.clone()) {
                Ok(reservation) => self.pending.reserve(&reservation).await,
                Err(err) => Err(err.into()),
            };

            match outcome {
                Ok(()) => {
                    debug!(path = %file.relative, identity = %identity, "Local file added");
                    scan.changes.push(file.added(identity));
                }
                Err(err) => {
                    warn!(
                        path = %file.relative,
                        error = %format!("{err:#}"),
                        "Failed to reserve identity"
                    );
                    scan.postponed
                        .push(file.postpone(format!("failed to reserve identity: {err:#}")));
                }
            }
        }
    }
}

/// Renders `path` relative to `root` with `/` separators
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = stripped.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[async_trait::async_trait]
impl ILocalScanner for LocalTreeScanner {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn scan(&self) -> Result<LocalScan> {
        if !tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            bail!("sync root is not a directory: {}", self.root.display());
        }

        let files = self.walk().await?;
        let baseline = self
            .baseline
            .list()
            .await
            .context("Failed to load sync baseline")?;

        let mut by_path: HashMap<&str, &BaselineEntry> = HashMap::with_capacity(baseline.len());
        for entry in &baseline {
            if by_path.insert(entry.path(), entry).is_some() {
                warn!(path = entry.path(), "Several baseline entries share a path");
            }
        }

        let mut scan = LocalScan::default();
        let mut matched = HashSet::new();
        let mut new_files = Vec::new();

        for file in files {
            match by_path.get(file.relative.as_str()) {
                Some(entry) => {
                    matched.insert(entry.identity().clone());
                    if &file.checksum != entry.snapshot().checksum() {
                        debug!(path = %file.relative, "Local file modified");
                        scan.changes.push(Change::modified(
                            FileSnapshot::new(entry.identity().clone(), file.checksum, file.modified)
                                .with_path(file.relative),
                        ));
                    }
                }
                None => new_files.push(file),
            }
        }

        for entry in &baseline {
            if !matched.contains(entry.identity()) {
                debug!(path = entry.path(), "Local file deleted");
                scan.changes.push(Change::deleted(entry.snapshot().clone()));
            }
        }

        self.assign_identities(new_files, &mut scan).await;

        info!(
            changes = scan.changes.len(),
            postponed = scan.postponed.len(),
            "Local scan completed"
        );
        Ok(scan)
    }
}
