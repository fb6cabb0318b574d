//! SQLite implementations of the state ports
//!
//! ## Type Mapping
//!
//! | Domain Type      | SQL Type | Strategy                                         |
//! |------------------|----------|--------------------------------------------------|
//! | FileIdentity     | TEXT     | `.as_str()` / `FileIdentity::new()`              |
//! | Checksum         | TEXT     | `.as_str()` / `Checksum::new()`                  |
//! | ChangeKind       | TEXT     | `.name()`, kept next to the JSON for inspection  |
//! | Change           | TEXT     | serde_json serialization                         |
//! | DateTime<Utc>    | TEXT     | RFC 3339 via `to_rfc3339()`                      |

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use gdsync_core::domain::{
    BaselineEntry, Change, Checksum, ConflictRecord, FileIdentity, FileSnapshot, PendingIdentity,
};
use gdsync_core::ports::{IBaselineStore, IConflictStore, IPendingIdentityStore};

use crate::CacheError;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn conflict_from_row(row: &SqliteRow) -> Result<ConflictRecord, CacheError> {
    let local_str: String = row.get("local_change");
    let remote_str: String = row.get("remote_change");
    let detected_at_str: String = row.get("detected_at");

    let local: Change = serde_json::from_str(&local_str)
        .map_err(|e| CacheError::SerializationError(format!("Invalid local change JSON: {}", e)))?;
    let remote: Change = serde_json::from_str(&remote_str).map_err(|e| {
        CacheError::SerializationError(format!("Invalid remote change JSON: {}", e))
    })?;

    Ok(ConflictRecord::at(local, remote, parse_datetime(&detected_at_str)?))
}

fn baseline_from_row(row: &SqliteRow) -> Result<BaselineEntry, CacheError> {
    let identity: String = row.get("identity");
    let path: String = row.get("path");
    let checksum: String = row.get("checksum");
    let last_modified: String = row.get("last_modified");
    let synced_at: String = row.get("synced_at");

    let snapshot = FileSnapshot::new(
        FileIdentity::new(identity)?,
        Checksum::new(checksum)?,
        parse_datetime(&last_modified)?,
    );

    Ok(BaselineEntry::new(path, snapshot)?.with_synced_at(parse_datetime(&synced_at)?))
}

fn pending_from_row(row: &SqliteRow) -> Result<PendingIdentity, CacheError> {
    let identity: String = row.get("identity");
    let path: String = row.get("path");
    let reserved_at: String = row.get("reserved_at");

    Ok(PendingIdentity::new(path, FileIdentity::new(identity)?)?
        .with_reserved_at(parse_datetime(&reserved_at)?))
}

/// SQLite-backed conflict register storage
///
/// One row per identity; `save` relies on `INSERT OR REPLACE` so the
/// replacement of an older record is atomic.
#[derive(Clone)]
pub struct SqliteConflictStore {
    pool: SqlitePool,
}

impl SqliteConflictStore {
    /// Creates a store over an already-migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IConflictStore for SqliteConflictStore {
    async fn save(&self, record: &ConflictRecord) -> anyhow::Result<()> {
        let local_change = serde_json::to_string(record.local_change())
            .map_err(|e| anyhow::anyhow!("Failed to serialize local change: {}", e))?;
        let remote_change = serde_json::to_string(record.remote_change())
            .map_err(|e| anyhow::anyhow!("Failed to serialize remote change: {}", e))?;

        sqlx::query(
            "INSERT OR REPLACE INTO conflicts \
             (identity, local_kind, remote_kind, local_change, remote_change, detected_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.identity().as_str())
        .bind(record.local_change().kind().name())
        .bind(record.remote_change().kind().name())
        .bind(&local_change)
        .bind(&remote_change)
        .bind(record.detected_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(identity = %record.identity(), "Saved conflict");
        Ok(())
    }

    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<ConflictRecord>> {
        let row = sqlx::query("SELECT * FROM conflicts WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(conflict_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn list_open(&self) -> anyhow::Result<Vec<ConflictRecord>> {
        let rows = sqlx::query("SELECT * FROM conflicts ORDER BY detected_at ASC, identity ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(conflict_from_row(row)?);
        }
        Ok(records)
    }

    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM conflicts WHERE identity = ?")
            .bind(identity.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// SQLite-backed sync baseline
#[derive(Clone)]
pub struct SqliteBaselineStore {
    pool: SqlitePool,
}

impl SqliteBaselineStore {
    /// Creates a store over an already-migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IBaselineStore for SqliteBaselineStore {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<BaselineEntry>> {
        let row = sqlx::query("SELECT * FROM baselines WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(baseline_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<BaselineEntry>> {
        let rows = sqlx::query("SELECT * FROM baselines ORDER BY path ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(baseline_from_row(row)?);
        }
        Ok(entries)
    }

    async fn upsert(&self, entry: &BaselineEntry) -> anyhow::Result<()> {
        let snapshot = entry.snapshot();

        sqlx::query(
            "INSERT OR REPLACE INTO baselines \
             (identity, path, checksum, last_modified, synced_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.identity().as_str())
        .bind(entry.path())
        .bind(snapshot.checksum().as_str())
        .bind(snapshot.last_modified().to_rfc3339())
        .bind(entry.synced_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(identity = %entry.identity(), path = %entry.path(), "Baseline advanced");
        Ok(())
    }

    async fn remove(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM baselines WHERE identity = ?")
            .bind(identity.as_str())
            .execute(&self.pool)
            .await?;

        tracing::trace!(identity = %identity, "Baseline removed");
        Ok(())
    }
}

/// SQLite-backed identity reservations
///
/// `path` is unique, so `INSERT OR REPLACE` drops any older reservation
/// for the same path in the same statement.
#[derive(Clone)]
pub struct SqlitePendingIdentityStore {
    pool: SqlitePool,
}

impl SqlitePendingIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IPendingIdentityStore for SqlitePendingIdentityStore {
    async fn get(&self, identity: &FileIdentity) -> anyhow::Result<Option<PendingIdentity>> {
        let row = sqlx::query("SELECT * FROM pending_identities WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(pending_from_row).transpose()?)
    }

    async fn list(&self) -> anyhow::Result<Vec<PendingIdentity>> {
        let rows = sqlx::query("SELECT * FROM pending_identities ORDER BY path ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(pending_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn reserve(&self, pending: &PendingIdentity) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO pending_identities (identity, path, reserved_at) \
             VALUES (?, ?, ?)",
        )
        .bind(pending.identity().as_str())
        .bind(pending.path())
        .bind(pending.reserved_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(identity = %pending.identity(), path = %pending.path(), "Identity reserved");
        Ok(())
    }

    async fn release(&self, identity: &FileIdentity) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM pending_identities WHERE identity = ?")
            .bind(identity.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
