//! Conflicts command - list and resolve open conflicts

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use gdsync_cache::{DatabasePool, SqliteConflictStore};
use gdsync_conflict::{ConflictRegister, RegisterError};
use gdsync_core::domain::{ConflictRecord, FileIdentity};

use super::expand_tilde;
use crate::output::{Output, OutputFormat};
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum ConflictsCommand {
    /// List open conflicts, oldest first
    List,
    /// Mark the conflict for a file as resolved
    Resolve {
        /// Drive file ID of the conflicted file
        identity: String,
    },
}

impl ConflictsCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let out = Output::new(format);
        let db_path = expand_tilde(&ctx.config.sync.state_db);

        let Some(register) = open_register(&db_path, &out).await? else {
            return Ok(());
        };

        match self {
            ConflictsCommand::List => list(&register, &out).await,
            ConflictsCommand::Resolve { identity } => resolve(&register, identity, &out).await,
        }
    }
}

/// Opens the register, or reports that no state exists yet
async fn open_register(db_path: &Path, out: &Output) -> Result<Option<ConflictRegister>> {
    if !db_path.exists() {
        out.error(&format!(
            "No state database at {}. Run 'gdsync sync' first.",
            db_path.display()
        ));
        return Ok(None);
    }

    let pool = DatabasePool::new(db_path)
        .await
        .context("Failed to open state database")?;
    let store = SqliteConflictStore::new(pool.pool().clone());
    Ok(Some(ConflictRegister::new(Arc::new(store))))
}

async fn list(register: &ConflictRegister, out: &Output) -> Result<()> {
    let records = register.list_open().await?;

    if out.is_json() {
        out.document(&serde_json::json!({ "conflicts": records }))?;
        return Ok(());
    }

    if records.is_empty() {
        out.success("No open conflicts");
        return Ok(());
    }

    out.success(&format!("{} open conflict(s)", records.len()));
    for record in &records {
        out.detail(&describe(record));
    }
    Ok(())
}

async fn resolve(register: &ConflictRegister, identity: &str, out: &Output) -> Result<()> {
    let identity = FileIdentity::new(identity).context("Invalid file identity")?;

    match register.resolve(&identity).await {
        Ok(()) => {
            if out.is_json() {
                out.document(&serde_json::json!({
                    "resolved": identity.as_str(),
                }))?;
            } else {
                out.success(&format!("Resolved conflict for {}", identity));
            }
            Ok(())
        }
        Err(RegisterError::NotFound(identity)) => {
            out.error(&format!("No open conflict for {}", identity));
            anyhow::bail!("no open conflict for {}", identity)
        }
        Err(err) => Err(err.into()),
    }
}

/// One-line summary of a record
fn describe(record: &ConflictRecord) -> String {
    let path = record
        .local_change()
        .snapshot()
        .path()
        .or_else(|| record.remote_change().snapshot().path())
        .unwrap_or("-");
    format!(
        "{}  {}  local {} / remote {}  (since {})",
        truncate_id(record.identity().as_str()),
        path,
        record.local_change().kind(),
        record.remote_change().kind(),
        record.detected_at().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Shortens long Drive IDs for display
fn truncate_id(id: &str) -> String {
    if id.chars().count() > 12 {
        let head: String = id.chars().take(12).collect();
        format!("{head}...")
    } else {
        id.to_string()
    }
}
