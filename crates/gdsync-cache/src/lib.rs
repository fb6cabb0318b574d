//! gdsync Cache - SQLite state for gdsync
//!
//! One database file holds the two pieces of state that outlive a pass:
//! the open conflicts (`IConflictStore`), the sync baseline, the last
//! snapshot both sides agreed on for each file (`IBaselineStore`), and the
//! identities reserved for new files until they reach the baseline
//! (`IPendingIdentityStore`).
//!
//! ```no_run
//! use std::path::Path;
//! use gdsync_cache::{DatabasePool, SqliteBaselineStore, SqliteConflictStore};
//!
//! # async fn open() -> anyhow::Result<()> {
//! let db = DatabasePool::new(Path::new("/var/lib/gdsync/state.db")).await?;
//! let conflicts = SqliteConflictStore::new(db.pool().clone());
//! let baseline = SqliteBaselineStore::new(db.pool().clone());
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::{SqliteBaselineStore, SqliteConflictStore, SqlitePendingIdentityStore};

/// State database failures
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cannot open state database: {0}")]
    ConnectionFailed(String),

    #[error("state query failed: {0}")]
    QueryFailed(String),

    #[error("cannot apply schema: {0}")]
    MigrationFailed(String),

    /// A stored row could not be turned back into a domain value
    #[error("corrupt state row: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

impl From<gdsync_core::domain::DomainError> for CacheError {
    fn from(err: gdsync_core::domain::DomainError) -> Self {
        Self::SerializationError(err.to_string())
    }
}
