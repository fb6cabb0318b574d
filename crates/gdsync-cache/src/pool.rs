//! State database connections
//!
//! File databases run in WAL mode so scans reading the baseline never block
//! workers committing to it. The schema is applied on every open; all
//! statements are `IF NOT EXISTS`.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const MIGRATIONS: [(&str, &str); 2] = [
    ("initial", include_str!("migrations/20261019_initial.sql")),
    ("pending_identities", include_str!("migrations/20261020_pending_identities.sql")),
];

const FILE_CONNECTIONS: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated SQLite pool holding gdsync state
///
/// An in-memory database is private to its connection, so the in-memory
/// pool is limited to one.
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and its directory
    /// when missing
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` when the file cannot be created or
    /// opened, `CacheError::MigrationFailed` when the schema cannot be applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("{}: {}", dir.display(), e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("{}: {}", db_path.display(), e)))?;

        migrate(&pool).await?;
        tracing::info!(path = %db_path.display(), "State database opened");

        Ok(Self { pool })
    }

    /// Opens a private in-memory database, for tests and dry experiments
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("in-memory: {e}")))?;

        migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn migrate(pool: &SqlitePool) -> Result<(), CacheError> {
    for (name, sql) in MIGRATIONS {
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("{name}: {e}")))?;
    }
    tracing::debug!("State schema applied");
    Ok(())
}
