//! SQLite layer for Strata.
//!
//! This crate owns everything that touches the database file: the fixed
//! catalog schema (sites, content-type and field metadata, entries), live
//! schema introspection, and the dynamic per-content-type entry data tables.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata_db::{StrataDb, Result};
//!
//! let db = StrataDb::open("~/.strata/strata.sqlite3").await?;
//!
//! let mut tx = db.pool().begin().await?;
//! let table = strata_db::dynamic::create_entry_data_table(&mut *tx, "main", "blog").await?;
//! tx.commit().await?;
//! ```

mod catalog;
mod error;

pub mod dynamic;
pub mod ident;
pub mod introspect;

pub use error::{classify_write_error, DbError, Result};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the Strata database.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct StrataDb {
    pool: SqlitePool,
}

impl StrataDb {
    /// Open or create a database at the given path.
    ///
    /// Creates the catalog tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };

        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open a private in-memory database (for testing).
    ///
    /// The single pooled connection IS the database, so it is pinned and
    /// never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        Ok(db)
    }

    /// Get the underlying connection pool.
    ///
    /// Coordinated mutations begin their transactions here.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for in-flight connections to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl StrataDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("test.db");

        let db = StrataDb::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        db.close().await;
    }

    #[tokio::test]
    async fn test_in_memory_is_isolated() {
        let a = StrataDb::in_memory().await.unwrap();
        let b = StrataDb::in_memory().await.unwrap();

        sqlx::query("INSERT INTO sites (handle, name, date_created, date_updated, uid) VALUES ('main', 'Main', 0, 0, 'u1')")
            .execute(a.pool())
            .await
            .unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sites")
            .fetch_one(b.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[test]
    fn test_millis_round_trip() {
        let now = StrataDb::now_millis();
        assert!(now > 1_600_000_000_000);
        assert_eq!(StrataDb::millis_to_datetime(now).timestamp_millis(), now);
    }
}
