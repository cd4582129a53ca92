//! Live schema introspection for dynamic entry data tables.
//!
//! Column sets change between calls (fields are added while the service
//! runs), so every probe here re-reads the live schema: statement caching is
//! disabled and nothing is memoized.

use crate::error::{DbError, Result};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

/// Prefix of every physical column backing a user-defined field.
pub const FIELD_COLUMN_PREFIX: &str = "field_";

/// Anchor returned by [`last_field_column`] when a table has no field columns
/// yet: the last system column a field column may follow.
pub const FIELD_ANCHOR_SENTINEL: &str = "version_id";

/// Check whether a physical table exists.
pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind(name)
        .persistent(false)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Column names of a table in physical order.
///
/// Fails with [`DbError::TableMissing`] if the table does not exist.
pub async fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    if !table_exists(&mut *conn, table).await? {
        return Err(DbError::table_missing(table));
    }

    let rows = sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .persistent(false)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect())
}

/// The column a newly added field column will follow: the last column whose
/// name carries the field prefix, or [`FIELD_ANCHOR_SENTINEL`] when the table
/// still holds only system columns.
///
/// Fails with [`DbError::TableMissing`] if the table does not exist.
pub async fn last_field_column(conn: &mut SqliteConnection, table: &str) -> Result<String> {
    let columns = table_columns(conn, table).await?;

    Ok(columns
        .iter()
        .rev()
        .find(|name| name.starts_with(FIELD_COLUMN_PREFIX))
        .cloned()
        .unwrap_or_else(|| FIELD_ANCHOR_SENTINEL.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrataDb;

    async fn scratch_table(db: &StrataDb) {
        sqlx::query(
            r#"CREATE TABLE scratch (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id INTEGER NOT NULL,
                version_id INTEGER NOT NULL,
                date_created INTEGER,
                date_updated INTEGER,
                uid TEXT UNIQUE
            )"#,
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn table_exists_distinguishes_tables() {
        let db = StrataDb::in_memory().await.unwrap();
        scratch_table(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(table_exists(&mut conn, "scratch").await.unwrap());
        assert!(!table_exists(&mut conn, "no_such_table").await.unwrap());
    }

    #[tokio::test]
    async fn columns_come_back_in_physical_order() {
        let db = StrataDb::in_memory().await.unwrap();
        scratch_table(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let columns = table_columns(&mut conn, "scratch").await.unwrap();
        assert_eq!(
            columns,
            vec![
                "id",
                "entry_id",
                "version_id",
                "date_created",
                "date_updated",
                "uid"
            ]
        );
    }

    #[tokio::test]
    async fn missing_table_is_an_introspection_error() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = table_columns(&mut conn, "no_such_table").await.unwrap_err();
        match err {
            DbError::TableMissing(name) => assert_eq!(name, "no_such_table"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn anchor_is_sentinel_until_fields_arrive() {
        let db = StrataDb::in_memory().await.unwrap();
        scratch_table(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert_eq!(
            last_field_column(&mut conn, "scratch").await.unwrap(),
            FIELD_ANCHOR_SENTINEL
        );

        sqlx::query("ALTER TABLE scratch ADD COLUMN field_title TEXT")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert_eq!(
            last_field_column(&mut conn, "scratch").await.unwrap(),
            "field_title"
        );

        sqlx::query("ALTER TABLE scratch ADD COLUMN field_summary TEXT")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert_eq!(
            last_field_column(&mut conn, "scratch").await.unwrap(),
            "field_summary"
        );
    }
}
