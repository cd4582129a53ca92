//! Dynamic entry data tables: one physical table per content-type.
//!
//! Every operation here takes a `&mut SqliteConnection` so it composes into
//! the caller's transaction; a failed DDL step aborts the whole coordinated
//! mutation, and SQLite's transactional DDL rolls the table state back with
//! the metadata. Nothing here retries.

use crate::error::{DbError, Result};
use crate::ident::ensure_valid_handle;
use crate::introspect;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, warn};

/// Prefix of every dynamic entry data table.
pub const TABLE_PREFIX: &str = "entrydata_";

/// Fixed system columns of every entry data table, in physical order.
/// User-defined field columns are appended after these.
pub const SYSTEM_COLUMNS: [&str; 6] = [
    "id",
    "entry_id",
    "version_id",
    "date_created",
    "date_updated",
    "uid",
];

/// Physical column type a field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// SQLite type name used in DDL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
        }
    }
}

/// Physical table name for one (site, content-type) pair.
///
/// Pure and deterministic: same handles, same name, always lower-cased.
pub fn entry_data_table_name(site_handle: &str, type_handle: &str) -> String {
    format!("{TABLE_PREFIX}{site_handle}_{type_handle}").to_lowercase()
}

fn ensure_entry_data_table_name(table: &str) -> Result<()> {
    let well_formed = table.starts_with(TABLE_PREFIX)
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(DbError::invalid_identifier(format!(
            "{table:?} is not an entry data table name"
        )))
    }
}

/// Create the entry data table for a (site, content-type) pair.
///
/// If a table of the computed name already exists it is dropped first:
/// re-create semantics are destructive and idempotent, and belong to the
/// content-type creation path only, never to updates. The fresh table gets
/// the six system columns, foreign keys to `entries` and `entry_versions`
/// (NO ACTION both ways, integrity without cascade), and the audit triggers.
///
/// Returns the table name.
pub async fn create_entry_data_table(
    conn: &mut SqliteConnection,
    site_handle: &str,
    type_handle: &str,
) -> Result<String> {
    ensure_valid_handle("site handle", site_handle)?;
    ensure_valid_handle("content-type handle", type_handle)?;
    let table = entry_data_table_name(site_handle, type_handle);

    if introspect::table_exists(&mut *conn, &table).await? {
        warn!(table = %table, "Dropping existing entry data table for re-create");
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query(&format!(
        r#"CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            version_id INTEGER NOT NULL,
            date_created INTEGER,
            date_updated INTEGER,
            uid TEXT UNIQUE,
            CONSTRAINT {table}_entries_fk
                FOREIGN KEY (entry_id) REFERENCES entries (id)
                ON DELETE NO ACTION ON UPDATE NO ACTION,
            CONSTRAINT {table}_entry_versions_fk
                FOREIGN KEY (version_id) REFERENCES entry_versions (id)
                ON DELETE NO ACTION ON UPDATE NO ACTION
        )"#
    ))
    .execute(&mut *conn)
    .await?;

    install_insert_audit_trigger(&mut *conn, &table).await?;
    install_update_audit_trigger(&mut *conn, &table).await?;

    debug!(table = %table, "Entry data table created");
    Ok(table)
}

/// Append the physical column for a field.
///
/// Looks up the current anchor via [`introspect::last_field_column`] (which
/// also gates on table existence), then adds `field_<handle>`. SQLite appends
/// new columns at the physical end, so every field column lands after all
/// system columns and all previously added field columns.
///
/// Returns the anchor column the new column follows.
pub async fn add_field_column(
    conn: &mut SqliteConnection,
    table: &str,
    field_handle: &str,
    column_type: ColumnType,
) -> Result<String> {
    ensure_entry_data_table_name(table)?;
    ensure_valid_handle("field handle", field_handle)?;

    let anchor = introspect::last_field_column(&mut *conn, table).await?;
    let column = format!("{}{field_handle}", introspect::FIELD_COLUMN_PREFIX);

    sqlx::query(&format!(
        "ALTER TABLE {table} ADD COLUMN {column} {}",
        column_type.as_sql()
    ))
    .execute(&mut *conn)
    .await?;

    debug!(table = %table, column = %column, after = %anchor, "Field column added");
    Ok(anchor)
}

/// Drop an entry data table (content-type deletion path).
pub async fn drop_entry_data_table(conn: &mut SqliteConnection, table: &str) -> Result<()> {
    ensure_entry_data_table_name(table)?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(&mut *conn)
        .await?;
    debug!(table = %table, "Entry data table dropped");
    Ok(())
}

/// Install the insert audit trigger: stamps `date_created` and `date_updated`
/// with epoch milliseconds on every insert.
pub async fn install_insert_audit_trigger(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<()> {
    sqlx::query(&format!(
        r#"CREATE TRIGGER {table}_insert_audit AFTER INSERT ON {table}
        FOR EACH ROW
        BEGIN
            UPDATE {table}
            SET date_created = CAST(strftime('%s', 'now') AS INTEGER) * 1000,
                date_updated = CAST(strftime('%s', 'now') AS INTEGER) * 1000
            WHERE id = NEW.id;
        END"#
    ))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Install the update audit trigger: stamps `date_updated` on every update.
pub async fn install_update_audit_trigger(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<()> {
    sqlx::query(&format!(
        r#"CREATE TRIGGER {table}_update_audit AFTER UPDATE ON {table}
        FOR EACH ROW
        BEGIN
            UPDATE {table}
            SET date_updated = CAST(strftime('%s', 'now') AS INTEGER) * 1000
            WHERE id = NEW.id;
        END"#
    ))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrataDb;
    use sqlx::Row;

    /// Seed one site, content-type, entry, and version so inserts into a
    /// dynamic table satisfy its foreign keys.
    async fn seed_catalog(db: &StrataDb) -> (i64, i64) {
        let now = StrataDb::now_millis();
        sqlx::query(
            "INSERT INTO sites (handle, name, date_created, date_updated, uid)
             VALUES ('main', 'Main', ?, ?, 'site-uid')",
        )
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO content_types (site_id, handle, label, date_created, date_updated, uid)
             VALUES (1, 'blog', 'Blog', ?, ?, 'type-uid')",
        )
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        let entry_id = sqlx::query(
            "INSERT INTO entries (content_type_id, date_created, date_updated, uid)
             VALUES (1, ?, ?, 'entry-uid') RETURNING id",
        )
        .bind(now)
        .bind(now)
        .fetch_one(db.pool())
        .await
        .unwrap()
        .get::<i64, _>("id");
        let version_id = sqlx::query(
            "INSERT INTO entry_versions (entry_id, num, date_created, date_updated, uid)
             VALUES (?, 1, ?, ?, 'version-uid') RETURNING id",
        )
        .bind(entry_id)
        .bind(now)
        .bind(now)
        .fetch_one(db.pool())
        .await
        .unwrap()
        .get::<i64, _>("id");
        (entry_id, version_id)
    }

    #[test]
    fn table_name_is_deterministic_and_lowercase() {
        assert_eq!(entry_data_table_name("main", "blog"), "entrydata_main_blog");
        assert_eq!(
            entry_data_table_name("main", "blog"),
            entry_data_table_name("main", "blog")
        );
        assert_eq!(entry_data_table_name("Main", "Blog"), "entrydata_main_blog");
    }

    #[tokio::test]
    async fn fresh_table_has_exactly_the_system_columns() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let table = create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();
        assert_eq!(table, "entrydata_main_blog");

        let columns = introspect::table_columns(&mut conn, &table).await.unwrap();
        assert_eq!(columns, SYSTEM_COLUMNS.to_vec());
    }

    #[tokio::test]
    async fn field_columns_append_in_order() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let table = create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();

        let anchor = add_field_column(&mut conn, &table, "title", ColumnType::Text)
            .await
            .unwrap();
        assert_eq!(anchor, introspect::FIELD_ANCHOR_SENTINEL);
        let columns = introspect::table_columns(&mut conn, &table).await.unwrap();
        assert_eq!(columns.len(), 7);
        assert_eq!(columns.last().unwrap(), "field_title");

        let anchor = add_field_column(&mut conn, &table, "summary", ColumnType::Text)
            .await
            .unwrap();
        assert_eq!(anchor, "field_title");
        let columns = introspect::table_columns(&mut conn, &table).await.unwrap();
        assert_eq!(columns.len(), 8);
        assert_eq!(columns[6], "field_title");
        assert_eq!(columns[7], "field_summary");
    }

    #[tokio::test]
    async fn recreate_discards_previous_columns() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let table = create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();
        add_field_column(&mut conn, &table, "title", ColumnType::Text)
            .await
            .unwrap();
        add_field_column(&mut conn, &table, "summary", ColumnType::Text)
            .await
            .unwrap();

        create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();
        let columns = introspect::table_columns(&mut conn, &table).await.unwrap();
        assert_eq!(columns, SYSTEM_COLUMNS.to_vec());
    }

    #[tokio::test]
    async fn audit_triggers_stamp_timestamps() {
        let db = StrataDb::in_memory().await.unwrap();
        let (entry_id, version_id) = seed_catalog(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let table = create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();
        add_field_column(&mut conn, &table, "title", ColumnType::Text)
            .await
            .unwrap();

        sqlx::query(&format!(
            "INSERT INTO {table} (entry_id, version_id, uid, field_title) VALUES (?, ?, 'row-uid', 'Hello')"
        ))
        .bind(entry_id)
        .bind(version_id)
        .execute(&mut *conn)
        .await
        .unwrap();

        let row = sqlx::query(&format!(
            "SELECT date_created, date_updated FROM {table} WHERE uid = 'row-uid'"
        ))
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        let created: i64 = row.get("date_created");
        let updated: i64 = row.get("date_updated");
        assert!(created > 0);
        assert_eq!(created, updated);

        sqlx::query(&format!(
            "UPDATE {table} SET field_title = 'Hello again' WHERE uid = 'row-uid'"
        ))
        .execute(&mut *conn)
        .await
        .unwrap();

        let row = sqlx::query(&format!(
            "SELECT date_created, date_updated FROM {table} WHERE uid = 'row-uid'"
        ))
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        let created_after: i64 = row.get("date_created");
        let updated_after: i64 = row.get("date_updated");
        assert_eq!(created_after, created);
        assert!(updated_after >= created);
    }

    #[tokio::test]
    async fn ddl_rolls_back_with_the_transaction() {
        let db = StrataDb::in_memory().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        create_entry_data_table(&mut *tx, "main", "blog")
            .await
            .unwrap();
        drop(tx); // rollback

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!introspect::table_exists(&mut conn, "entrydata_main_blog")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn add_field_column_requires_the_table() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = add_field_column(&mut conn, "entrydata_main_blog", "title", ColumnType::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TableMissing(_)));
    }

    #[tokio::test]
    async fn rejects_handles_that_are_not_identifiers() {
        let db = StrataDb::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = create_entry_data_table(&mut conn, "main", "Blog Posts")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));

        let table = create_entry_data_table(&mut conn, "main", "blog")
            .await
            .unwrap();
        let err = add_field_column(&mut conn, &table, "bad;col", ColumnType::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));
    }
}
