//! Fixed catalog schema: sites, content-type and field metadata, entries.
//!
//! All CREATE TABLE statements for the catalog live here. Dynamic per
//! content-type tables are managed separately in [`crate::dynamic`].

use crate::error::Result;
use crate::StrataDb;
use tracing::info;

impl StrataDb {
    /// Ensure all catalog tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // Enable WAL mode for better concurrent access
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        self.create_site_tables().await?;
        self.create_registry_tables().await?;
        self.create_entry_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Create site tables (multi-tenancy scoping)
    async fn create_site_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                handle TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                date_created INTEGER NOT NULL,
                date_updated INTEGER NOT NULL,
                uid TEXT NOT NULL UNIQUE
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create registry tables (content-type and field metadata)
    async fn create_registry_tables(&self) -> Result<()> {
        // Content-types: one row per user-defined category, one dynamic
        // data table each. Handle is unique per site.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS content_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL REFERENCES sites(id),
                parent_id INTEGER REFERENCES content_types(id),
                handle TEXT NOT NULL,
                label TEXT NOT NULL,
                url_format TEXT,
                max_entries INTEGER,
                sortable INTEGER NOT NULL DEFAULT 0,
                date_created INTEGER NOT NULL,
                date_updated INTEGER NOT NULL,
                uid TEXT NOT NULL UNIQUE,
                UNIQUE (site_id, handle)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_types_site ON content_types(site_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_types_parent ON content_types(parent_id)",
        )
        .execute(&self.pool)
        .await?;

        // Fields: one row per user-defined attribute, one physical column
        // in the owning content-type's data table.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS fields (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type_id INTEGER NOT NULL REFERENCES content_types(id),
                handle TEXT NOT NULL,
                label TEXT NOT NULL,
                field_type TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                instructions TEXT,
                required INTEGER NOT NULL DEFAULT 0,
                date_created INTEGER NOT NULL,
                date_updated INTEGER NOT NULL,
                uid TEXT NOT NULL UNIQUE,
                UNIQUE (content_type_id, handle)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_fields_content_type ON fields(content_type_id)",
        )
        .execute(&self.pool)
        .await?;

        // Field selection junction. Replaced wholesale on content-type save;
        // sort_order is 1-based caller order.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS content_type_fields (
                content_type_id INTEGER NOT NULL REFERENCES content_types(id),
                field_id INTEGER NOT NULL REFERENCES fields(id),
                required INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL,
                PRIMARY KEY (content_type_id, field_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create entry tables (content records and their versions)
    async fn create_entry_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type_id INTEGER NOT NULL REFERENCES content_types(id),
                parent_id INTEGER REFERENCES entries(id),
                date_created INTEGER NOT NULL,
                date_updated INTEGER NOT NULL,
                uid TEXT NOT NULL UNIQUE
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_entries_content_type ON entries(content_type_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_parent ON entries(parent_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS entry_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id INTEGER NOT NULL REFERENCES entries(id),
                num INTEGER NOT NULL DEFAULT 1,
                notes TEXT,
                date_created INTEGER NOT NULL,
                date_updated INTEGER NOT NULL,
                uid TEXT NOT NULL UNIQUE,
                UNIQUE (entry_id, num)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_entry_versions_entry ON entry_versions(entry_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
