//! Site store: the multi-tenancy scope for content-types and table names.

use crate::model::Site;
use crate::service::ContentService;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strata_db::ident::ensure_valid_handle;
use strata_db::{classify_write_error, Result, StrataDb};
use tracing::info;
use uuid::Uuid;

pub(crate) fn row_to_site(row: &SqliteRow) -> Site {
    Site {
        id: row.get("id"),
        handle: row.get("handle"),
        name: row.get("name"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
        uid: row.get("uid"),
    }
}

impl ContentService {
    /// Create a site. Handles are strict identifiers because they become part
    /// of physical table names.
    pub async fn create_site(&self, handle: &str, name: &str) -> Result<Site> {
        ensure_valid_handle("site handle", handle)?;

        let now = StrataDb::now_millis();
        let uid = Uuid::new_v4().to_string();

        let row = sqlx::query(
            r#"INSERT INTO sites (handle, name, date_created, date_updated, uid)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(handle)
        .bind(name)
        .bind(now)
        .bind(now)
        .bind(&uid)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| classify_write_error(e, &format!("site {handle:?}")))?;

        info!(handle = %handle, "Site created");

        Ok(Site {
            id: row.get("id"),
            handle: handle.to_string(),
            name: name.to_string(),
            date_created: now,
            date_updated: now,
            uid,
        })
    }

    /// Look up a site by its handle.
    pub async fn site_by_handle(&self, handle: &str) -> Result<Option<Site>> {
        let row = sqlx::query("SELECT * FROM sites WHERE handle = ?")
            .bind(handle)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_site))
    }

    /// All sites, oldest first.
    pub async fn sites(&self) -> Result<Vec<Site>> {
        let rows = sqlx::query("SELECT * FROM sites ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_site).collect())
    }
}
