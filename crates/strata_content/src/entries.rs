//! Entries, their versions, and rows in the dynamic data tables.

use crate::model::{ContentType, Entry, EntryVersion, Site};
use crate::service::ContentService;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strata_db::ident::ensure_valid_handle;
use strata_db::introspect::FIELD_COLUMN_PREFIX;
use strata_db::{classify_write_error, dynamic, introspect, DbError, Result, StrataDb};
use tracing::{debug, info};
use uuid::Uuid;

pub(crate) fn row_to_entry(row: &SqliteRow) -> Entry {
    Entry {
        id: row.get("id"),
        content_type_id: row.get("content_type_id"),
        parent_id: row.get("parent_id"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
        uid: row.get("uid"),
    }
}

pub(crate) fn row_to_version(row: &SqliteRow) -> EntryVersion {
    EntryVersion {
        id: row.get("id"),
        entry_id: row.get("entry_id"),
        num: row.get("num"),
        notes: row.get("notes"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
        uid: row.get("uid"),
    }
}

impl ContentService {
    /// Create an entry under a content-type, optionally nested below a
    /// parent entry. Honors the content-type's `max_entries` cap.
    pub async fn create_entry(
        &self,
        content_type: &ContentType,
        parent_id: Option<i64>,
    ) -> Result<Entry> {
        let content_type_id = content_type.id.ok_or_else(|| {
            DbError::invalid_state("content-type must be saved before entries are created")
        })?;

        if let Some(cap) = content_type.max_entries {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM entries WHERE content_type_id = ?")
                    .bind(content_type_id)
                    .fetch_one(self.db.pool())
                    .await?;
            if count >= cap {
                return Err(DbError::invalid_state(format!(
                    "content-type {:?} is capped at {cap} entries",
                    content_type.handle
                )));
            }
        }

        let now = StrataDb::now_millis();
        let uid = Uuid::new_v4().to_string();
        let row = sqlx::query(
            r#"INSERT INTO entries (content_type_id, parent_id, date_created, date_updated, uid)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(content_type_id)
        .bind(parent_id)
        .bind(now)
        .bind(now)
        .bind(&uid)
        .fetch_one(self.db.pool())
        .await?;

        let entry = Entry {
            id: row.get("id"),
            content_type_id,
            parent_id,
            date_created: now,
            date_updated: now,
            uid,
        };
        info!(
            entry = entry.id,
            content_type = %content_type.handle,
            "Entry created"
        );
        Ok(entry)
    }

    /// Look up an entry by id.
    pub async fn entry(&self, id: i64) -> Result<Option<Entry>> {
        let row = sqlx::query("SELECT * FROM entries WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_entry))
    }

    /// All entries of one content-type, oldest first.
    pub async fn entries_for_content_type(&self, content_type_id: i64) -> Result<Vec<Entry>> {
        let rows = sqlx::query("SELECT * FROM entries WHERE content_type_id = ? ORDER BY id")
            .bind(content_type_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    /// All entries across a site's content-types, oldest first.
    pub async fn entries_for_site(&self, site_id: i64) -> Result<Vec<Entry>> {
        let rows = sqlx::query(
            r#"SELECT e.* FROM entries e
               JOIN content_types ct ON ct.id = e.content_type_id
               WHERE ct.site_id = ?
               ORDER BY e.id"#,
        )
        .bind(site_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    /// Direct children of an entry.
    pub async fn child_entries(&self, parent_id: i64) -> Result<Vec<Entry>> {
        let rows = sqlx::query("SELECT * FROM entries WHERE parent_id = ? ORDER BY id")
            .bind(parent_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    /// Whether an entry has at least one child.
    pub async fn entry_has_children(&self, entry_id: i64) -> Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM entries WHERE parent_id = ?)")
                .bind(entry_id)
                .fetch_one(self.db.pool())
                .await?;
        Ok(exists)
    }

    /// Create the next version of an entry. Numbers are 1-based and assigned
    /// in the insert itself, so two concurrent saves cannot share a number.
    pub async fn create_version(
        &self,
        entry: &Entry,
        notes: Option<&str>,
    ) -> Result<EntryVersion> {
        let now = StrataDb::now_millis();
        let uid = Uuid::new_v4().to_string();
        let row = sqlx::query(
            r#"INSERT INTO entry_versions (entry_id, num, notes, date_created, date_updated, uid)
               VALUES (
                   ?,
                   (SELECT COALESCE(MAX(num), 0) + 1 FROM entry_versions WHERE entry_id = ?),
                   ?, ?, ?, ?
               )
               RETURNING id, num"#,
        )
        .bind(entry.id)
        .bind(entry.id)
        .bind(notes)
        .bind(now)
        .bind(now)
        .bind(&uid)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| classify_write_error(e, &format!("version for entry {}", entry.id)))?;

        let version = EntryVersion {
            id: row.get("id"),
            entry_id: entry.id,
            num: row.get("num"),
            notes: notes.map(str::to_string),
            date_created: now,
            date_updated: now,
            uid,
        };
        debug!(entry = entry.id, num = version.num, "Entry version created");
        Ok(version)
    }

    /// Look up a version by id.
    pub async fn version(&self, id: i64) -> Result<Option<EntryVersion>> {
        let row = sqlx::query("SELECT * FROM entry_versions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_version))
    }

    /// All versions of an entry, in version order.
    pub async fn versions_for_entry(&self, entry_id: i64) -> Result<Vec<EntryVersion>> {
        let rows = sqlx::query("SELECT * FROM entry_versions WHERE entry_id = ? ORDER BY num")
            .bind(entry_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_version).collect())
    }

    /// The highest-numbered version of an entry, if any.
    pub async fn latest_version(&self, entry_id: i64) -> Result<Option<EntryVersion>> {
        let row = sqlx::query(
            "SELECT * FROM entry_versions WHERE entry_id = ? ORDER BY num DESC LIMIT 1",
        )
        .bind(entry_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.as_ref().map(row_to_version))
    }

    /// Write one row of field values into a content-type's data table.
    ///
    /// `values` pairs field handles with JSON values; each handle must match
    /// a field column that already exists on the table. The audit triggers
    /// stamp the row's timestamps. Returns the new row id.
    pub async fn write_data_row(
        &self,
        site: &Site,
        content_type: &ContentType,
        entry: &Entry,
        version: &EntryVersion,
        values: &[(String, serde_json::Value)],
    ) -> Result<i64> {
        ensure_valid_handle("site handle", &site.handle)?;
        ensure_valid_handle("content-type handle", &content_type.handle)?;
        for (handle, _) in values {
            ensure_valid_handle("field handle", handle)?;
        }
        let table = dynamic::entry_data_table_name(&site.handle, &content_type.handle);

        let mut conn = self.db.pool().acquire().await?;
        if !introspect::table_exists(&mut conn, &table).await? {
            return Err(DbError::table_missing(table));
        }

        let mut columns = String::from("entry_id, version_id, uid");
        let mut placeholders = String::from("?, ?, ?");
        for (handle, _) in values {
            columns.push_str(&format!(", {FIELD_COLUMN_PREFIX}{handle}"));
            placeholders.push_str(", ?");
        }
        let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders}) RETURNING id");

        let uid = Uuid::new_v4().to_string();
        let mut query = sqlx::query(&sql).bind(entry.id).bind(version.id).bind(&uid);
        for (_, value) in values {
            query = match value {
                serde_json::Value::Null => query.bind(None::<String>),
                serde_json::Value::Bool(b) => query.bind(*b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => query.bind(i),
                    None => query.bind(n.as_f64()),
                },
                serde_json::Value::String(s) => query.bind(s.as_str()),
                other => query.bind(other.to_string()),
            };
        }

        let row = query
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| classify_write_error(e, &format!("data row in {table}")))?;
        let id: i64 = row.get("id");

        debug!(table = %table, row = id, fields = values.len(), "Data row written");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, Field, FieldType, Site};

    async fn setup_blog() -> (ContentService, Site, ContentType) {
        let service = ContentService::in_memory().await.unwrap();
        let site = service.create_site("main", "Main").await.unwrap();
        let blog = service
            .create_content_type(&site, ContentType::new(site.id, "blog", "Blog"))
            .await
            .unwrap()
            .saved()
            .unwrap();
        service
            .add_field(&site, &blog, Field::new("title", "Title", FieldType::Text))
            .await
            .unwrap();
        service
            .add_field(&site, &blog, Field::new("views", "Views", FieldType::Integer))
            .await
            .unwrap();
        (service, site, blog)
    }

    #[tokio::test]
    async fn versions_number_sequentially_per_entry() {
        let (service, _site, blog) = setup_blog().await;
        let entry = service.create_entry(&blog, None).await.unwrap();
        let other = service.create_entry(&blog, None).await.unwrap();

        let v1 = service.create_version(&entry, Some("first")).await.unwrap();
        let v2 = service.create_version(&entry, None).await.unwrap();
        assert_eq!(v1.num, 1);
        assert_eq!(v2.num, 2);

        // Numbering is per entry, not global.
        let other_v1 = service.create_version(&other, None).await.unwrap();
        assert_eq!(other_v1.num, 1);

        let versions = service.versions_for_entry(entry.id).await.unwrap();
        let nums: Vec<i64> = versions.iter().map(|v| v.num).collect();
        assert_eq!(nums, vec![1, 2]);
        assert_eq!(versions[0].notes.as_deref(), Some("first"));

        let latest = service.latest_version(entry.id).await.unwrap().unwrap();
        assert_eq!(latest.id, v2.id);
    }

    #[tokio::test]
    async fn data_rows_hold_values_and_trigger_stamps() {
        let (service, site, blog) = setup_blog().await;
        let entry = service.create_entry(&blog, None).await.unwrap();
        let version = service.create_version(&entry, None).await.unwrap();

        let row_id = service
            .write_data_row(
                &site,
                &blog,
                &entry,
                &version,
                &[
                    ("title".to_string(), serde_json::json!("Hello world")),
                    ("views".to_string(), serde_json::json!(7)),
                ],
            )
            .await
            .unwrap();

        let row = sqlx::query("SELECT * FROM entrydata_main_blog WHERE id = ?")
            .bind(row_id)
            .fetch_one(service.db().pool())
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("field_title"), "Hello world");
        assert_eq!(row.get::<i64, _>("field_views"), 7);
        assert_eq!(row.get::<i64, _>("entry_id"), entry.id);
        assert_eq!(row.get::<i64, _>("version_id"), version.id);
        assert!(row.get::<i64, _>("date_created") > 0);
    }

    #[tokio::test]
    async fn write_data_row_requires_the_table() {
        let (service, site, blog) = setup_blog().await;
        let entry = service.create_entry(&blog, None).await.unwrap();
        let version = service.create_version(&entry, None).await.unwrap();

        sqlx::query("DROP TABLE entrydata_main_blog")
            .execute(service.db().pool())
            .await
            .unwrap();

        let err = service
            .write_data_row(&site, &blog, &entry, &version, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TableMissing(_)));
    }

    #[tokio::test]
    async fn entries_list_per_type_and_per_site() {
        let (service, site, blog) = setup_blog().await;
        let news = service
            .create_content_type(&site, ContentType::new(site.id, "news", "News"))
            .await
            .unwrap()
            .saved()
            .unwrap();

        service.create_entry(&blog, None).await.unwrap();
        service.create_entry(&news, None).await.unwrap();

        assert_eq!(
            service
                .entries_for_content_type(blog.id.unwrap())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(service.entries_for_site(site.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn entry_hierarchy_is_queryable() {
        let (service, _site, blog) = setup_blog().await;
        let parent = service.create_entry(&blog, None).await.unwrap();
        let child = service.create_entry(&blog, Some(parent.id)).await.unwrap();

        assert!(service.entry_has_children(parent.id).await.unwrap());
        assert!(!service.entry_has_children(child.id).await.unwrap());

        let children = service.child_entries(parent.id).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
        assert_eq!(children[0].parent_id, Some(parent.id));
    }

    #[tokio::test]
    async fn max_entries_caps_creation() {
        let service = ContentService::in_memory().await.unwrap();
        let site = service.create_site("main", "Main").await.unwrap();
        let capped = service
            .create_content_type(
                &site,
                ContentType::new(site.id, "about", "About").with_max_entries(1),
            )
            .await
            .unwrap()
            .saved()
            .unwrap();

        service.create_entry(&capped, None).await.unwrap();
        let err = service.create_entry(&capped, None).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));
    }
}
