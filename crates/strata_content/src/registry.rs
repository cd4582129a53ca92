//! Registry reads: content-type and field metadata, independent of the
//! physical data tables.

use crate::model::{ContentType, Field, FieldType, SelectedField};
use crate::service::ContentService;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strata_db::Result;

pub(crate) fn row_to_content_type(row: &SqliteRow) -> ContentType {
    ContentType {
        id: Some(row.get("id")),
        site_id: row.get("site_id"),
        parent_id: row.get("parent_id"),
        handle: row.get("handle"),
        label: row.get("label"),
        url_format: row.get("url_format"),
        max_entries: row.get("max_entries"),
        sortable: row.get("sortable"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
        uid: row.get("uid"),
    }
}

pub(crate) fn row_to_field(row: &SqliteRow) -> Result<Field> {
    Ok(Field {
        id: Some(row.get("id")),
        content_type_id: Some(row.get("content_type_id")),
        handle: row.get("handle"),
        label: row.get("label"),
        field_type: FieldType::parse(row.get::<String, _>("field_type").as_str())?,
        sort_order: row.get("sort_order"),
        instructions: row.get("instructions"),
        required: row.get("required"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
        uid: row.get("uid"),
    })
}

impl ContentService {
    /// Look up a content-type by id.
    pub async fn content_type(&self, id: i64) -> Result<Option<ContentType>> {
        let row = sqlx::query("SELECT * FROM content_types WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_content_type))
    }

    /// Look up a content-type by handle within a site.
    pub async fn content_type_by_handle(
        &self,
        site_id: i64,
        handle: &str,
    ) -> Result<Option<ContentType>> {
        let row = sqlx::query("SELECT * FROM content_types WHERE site_id = ? AND handle = ?")
            .bind(site_id)
            .bind(handle)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_content_type))
    }

    /// All content-types of a site, ordered by handle.
    pub async fn content_types_for_site(&self, site_id: i64) -> Result<Vec<ContentType>> {
        let rows = sqlx::query("SELECT * FROM content_types WHERE site_id = ? ORDER BY handle")
            .bind(site_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_content_type).collect())
    }

    /// All content-types of a site matching any of the given handles.
    pub async fn content_types_by_handles(
        &self,
        site_id: i64,
        handles: &[String],
    ) -> Result<Vec<ContentType>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; handles.len()].join(", ");
        let sql = format!(
            "SELECT * FROM content_types WHERE site_id = ? AND handle IN ({placeholders}) ORDER BY handle"
        );

        let mut query = sqlx::query(&sql).bind(site_id);
        for handle in handles {
            query = query.bind(handle);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(row_to_content_type).collect())
    }

    /// Direct children of a content-type.
    pub async fn children_of(&self, parent_id: i64) -> Result<Vec<ContentType>> {
        let rows = sqlx::query("SELECT * FROM content_types WHERE parent_id = ? ORDER BY handle")
            .bind(parent_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.iter().map(row_to_content_type).collect())
    }

    /// Top-level content-types of a site (no parent).
    pub async fn roots_for_site(&self, site_id: i64) -> Result<Vec<ContentType>> {
        let rows = sqlx::query(
            "SELECT * FROM content_types WHERE site_id = ? AND parent_id IS NULL ORDER BY handle",
        )
        .bind(site_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.iter().map(row_to_content_type).collect())
    }

    /// All fields owned by a content-type, in sort order.
    pub async fn fields_for_content_type(&self, content_type_id: i64) -> Result<Vec<Field>> {
        let rows = sqlx::query(
            "SELECT * FROM fields WHERE content_type_id = ? ORDER BY sort_order, id",
        )
        .bind(content_type_id)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(row_to_field).collect()
    }

    /// Look up one field by handle within a content-type.
    pub async fn field_by_handle(
        &self,
        content_type_id: i64,
        handle: &str,
    ) -> Result<Option<Field>> {
        let row = sqlx::query("SELECT * FROM fields WHERE content_type_id = ? AND handle = ?")
            .bind(content_type_id)
            .bind(handle)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_field).transpose()
    }

    /// The content-type's field selection, in persisted (1-based) order.
    pub async fn selected_fields(&self, content_type_id: i64) -> Result<Vec<SelectedField>> {
        let rows = sqlx::query(
            r#"SELECT f.*, ctf.required AS selection_required, ctf.sort_order AS selection_order
               FROM content_type_fields ctf
               JOIN fields f ON f.id = ctf.field_id
               WHERE ctf.content_type_id = ?
               ORDER BY ctf.sort_order"#,
        )
        .bind(content_type_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SelectedField {
                    field: row_to_field(row)?,
                    required: row.get("selection_required"),
                    sort_order: row.get("selection_order"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ContentType, Site};
    use crate::service::ContentService;

    async fn saved_type(service: &ContentService, site: &Site, handle: &str) -> ContentType {
        service
            .create_content_type(site, ContentType::new(site.id, handle, handle.to_uppercase()))
            .await
            .unwrap()
            .saved()
            .expect("valid content type")
    }

    #[tokio::test]
    async fn lookups_by_id_and_handle() {
        let service = ContentService::in_memory().await.unwrap();
        let site = service.create_site("main", "Main").await.unwrap();

        let blog = saved_type(&service, &site, "blog").await;
        let blog_id = blog.id.unwrap();

        let by_id = service.content_type(blog_id).await.unwrap().unwrap();
        assert_eq!(by_id.handle, "blog");

        let by_handle = service
            .content_type_by_handle(site.id, "blog")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_handle.id, Some(blog_id));

        assert!(service
            .content_type_by_handle(site.id, "news")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn handle_lists_and_hierarchy() {
        let service = ContentService::in_memory().await.unwrap();
        let site = service.create_site("main", "Main").await.unwrap();

        let blog = saved_type(&service, &site, "blog").await;
        saved_type(&service, &site, "news").await;

        let child = ContentType::new(site.id, "comments", "Comments")
            .with_parent(blog.id.unwrap());
        service
            .create_content_type(&site, child)
            .await
            .unwrap()
            .saved()
            .expect("valid child");

        let picked = service
            .content_types_by_handles(
                site.id,
                &["news".to_string(), "blog".to_string(), "missing".to_string()],
            )
            .await
            .unwrap();
        let handles: Vec<&str> = picked.iter().map(|ct| ct.handle.as_str()).collect();
        assert_eq!(handles, vec!["blog", "news"]);

        let all = service.content_types_for_site(site.id).await.unwrap();
        let all_handles: Vec<&str> = all.iter().map(|ct| ct.handle.as_str()).collect();
        assert_eq!(all_handles, vec!["blog", "comments", "news"]);

        let roots = service.roots_for_site(site.id).await.unwrap();
        let root_handles: Vec<&str> = roots.iter().map(|ct| ct.handle.as_str()).collect();
        assert_eq!(root_handles, vec!["blog", "news"]);

        let children = service.children_of(blog.id.unwrap()).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].handle, "comments");
    }
}
