//! Coordinated mutations: schema DDL and metadata writes in one transaction.
//!
//! Every operation here follows the same protocol: begin a transaction,
//! perform table-manager DDL and registry writes in sequence, commit on
//! success. On any failure the transaction rolls back (dropping it is enough;
//! SQLite DDL is transactional) and the causing error propagates unchanged.
//! No partial content-type or partial field is ever left visible, and nothing
//! is retried.

use crate::model::{ContentType, Field, FieldSelection, Site};
use crate::service::ContentService;
use crate::validate::{SaveOutcome, ValidationIssue};
use sqlx::Row;
use strata_db::{classify_write_error, dynamic, introspect, DbError, Result, StrataDb};
use tracing::{debug, info, warn};

impl ContentService {
    /// Define (or destructively redefine) a content-type.
    ///
    /// A first create inserts the metadata row and materializes the entry
    /// data table. Calling it again for the same (site, handle) refreshes the
    /// existing metadata row in place and re-creates the table from scratch:
    /// previously added field columns, their metadata rows, and the field
    /// selection are all discarded. Use [`ContentService::save_content_type`]
    /// for non-destructive updates.
    ///
    /// Two creates racing on the same (site, handle) are decided by the
    /// store's uniqueness constraint; the loser gets [`DbError::Conflict`].
    pub async fn create_content_type(
        &self,
        site: &Site,
        mut content_type: ContentType,
    ) -> Result<SaveOutcome<ContentType>> {
        let issues = content_type.validate();
        if !issues.is_empty() {
            return Ok(SaveOutcome::Invalid {
                entity: content_type,
                issues,
            });
        }
        content_type.site_id = site.id;

        let mut tx = self.db.pool().begin().await?;

        let existing = sqlx::query(
            "SELECT id, uid, date_created FROM content_types WHERE site_id = ? AND handle = ?",
        )
        .bind(site.id)
        .bind(&content_type.handle)
        .fetch_optional(&mut *tx)
        .await?;

        let table =
            dynamic::create_entry_data_table(&mut *tx, &site.handle, &content_type.handle).await?;

        let now = StrataDb::now_millis();
        match existing {
            Some(row) => {
                let id: i64 = row.get("id");
                warn!(
                    site = %site.handle,
                    handle = %content_type.handle,
                    "Re-creating existing content-type; prior fields are discarded"
                );

                // The fresh table has no field columns, so the field metadata
                // and selection must go with it to keep the catalog in sync.
                sqlx::query("DELETE FROM content_type_fields WHERE content_type_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM fields WHERE content_type_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"UPDATE content_types
                       SET parent_id = ?, label = ?, url_format = ?, max_entries = ?,
                           sortable = ?, date_updated = ?
                       WHERE id = ?"#,
                )
                .bind(content_type.parent_id)
                .bind(&content_type.label)
                .bind(content_type.url_format.as_deref())
                .bind(content_type.max_entries)
                .bind(content_type.sortable)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                content_type.id = Some(id);
                content_type.uid = row.get("uid");
                content_type.date_created = row.get("date_created");
            }
            None => {
                let row = sqlx::query(
                    r#"INSERT INTO content_types
                       (site_id, parent_id, handle, label, url_format, max_entries,
                        sortable, date_created, date_updated, uid)
                       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                       RETURNING id"#,
                )
                .bind(site.id)
                .bind(content_type.parent_id)
                .bind(&content_type.handle)
                .bind(&content_type.label)
                .bind(content_type.url_format.as_deref())
                .bind(content_type.max_entries)
                .bind(content_type.sortable)
                .bind(now)
                .bind(now)
                .bind(&content_type.uid)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    classify_write_error(
                        e,
                        &format!(
                            "content-type {:?} on site {:?}",
                            content_type.handle, site.handle
                        ),
                    )
                })?;

                content_type.id = Some(row.get("id"));
                content_type.date_created = now;
            }
        }
        content_type.date_updated = now;

        tx.commit().await?;

        info!(
            site = %site.handle,
            handle = %content_type.handle,
            table = %table,
            "Content-type created"
        );
        Ok(SaveOutcome::Saved(content_type))
    }

    /// Add a field to a content-type: append its physical column, then insert
    /// its metadata row, in one transaction.
    ///
    /// A handle already used on this content-type comes back as a validation
    /// failure with the field unsaved. When `sort_order` is left at 0 the
    /// field is placed after the content-type's existing fields.
    pub async fn add_field(
        &self,
        site: &Site,
        content_type: &ContentType,
        mut field: Field,
    ) -> Result<SaveOutcome<Field>> {
        let issues = field.validate();
        if !issues.is_empty() {
            return Ok(SaveOutcome::Invalid {
                entity: field,
                issues,
            });
        }

        let content_type_id = content_type.id.ok_or_else(|| {
            DbError::invalid_state("content-type must be saved before fields are added")
        })?;
        field.content_type_id = Some(content_type_id);

        let table = dynamic::entry_data_table_name(&site.handle, &content_type.handle);
        let mut tx = self.db.pool().begin().await?;

        let taken = sqlx::query("SELECT id FROM fields WHERE content_type_id = ? AND handle = ?")
            .bind(content_type_id)
            .bind(&field.handle)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Ok(SaveOutcome::Invalid {
                issues: vec![ValidationIssue::new(
                    "handle",
                    "is already in use on this content-type",
                )],
                entity: field,
            });
        }

        let anchor =
            dynamic::add_field_column(&mut *tx, &table, &field.handle, field.field_type.column_type())
                .await?;

        if field.sort_order == 0 {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM fields WHERE content_type_id = ?")
                    .bind(content_type_id)
                    .fetch_one(&mut *tx)
                    .await?;
            field.sort_order = count + 1;
        }

        let now = StrataDb::now_millis();
        let row = sqlx::query(
            r#"INSERT INTO fields
               (content_type_id, handle, label, field_type, sort_order, instructions,
                required, date_created, date_updated, uid)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(content_type_id)
        .bind(&field.handle)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(field.sort_order)
        .bind(field.instructions.as_deref())
        .bind(field.required)
        .bind(now)
        .bind(now)
        .bind(&field.uid)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            classify_write_error(
                e,
                &format!(
                    "field {:?} on content-type {:?}",
                    field.handle, content_type.handle
                ),
            )
        })?;

        field.id = Some(row.get("id"));
        field.date_created = now;
        field.date_updated = now;

        tx.commit().await?;

        debug!(table = %table, column = %field.column_name(), after = %anchor, "Field column placed");
        info!(
            site = %site.handle,
            content_type = %content_type.handle,
            handle = %field.handle,
            "Field added"
        );
        Ok(SaveOutcome::Saved(field))
    }

    /// Save a content-type's metadata, and optionally replace its field
    /// selection, in one transaction.
    ///
    /// Only a genuinely new content-type triggers table creation; an update
    /// never touches the physical table. The handle names the physical table
    /// and is fixed at creation; updates do not change it. A selection list
    /// replaces the junction rows wholesale, persisting caller order as
    /// 1-based sort order.
    pub async fn save_content_type(
        &self,
        site: &Site,
        mut content_type: ContentType,
        selection: Option<&[FieldSelection]>,
    ) -> Result<SaveOutcome<ContentType>> {
        let issues = content_type.validate();
        if !issues.is_empty() {
            return Ok(SaveOutcome::Invalid {
                entity: content_type,
                issues,
            });
        }
        content_type.site_id = site.id;

        let mut tx = self.db.pool().begin().await?;
        let now = StrataDb::now_millis();
        let was_new = content_type.id.is_none();

        let content_type_id = match content_type.id {
            None => {
                let taken = sqlx::query(
                    "SELECT id FROM content_types WHERE site_id = ? AND handle = ?",
                )
                .bind(site.id)
                .bind(&content_type.handle)
                .fetch_optional(&mut *tx)
                .await?;
                if taken.is_some() {
                    return Ok(SaveOutcome::Invalid {
                        issues: vec![ValidationIssue::new(
                            "handle",
                            "is already in use on this site",
                        )],
                        entity: content_type,
                    });
                }

                dynamic::create_entry_data_table(&mut *tx, &site.handle, &content_type.handle)
                    .await?;

                let row = sqlx::query(
                    r#"INSERT INTO content_types
                       (site_id, parent_id, handle, label, url_format, max_entries,
                        sortable, date_created, date_updated, uid)
                       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                       RETURNING id"#,
                )
                .bind(site.id)
                .bind(content_type.parent_id)
                .bind(&content_type.handle)
                .bind(&content_type.label)
                .bind(content_type.url_format.as_deref())
                .bind(content_type.max_entries)
                .bind(content_type.sortable)
                .bind(now)
                .bind(now)
                .bind(&content_type.uid)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    classify_write_error(
                        e,
                        &format!(
                            "content-type {:?} on site {:?}",
                            content_type.handle, site.handle
                        ),
                    )
                })?;

                let id: i64 = row.get("id");
                content_type.id = Some(id);
                content_type.date_created = now;
                id
            }
            Some(id) => {
                let updated = sqlx::query(
                    r#"UPDATE content_types
                       SET parent_id = ?, label = ?, url_format = ?, max_entries = ?,
                           sortable = ?, date_updated = ?
                       WHERE id = ?
                       RETURNING date_created"#,
                )
                .bind(content_type.parent_id)
                .bind(&content_type.label)
                .bind(content_type.url_format.as_deref())
                .bind(content_type.max_entries)
                .bind(content_type.sortable)
                .bind(now)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

                match updated {
                    Some(row) => content_type.date_created = row.get("date_created"),
                    None => return Err(DbError::not_found(format!("content-type {id}"))),
                }
                id
            }
        };
        content_type.date_updated = now;

        if let Some(selection) = selection {
            if !was_new {
                sqlx::query("DELETE FROM content_type_fields WHERE content_type_id = ?")
                    .bind(content_type_id)
                    .execute(&mut *tx)
                    .await?;
            }
            for (index, item) in selection.iter().enumerate() {
                sqlx::query(
                    r#"INSERT INTO content_type_fields
                       (content_type_id, field_id, required, sort_order)
                       VALUES (?, ?, ?, ?)"#,
                )
                .bind(content_type_id)
                .bind(item.field_id)
                .bind(item.required)
                .bind(index as i64 + 1)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            site = %site.handle,
            handle = %content_type.handle,
            new = was_new,
            "Content-type saved"
        );
        Ok(SaveOutcome::Saved(content_type))
    }

    /// Delete a content-type, its fields, and its data table.
    ///
    /// Blocked while the data table still holds rows or the content-type
    /// still has entries or child content-types; nothing cascades into
    /// content.
    pub async fn delete_content_type(&self, site: &Site, content_type: &ContentType) -> Result<()> {
        let content_type_id = content_type
            .id
            .ok_or_else(|| DbError::invalid_state("content-type is not saved"))?;
        let table = dynamic::entry_data_table_name(&site.handle, &content_type.handle);

        let mut tx = self.db.pool().begin().await?;

        if introspect::table_exists(&mut *tx, &table).await? {
            let (rows,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&mut *tx)
                .await?;
            if rows > 0 {
                return Err(DbError::invalid_state(format!(
                    "content-type {:?} still has {rows} data rows",
                    content_type.handle
                )));
            }
        }

        let (children,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM content_types WHERE parent_id = ?")
                .bind(content_type_id)
                .fetch_one(&mut *tx)
                .await?;
        if children > 0 {
            return Err(DbError::invalid_state(format!(
                "content-type {:?} still has {children} child content-types",
                content_type.handle
            )));
        }

        let (entries,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM entries WHERE content_type_id = ?")
                .bind(content_type_id)
                .fetch_one(&mut *tx)
                .await?;
        if entries > 0 {
            return Err(DbError::invalid_state(format!(
                "content-type {:?} still has {entries} entries",
                content_type.handle
            )));
        }

        dynamic::drop_entry_data_table(&mut *tx, &table).await?;
        sqlx::query("DELETE FROM content_type_fields WHERE content_type_id = ?")
            .bind(content_type_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM fields WHERE content_type_id = ?")
            .bind(content_type_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM content_types WHERE id = ?")
            .bind(content_type_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(site = %site.handle, handle = %content_type.handle, "Content-type deleted");
        Ok(())
    }
}
