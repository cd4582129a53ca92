//! Content-type command - create, inspect, and retire content-types.

use crate::cli::error::{self, HelpfulError};
use crate::cli::{context, open_service, output};
use clap::Subcommand;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use strata_content::{ContentType, DbError, FieldSelection, SaveOutcome};

/// Subcommands for content-type management
#[derive(Subcommand, Debug, Clone)]
pub enum TypeAction {
    /// Create a content-type and its entry-data table
    Create {
        /// Content-type handle (lowercase identifier)
        handle: String,
        /// Display label (defaults to the handle)
        #[arg(long)]
        label: Option<String>,
        /// Handle of the parent content-type, for nested types
        #[arg(long)]
        parent: Option<String>,
        /// URL-format template for entries of this type
        #[arg(long = "url-format")]
        url_format: Option<String>,
        /// Cap on the number of entries
        #[arg(long = "max-entries")]
        max_entries: Option<i64>,
        /// Allow manual entry ordering
        #[arg(long)]
        sortable: bool,
        /// Re-create an existing type, dropping its data table
        #[arg(long)]
        force: bool,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// List content-types of a site
    List {
        #[arg(long)]
        json: bool,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// Show one content-type with its fields and table layout
    Show {
        /// Content-type handle
        handle: String,
        #[arg(long)]
        json: bool,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// Replace the field selection; argument order becomes sort order
    Select {
        /// Content-type handle
        handle: String,
        /// Field handles in the desired order
        fields: Vec<String>,
        /// Field handles that should be required
        #[arg(long)]
        required: Vec<String>,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// Delete a content-type and drop its entry-data table
    Delete {
        /// Content-type handle
        handle: String,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
}

pub async fn run(db_path: &Path, action: TypeAction) -> anyhow::Result<()> {
    match action {
        TypeAction::Create {
            handle,
            label,
            parent,
            url_format,
            max_entries,
            sortable,
            force,
            site,
        } => {
            create(
                db_path,
                handle,
                label,
                parent,
                url_format,
                max_entries,
                sortable,
                force,
                site,
            )
            .await
        }
        TypeAction::List { json, site } => list(db_path, json, site).await,
        TypeAction::Show { handle, json, site } => show(db_path, handle, json, site).await,
        TypeAction::Select {
            handle,
            fields,
            required,
            site,
        } => select(db_path, handle, fields, required, site).await,
        TypeAction::Delete { handle, site } => delete(db_path, handle, site).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn create(
    db_path: &Path,
    handle: String,
    label: Option<String>,
    parent: Option<String>,
    url_format: Option<String>,
    max_entries: Option<i64>,
    sortable: bool,
    force: bool,
    site: Option<String>,
) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;

    let existing = service.content_type_by_handle(site.id, &handle).await?;
    if existing.is_some() && !force {
        return Err(HelpfulError::new(format!(
            "Content-type {:?} already exists on site {:?}",
            handle, site.handle
        ))
        .with_context(
            "Re-creating a content-type drops its entry-data table and \
             discards its fields",
        )
        .with_suggestion(format!(
            "TRY: strata type create {handle} --force (destructive)"
        ))
        .with_suggestion(format!("TRY: strata type show {handle}"))
        .into());
    }

    let label = label.unwrap_or_else(|| handle.clone());
    let mut draft = ContentType::new(site.id, &handle, &label);
    if let Some(parent_handle) = parent {
        let parent_type = service
            .content_type_by_handle(site.id, &parent_handle)
            .await?
            .ok_or_else(|| HelpfulError::content_type_not_found(&parent_handle))?;
        let parent_id = parent_type
            .id
            .ok_or_else(|| anyhow::anyhow!("parent content-type has no id"))?;
        draft = draft.with_parent(parent_id);
    }
    if let Some(fmt) = url_format {
        draft = draft.with_url_format(fmt);
    }
    if let Some(cap) = max_entries {
        draft = draft.with_max_entries(cap);
    }
    draft = draft.with_sortable(sortable);

    match service.create_content_type(&site, draft).await? {
        SaveOutcome::Saved(ct) => {
            let table = strata_db::dynamic::entry_data_table_name(&site.handle, &ct.handle);
            if existing.is_some() {
                println!("Re-created content-type {:?} (table {table})", ct.handle);
            } else {
                println!("Created content-type {:?} (table {table})", ct.handle);
            }
            println!("TRY: strata field add {} <handle>", ct.handle);
            Ok(())
        }
        SaveOutcome::Invalid { issues, .. } => {
            Err(error::validation_failed("Content-type", &issues).into())
        }
    }
}

async fn list(db_path: &Path, json: bool, site: Option<String>) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;
    let types = service.content_types_for_site(site.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    if types.is_empty() {
        println!("No content-types on site {:?}.", site.handle);
        println!("TRY: strata type create <handle>");
        return Ok(());
    }

    let handles_by_id: HashMap<i64, &str> = types
        .iter()
        .filter_map(|ct| ct.id.map(|id| (id, ct.handle.as_str())))
        .collect();

    let rows: Vec<Vec<String>> = types
        .iter()
        .map(|ct| {
            let parent = ct
                .parent_id
                .and_then(|id| handles_by_id.get(&id).copied())
                .unwrap_or("-");
            vec![
                ct.id.map(|id| id.to_string()).unwrap_or_default(),
                ct.handle.clone(),
                ct.label.clone(),
                parent.to_string(),
                strata_db::dynamic::entry_data_table_name(&site.handle, &ct.handle),
                output::format_timestamp(ct.date_created),
            ]
        })
        .collect();

    output::print_table(
        &["ID", "HANDLE", "LABEL", "PARENT", "TABLE", "CREATED"],
        rows,
    );
    Ok(())
}

async fn show(
    db_path: &Path,
    handle: String,
    json: bool,
    site: Option<String>,
) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;

    let ct = service
        .content_type_by_handle(site.id, &handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&handle))?;
    let ct_id = ct
        .id
        .ok_or_else(|| anyhow::anyhow!("content-type has no id"))?;

    let fields = service.fields_for_content_type(ct_id).await?;
    let selected = service.selected_fields(ct_id).await?;
    let table = strata_db::dynamic::entry_data_table_name(&site.handle, &ct.handle);

    let columns = {
        let mut conn = service.db().pool().acquire().await?;
        match strata_db::introspect::table_columns(&mut conn, &table).await {
            Ok(columns) => Some(columns),
            Err(DbError::TableMissing(_)) => None,
            Err(e) => return Err(e.into()),
        }
    };

    if json {
        let payload = serde_json::json!({
            "contentType": ct,
            "fields": fields,
            "selection": selected,
            "table": table,
            "columns": columns,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Content-type {:?} on site {:?}", ct.handle, site.handle);
    println!("  id:          {}", ct_id);
    println!("  label:       {}", ct.label);
    println!("  url format:  {}", output::display_opt(&ct.url_format));
    println!(
        "  max entries: {}",
        ct.max_entries
            .map(|cap| cap.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  sortable:    {}", output::display_bool(ct.sortable));
    println!("  uid:         {}", ct.uid);
    println!("  created:     {}", output::format_timestamp(ct.date_created));
    println!();

    if fields.is_empty() {
        println!("No fields yet.");
        println!("TRY: strata field add {} <handle>", ct.handle);
    } else {
        let rows: Vec<Vec<String>> = fields
            .iter()
            .map(|field| {
                vec![
                    field.handle.clone(),
                    field.label.clone(),
                    field.field_type.as_str().to_string(),
                    output::display_bool(field.required).to_string(),
                    field.sort_order.to_string(),
                    field.column_name(),
                ]
            })
            .collect();
        output::print_table(
            &["HANDLE", "LABEL", "TYPE", "REQUIRED", "SORT", "COLUMN"],
            rows,
        );
    }

    if !selected.is_empty() {
        println!();
        println!("Selection:");
        let rows: Vec<Vec<String>> = selected
            .iter()
            .map(|sel| {
                vec![
                    sel.sort_order.to_string(),
                    sel.field.handle.clone(),
                    output::display_bool(sel.required).to_string(),
                ]
            })
            .collect();
        output::print_table(&["ORDER", "FIELD", "REQUIRED"], rows);
    }

    println!();
    match columns {
        Some(columns) => println!("Table {table}: {}", columns.join(", ")),
        None => println!("Table {table} is missing."),
    }
    Ok(())
}

async fn select(
    db_path: &Path,
    handle: String,
    field_handles: Vec<String>,
    required: Vec<String>,
    site: Option<String>,
) -> anyhow::Result<()> {
    if field_handles.is_empty() {
        return Err(HelpfulError::new("No fields given")
            .with_suggestion(format!(
                "TRY: strata type select {handle} <field> [<field> ...]"
            ))
            .into());
    }

    let mut seen = HashSet::new();
    for field_handle in &field_handles {
        if !seen.insert(field_handle.as_str()) {
            return Err(HelpfulError::new(format!(
                "Field {:?} appears more than once in the selection",
                field_handle
            ))
            .into());
        }
    }

    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;

    let ct = service
        .content_type_by_handle(site.id, &handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&handle))?;
    let ct_id = ct
        .id
        .ok_or_else(|| anyhow::anyhow!("content-type has no id"))?;

    let mut selection = Vec::with_capacity(field_handles.len());
    for field_handle in &field_handles {
        let field = service
            .field_by_handle(ct_id, field_handle)
            .await?
            .ok_or_else(|| HelpfulError::field_not_found(&handle, field_handle))?;
        let field_id = field
            .id
            .ok_or_else(|| anyhow::anyhow!("field has no id"))?;
        selection.push(FieldSelection {
            field_id,
            required: required.contains(field_handle),
        });
    }

    match service
        .save_content_type(&site, ct, Some(&selection))
        .await?
    {
        SaveOutcome::Saved(ct) => {
            println!(
                "Selected {} field(s) on {:?}; order follows the argument order",
                selection.len(),
                ct.handle
            );
            Ok(())
        }
        SaveOutcome::Invalid { issues, .. } => {
            Err(error::validation_failed("Content-type", &issues).into())
        }
    }
}

async fn delete(db_path: &Path, handle: String, site: Option<String>) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;

    let ct = service
        .content_type_by_handle(site.id, &handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&handle))?;

    match service.delete_content_type(&site, &ct).await {
        Ok(()) => {
            println!("Deleted content-type {:?} and its table", handle);
            Ok(())
        }
        Err(DbError::InvalidState(reason)) => Err(HelpfulError::new(format!(
            "Cannot delete content-type {:?}",
            handle
        ))
        .with_context(reason)
        .with_suggestion("FIX: remove its entries and data rows first")
        .with_suggestion("FIX: delete or re-parent its child content-types")
        .into()),
        Err(e) => Err(e.into()),
    }
}
