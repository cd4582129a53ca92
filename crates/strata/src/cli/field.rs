//! Field command - add fields to content-types and list them.

use crate::cli::error::{self, HelpfulError};
use crate::cli::{context, open_service, output};
use clap::Subcommand;
use std::path::Path;
use strata_content::{Field, FieldType, SaveOutcome};

/// Subcommands for field management
#[derive(Subcommand, Debug, Clone)]
pub enum FieldAction {
    /// Add a field to a content-type; its column is appended to the table
    Add {
        /// Content-type handle
        type_handle: String,
        /// Field handle (lowercase identifier)
        handle: String,
        /// Display label (defaults to the handle)
        #[arg(long)]
        label: Option<String>,
        /// Value type: text, integer, float, boolean, timestamp, json
        #[arg(long = "type", default_value = "text")]
        field_type: String,
        /// Require a value for this field
        #[arg(long)]
        required: bool,
        /// Author-facing instructions
        #[arg(long)]
        instructions: Option<String>,
        /// Explicit sort order (appended after existing fields when omitted)
        #[arg(long = "sort-order")]
        sort_order: Option<i64>,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// List fields of a content-type
    List {
        /// Content-type handle
        type_handle: String,
        #[arg(long)]
        json: bool,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
}

pub async fn run(db_path: &Path, action: FieldAction) -> anyhow::Result<()> {
    match action {
        FieldAction::Add {
            type_handle,
            handle,
            label,
            field_type,
            required,
            instructions,
            sort_order,
            site,
        } => {
            add(
                db_path,
                type_handle,
                handle,
                label,
                field_type,
                required,
                instructions,
                sort_order,
                site,
            )
            .await
        }
        FieldAction::List {
            type_handle,
            json,
            site,
        } => list(db_path, type_handle, json, site).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn add(
    db_path: &Path,
    type_handle: String,
    handle: String,
    label: Option<String>,
    field_type: String,
    required: bool,
    instructions: Option<String>,
    sort_order: Option<i64>,
    site: Option<String>,
) -> anyhow::Result<()> {
    let field_type = FieldType::parse(&field_type).map_err(|_| {
        HelpfulError::new(format!("Unknown field type: {:?}", field_type))
            .with_suggestion("FIX: use one of text, integer, float, boolean, timestamp, json")
    })?;

    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;
    let ct = service
        .content_type_by_handle(site.id, &type_handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&type_handle))?;

    let label = label.unwrap_or_else(|| handle.clone());
    let mut draft = Field::new(&handle, &label, field_type).with_required(required);
    if let Some(text) = instructions {
        draft = draft.with_instructions(text);
    }
    if let Some(order) = sort_order {
        draft = draft.with_sort_order(order);
    }

    match service.add_field(&site, &ct, draft).await? {
        SaveOutcome::Saved(field) => {
            println!(
                "Added field {:?} ({}) as column {}",
                field.handle,
                field.field_type.as_str(),
                field.column_name()
            );
            Ok(())
        }
        SaveOutcome::Invalid { issues, .. } => Err(error::validation_failed("Field", &issues).into()),
    }
}

async fn list(
    db_path: &Path,
    type_handle: String,
    json: bool,
    site: Option<String>,
) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;
    let ct = service
        .content_type_by_handle(site.id, &type_handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&type_handle))?;
    let ct_id = ct
        .id
        .ok_or_else(|| anyhow::anyhow!("content-type has no id"))?;

    let fields = service.fields_for_content_type(ct_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    if fields.is_empty() {
        println!("No fields on content-type {:?}.", ct.handle);
        println!("TRY: strata field add {} <handle>", ct.handle);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = fields
        .iter()
        .map(|field| {
            vec![
                field.id.map(|id| id.to_string()).unwrap_or_default(),
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
        &["ID", "HANDLE", "LABEL", "TYPE", "REQUIRED", "SORT", "COLUMN"],
        rows,
    );
    Ok(())
}
