//! Entry command - create entries with versioned data rows and list them.

use crate::cli::error::HelpfulError;
use crate::cli::{context, open_service, output};
use clap::Subcommand;
use std::collections::HashMap;
use std::path::Path;
use strata_content::{DbError, Entry};

/// Subcommands for entry management
#[derive(Subcommand, Debug, Clone)]
pub enum EntryAction {
    /// Create an entry, its first version, and a data row
    Create {
        /// Content-type handle
        type_handle: String,
        /// Parent entry id, for nested entries
        #[arg(long)]
        parent: Option<i64>,
        /// Field value as handle=value; JSON values are parsed, the rest
        /// are stored as text (repeatable)
        #[arg(long = "set")]
        set: Vec<String>,
        /// Notes recorded on the version
        #[arg(long)]
        notes: Option<String>,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
    /// List entries of a content-type, or of the whole site
    List {
        /// Content-type handle (omit to list the whole site)
        type_handle: Option<String>,
        #[arg(long)]
        json: bool,
        /// Site handle (overrides the selected default)
        #[arg(long)]
        site: Option<String>,
    },
}

pub async fn run(db_path: &Path, action: EntryAction) -> anyhow::Result<()> {
    match action {
        EntryAction::Create {
            type_handle,
            parent,
            set,
            notes,
            site,
        } => create(db_path, type_handle, parent, set, notes, site).await,
        EntryAction::List {
            type_handle,
            json,
            site,
        } => list(db_path, type_handle, json, site).await,
    }
}

/// Split a `handle=value` pair; the value is parsed as JSON when possible
/// and falls back to a plain string otherwise.
fn parse_set_pair(raw: &str) -> Result<(String, serde_json::Value), HelpfulError> {
    let (handle, raw_value) = raw.split_once('=').ok_or_else(|| {
        HelpfulError::new(format!("Malformed --set value: {:?}", raw))
            .with_suggestion("FIX: use --set handle=value")
    })?;
    let handle = handle.trim();
    if handle.is_empty() {
        return Err(HelpfulError::new(format!("Malformed --set value: {:?}", raw))
            .with_context("The field handle before '=' is empty")
            .with_suggestion("FIX: use --set handle=value"));
    }

    let value = serde_json::from_str(raw_value)
        .unwrap_or_else(|_| serde_json::Value::String(raw_value.to_string()));
    Ok((handle.to_string(), value))
}

async fn create(
    db_path: &Path,
    type_handle: String,
    parent: Option<i64>,
    set: Vec<String>,
    notes: Option<String>,
    site: Option<String>,
) -> anyhow::Result<()> {
    let mut values = Vec::with_capacity(set.len());
    for raw in &set {
        values.push(parse_set_pair(raw)?);
    }

    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;
    let ct = service
        .content_type_by_handle(site.id, &type_handle)
        .await?
        .ok_or_else(|| HelpfulError::content_type_not_found(&type_handle))?;

    let entry = match service.create_entry(&ct, parent).await {
        Ok(entry) => entry,
        Err(DbError::InvalidState(reason)) => {
            return Err(HelpfulError::new(format!(
                "Cannot create an entry for {:?}",
                ct.handle
            ))
            .with_context(reason)
            .into());
        }
        Err(e) => return Err(e.into()),
    };
    let version = service.create_version(&entry, notes.as_deref()).await?;

    let row_id = match service
        .write_data_row(&site, &ct, &entry, &version, &values)
        .await
    {
        Ok(row_id) => row_id,
        Err(DbError::TableMissing(table)) => {
            return Err(HelpfulError::new(format!(
                "Entry-data table {:?} is missing",
                table
            ))
            .with_context("The entry and version were created but no data row was written")
            .with_suggestion(format!(
                "TRY: strata type create {} --force (destructive)",
                ct.handle
            ))
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Created entry {} (version {}, data row {})",
        entry.id, version.num, row_id
    );
    Ok(())
}

async fn list(
    db_path: &Path,
    type_handle: Option<String>,
    json: bool,
    site: Option<String>,
) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let site = context::resolve_site(&service, site.as_deref()).await?;

    let entries: Vec<Entry> = match &type_handle {
        Some(handle) => {
            let ct = service
                .content_type_by_handle(site.id, handle)
                .await?
                .ok_or_else(|| HelpfulError::content_type_not_found(handle))?;
            let ct_id = ct
                .id
                .ok_or_else(|| anyhow::anyhow!("content-type has no id"))?;
            service.entries_for_content_type(ct_id).await?
        }
        None => service.entries_for_site(site.id).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        match type_handle {
            Some(handle) => println!("No entries for content-type {:?}.", handle),
            None => println!("No entries on site {:?}.", site.handle),
        }
        println!("TRY: strata entry create <type>");
        return Ok(());
    }

    let types = service.content_types_for_site(site.id).await?;
    let type_handles: HashMap<i64, &str> = types
        .iter()
        .filter_map(|ct| ct.id.map(|id| (id, ct.handle.as_str())))
        .collect();

    let mut rows = Vec::with_capacity(entries.len());
    for entry in &entries {
        let latest = service.latest_version(entry.id).await?;
        rows.push(vec![
            entry.id.to_string(),
            type_handles
                .get(&entry.content_type_id)
                .copied()
                .unwrap_or("?")
                .to_string(),
            entry
                .parent_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            latest
                .map(|v| v.num.to_string())
                .unwrap_or_else(|| "-".to_string()),
            output::format_timestamp(entry.date_created),
        ]);
    }

    output::print_table(&["ID", "TYPE", "PARENT", "VERSION", "CREATED"], rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pairs_parse_json_and_fall_back_to_text() {
        let (handle, value) = parse_set_pair("views=7").unwrap();
        assert_eq!(handle, "views");
        assert_eq!(value, serde_json::json!(7));

        let (_, value) = parse_set_pair("title=hello world").unwrap();
        assert_eq!(value, serde_json::json!("hello world"));

        let (_, value) = parse_set_pair("published=true").unwrap();
        assert_eq!(value, serde_json::json!(true));

        let (_, value) = parse_set_pair("meta={\"tags\":[\"a\"]}").unwrap();
        assert_eq!(value, serde_json::json!({"tags": ["a"]}));

        // an explicit empty value stays an empty string
        let (_, value) = parse_set_pair("summary=").unwrap();
        assert_eq!(value, serde_json::json!(""));
    }

    #[test]
    fn malformed_set_pairs_are_rejected() {
        assert!(parse_set_pair("no_equals_sign").is_err());
        assert!(parse_set_pair("=missing_handle").is_err());
    }
}
