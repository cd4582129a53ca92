//! Site command - manage sites and the default-site selection.

use crate::cli::error::HelpfulError;
use crate::cli::{context, open_service, output};
use clap::Subcommand;
use std::path::Path;
use strata_content::DbError;

/// Subcommands for site management
#[derive(Subcommand, Debug, Clone)]
pub enum SiteAction {
    /// Create a new site
    Add {
        /// Site handle (lowercase identifier)
        handle: String,
        /// Human-readable name (defaults to the handle)
        #[arg(long)]
        name: Option<String>,
        /// Also select the new site as the default
        #[arg(long = "use")]
        select: bool,
    },
    /// List all sites
    List {
        #[arg(long)]
        json: bool,
    },
    /// Select the default site for content commands
    Use {
        /// Site handle (omit with --clear)
        handle: Option<String>,
        /// Clear the selection instead
        #[arg(long)]
        clear: bool,
    },
}

pub async fn run(db_path: &Path, action: SiteAction) -> anyhow::Result<()> {
    match action {
        SiteAction::Add {
            handle,
            name,
            select,
        } => add(db_path, handle, name, select).await,
        SiteAction::List { json } => list(db_path, json).await,
        SiteAction::Use { handle, clear } => use_site(db_path, handle, clear).await,
    }
}

async fn add(
    db_path: &Path,
    handle: String,
    name: Option<String>,
    select: bool,
) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let name = name.unwrap_or_else(|| handle.clone());

    let site = match service.create_site(&handle, &name).await {
        Ok(site) => site,
        Err(DbError::Conflict(_)) => {
            return Err(HelpfulError::new(format!("Site {:?} already exists", handle))
                .with_suggestion(format!("TRY: strata site use {handle}"))
                .into());
        }
        Err(DbError::InvalidIdentifier(reason)) => {
            return Err(HelpfulError::new(format!("Invalid site handle: {}", reason))
                .with_context(
                    "Handles start with a lowercase letter and contain only \
                     lowercase letters, digits, and underscores",
                )
                .into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Created site {:?} (id {})", site.handle, site.id);
    if select {
        context::set_default_site(&site.handle)?;
        println!("Selected {:?} as the default site", site.handle);
    }
    Ok(())
}

async fn list(db_path: &Path, json: bool) -> anyhow::Result<()> {
    let service = open_service(db_path).await?;
    let sites = service.sites().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sites)?);
        return Ok(());
    }

    if sites.is_empty() {
        println!("No sites yet.");
        println!("TRY: strata site add <handle>");
        return Ok(());
    }

    let current = context::get_default_site()?;
    let rows: Vec<Vec<String>> = sites
        .iter()
        .map(|site| {
            let marker = if current.as_deref() == Some(site.handle.as_str()) {
                "*".to_string()
            } else {
                String::new()
            };
            vec![
                marker,
                site.id.to_string(),
                site.handle.clone(),
                site.name.clone(),
                output::format_timestamp(site.date_created),
            ]
        })
        .collect();

    output::print_table(&["", "ID", "HANDLE", "NAME", "CREATED"], rows);
    Ok(())
}

async fn use_site(db_path: &Path, handle: Option<String>, clear: bool) -> anyhow::Result<()> {
    if clear {
        context::clear_default_site()?;
        println!("Cleared the default site");
        return Ok(());
    }

    let handle = handle.ok_or_else(|| {
        HelpfulError::new("Missing site handle")
            .with_suggestion("TRY: strata site use <handle>")
            .with_suggestion("TRY: strata site use --clear")
    })?;

    let service = open_service(db_path).await?;
    let site = service
        .site_by_handle(&handle)
        .await?
        .ok_or_else(|| HelpfulError::site_not_found(&handle))?;

    context::set_default_site(&site.handle)?;
    println!("Switched to site {:?}", site.handle);
    Ok(())
}
