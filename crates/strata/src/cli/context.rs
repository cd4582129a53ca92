//! CLI context management.
//!
//! Provides kubectl-style context switching for sites. The context is stored
//! in `<strata home>/context.toml` and names the site that commands operate
//! on by default.

use crate::cli::config;
use crate::cli::error::HelpfulError;
use std::path::{Path, PathBuf};
use strata_content::{ContentService, Site};

/// Context configuration
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Context {
    /// Pinned database path; the --database flag still wins over this.
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub site: Option<SiteContext>,
}

/// Site context
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SiteContext {
    pub handle: String,
}

fn read_context(path: &Path) -> anyhow::Result<Context> {
    if !path.exists() {
        return Ok(Context::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read context file {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse context file {}: {}. Delete this file to reset.",
            path.display(),
            e
        )
    })
}

fn write_context(path: &Path, context: &Context) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(context)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Get the default site handle from the context file
pub fn get_default_site() -> anyhow::Result<Option<String>> {
    let context = read_context(&config::context_file_path())?;
    Ok(context.site.map(|s| s.handle))
}

/// Set the default site in the context file
pub fn set_default_site(handle: &str) -> anyhow::Result<()> {
    let path = config::context_file_path();
    let mut context = read_context(&path)?;
    context.site = Some(SiteContext {
        handle: handle.to_string(),
    });
    write_context(&path, &context)
}

/// Clear the default site from the context file
pub fn clear_default_site() -> anyhow::Result<()> {
    let path = config::context_file_path();
    if !path.exists() {
        return Ok(());
    }
    let mut context = read_context(&path)?;
    context.site = None;
    write_context(&path, &context)
}

/// Get the pinned database path from the context file
pub fn stored_database_path() -> anyhow::Result<Option<PathBuf>> {
    let context = read_context(&config::context_file_path())?;
    Ok(context.database)
}

/// Pin a database path in the context file
pub fn set_database_path(database: &Path) -> anyhow::Result<()> {
    let path = config::context_file_path();
    let mut context = read_context(&path)?;
    context.database = Some(database.to_path_buf());
    write_context(&path, &context)
}

/// Remove the pinned database path from the context file
pub fn clear_database_path() -> anyhow::Result<()> {
    let path = config::context_file_path();
    if !path.exists() {
        return Ok(());
    }
    let mut context = read_context(&path)?;
    context.database = None;
    write_context(&path, &context)
}

/// Resolve the site the command should operate on: an explicit `--site`
/// override wins, otherwise the context's default site.
pub async fn resolve_site(
    service: &ContentService,
    explicit: Option<&str>,
) -> anyhow::Result<Site> {
    let handle = match explicit {
        Some(handle) => handle.to_string(),
        None => get_default_site()?.ok_or_else(|| {
            HelpfulError::new("No site selected")
                .with_context("Content commands need a site to operate on")
                .with_suggestion("TRY: strata site use <handle>   # Select a default site")
                .with_suggestion("TRY: strata site list           # See available sites")
        })?,
    };

    service
        .site_by_handle(&handle)
        .await?
        .ok_or_else(|| HelpfulError::site_not_found(&handle).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_round_trips_through_toml() {
        let context = Context {
            site: Some(SiteContext {
                handle: "main".to_string(),
            }),
            database: Some(PathBuf::from("/tmp/strata-test.db")),
        };

        let toml_str = toml::to_string_pretty(&context).unwrap();
        assert!(toml_str.contains("main"));
        assert!(toml_str.contains("strata-test.db"));

        let parsed: Context = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.site.unwrap().handle, "main");
        assert_eq!(parsed.database, Some(PathBuf::from("/tmp/strata-test.db")));
    }

    #[test]
    fn empty_context_is_valid() {
        let context = Context::default();
        let toml_str = toml::to_string_pretty(&context).unwrap();
        let parsed: Context = toml::from_str(&toml_str).unwrap();
        assert!(parsed.site.is_none());
    }

    #[test]
    fn read_and_write_in_a_tempdir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("context.toml");

        assert!(read_context(&path).unwrap().site.is_none());

        let context = Context {
            site: Some(SiteContext {
                handle: "docs".to_string(),
            }),
            database: None,
        };
        write_context(&path, &context).unwrap();

        let loaded = read_context(&path).unwrap();
        assert_eq!(loaded.site.unwrap().handle, "docs");
        assert!(loaded.database.is_none());
    }
}
