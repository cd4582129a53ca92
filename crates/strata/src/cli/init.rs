//! Init command - create the Strata home directory and database.

use crate::cli::config;
use std::path::Path;
use strata_content::ContentService;
use tracing::info;

pub async fn run(db_path: &Path) -> anyhow::Result<()> {
    let home = config::ensure_strata_home()?;
    config::ensure_logs_dir()?;

    let already_existed = db_path.exists();
    let service = ContentService::open(db_path).await?;
    let sites = service.sites().await?;

    info!(home = %home.display(), db = %db_path.display(), "Strata initialized");

    if already_existed {
        println!("Database ready at {} ({} sites)", db_path.display(), sites.len());
    } else {
        println!("Created database at {}", db_path.display());
        println!();
        println!("Next steps:");
        println!("  strata site add <handle>   # Create a site");
        println!("  strata site use <handle>   # Select it");
        println!("  strata type create <handle>");
    }

    Ok(())
}
