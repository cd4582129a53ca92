//! CLI command implementations.
//!
//! One module per command group. Every command resolves its database path
//! from the top-level flag and opens its own service; the current site comes
//! from the context file (`site use` switches it, kubectl-style).

pub mod config;
pub mod context;
pub mod error;
pub mod output;

pub mod content_type;
pub mod entry;
pub mod field;
pub mod init;
pub mod site;

use std::path::Path;
use strata_content::ContentService;

/// Open the service over an existing database. `init` is the only command
/// allowed to create one.
pub(crate) async fn open_service(db_path: &Path) -> anyhow::Result<ContentService> {
    if !db_path.exists() {
        return Err(error::HelpfulError::database_not_found(db_path).into());
    }
    Ok(ContentService::open(db_path).await?)
}
