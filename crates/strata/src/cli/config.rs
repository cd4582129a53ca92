//! Configuration paths for Strata.
//!
//! Simple path resolution with sensible defaults. All paths are under the
//! Strata home directory.

use std::path::PathBuf;

/// Resolve the Strata home directory.
///
/// Priority:
/// 1) STRATA_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.strata
pub fn strata_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("STRATA_HOME") {
        return PathBuf::from(override_path);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".strata");
    }
    PathBuf::from(".").join(".strata")
}

/// Ensure the Strata home directory exists.
pub fn ensure_strata_home() -> std::io::Result<PathBuf> {
    let home = strata_home();
    std::fs::create_dir_all(&home)?;
    Ok(home)
}

/// Default database path: <home>/strata.db
pub fn default_db_path() -> PathBuf {
    strata_home().join("strata.db")
}

/// Database path: the CLI flag wins, then a path pinned in the context
/// file, then the default.
pub fn resolve_db_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(path) = crate::cli::context::stored_database_path()? {
        return Ok(path);
    }
    Ok(default_db_path())
}

/// Logs directory: <home>/logs
pub fn logs_dir() -> PathBuf {
    strata_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> std::io::Result<PathBuf> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Context file path: <home>/context.toml
pub fn context_file_path() -> PathBuf {
    strata_home().join("context.toml")
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,

    /// Pin a database path in the context file
    #[arg(long = "set-database", value_name = "PATH")]
    pub set_database: Option<PathBuf>,

    /// Remove the pinned database path
    #[arg(long = "clear-database")]
    pub clear_database: bool,
}

/// Run the config command - edits the context file or shows current paths
pub fn run(args: ConfigArgs, database: &std::path::Path) -> anyhow::Result<()> {
    if let Some(path) = args.set_database {
        crate::cli::context::set_database_path(&path)?;
        println!("Pinned database path {}", path.display());
        return Ok(());
    }
    if args.clear_database {
        crate::cli::context::clear_database_path()?;
        println!("Cleared the pinned database path");
        return Ok(());
    }

    let home = strata_home();
    let logs = logs_dir();
    let context = context_file_path();

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "database": {
                "path": database.to_string_lossy(),
                "exists": database.exists(),
            },
            "logs": logs.to_string_lossy(),
            "context": {
                "path": context.to_string_lossy(),
                "exists": context.exists(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("STRATA CONFIGURATION");
        println!("====================");
        println!();
        println!("Home:     {}", home.display());
        println!();
        println!(
            "Database: {} ({})",
            database.display(),
            if database.exists() { "exists" } else { "not found" }
        );
        println!("Logs:     {}", logs.display());
        println!(
            "Context:  {} ({})",
            context.display(),
            if context.exists() { "exists" } else { "not found" }
        );
    }

    Ok(())
}
