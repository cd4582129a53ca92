//! Strata command-line interface.
//!
//! Manages sites, content-types, fields, and entries in a local SQLite
//! store. Content-type and field mutations reshape the per-type data tables;
//! everything else is plain catalog reads and writes.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Structured content over SQLite", version)]
struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Database file (default: <strata home>/strata.db)
    #[arg(long, global = true, env = "STRATA_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the Strata home directory and database
    Init,

    /// Manage sites
    Site {
        #[command(subcommand)]
        action: cli::site::SiteAction,
    },

    /// Manage content-types
    #[command(name = "type")]
    ContentType {
        #[command(subcommand)]
        action: cli::content_type::TypeAction,
    },

    /// Manage fields
    Field {
        #[command(subcommand)]
        action: cli::field::FieldAction,
    },

    /// Manage entries
    Entry {
        #[command(subcommand)]
        action: cli::entry::EntryAction,
    },

    /// Show current configuration and paths
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Config(args) => args.json,
        Commands::Site { action } => matches!(action, cli::site::SiteAction::List { json: true }),
        Commands::ContentType { action } => match action {
            cli::content_type::TypeAction::List { json, .. } => *json,
            cli::content_type::TypeAction::Show { json, .. } => *json,
            _ => false,
        },
        Commands::Field { action } => match action {
            cli::field::FieldAction::List { json, .. } => *json,
            _ => false,
        },
        Commands::Entry { action } => match action {
            cli::entry::EntryAction::List { json, .. } => *json,
            _ => false,
        },
        _ => false,
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli::config::resolve_db_path(cli.database)?;
    match cli.command {
        Commands::Init => cli::init::run(&db_path).await,
        Commands::Site { action } => cli::site::run(&db_path, action).await,
        Commands::ContentType { action } => cli::content_type::run(&db_path, action).await,
        Commands::Field { action } => cli::field::run(&db_path, action).await,
        Commands::Entry { action } => cli::entry::run(&db_path, action).await,
        Commands::Config(args) => cli::config::run(args, &db_path),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_mode = command_wants_json(&cli.command);
    let default_filter = if cli.verbose {
        "strata=debug,strata_db=debug,strata_content=debug"
    } else {
        "strata=info,strata_db=info,strata_content=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let mut _log_guard: Option<tracing_appender::non_blocking::WorkerGuard> = None;
    let file_layer = match cli::config::ensure_logs_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "strata.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            _log_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: failed to create logs directory: {}", err);
            None
        }
    };

    // Keep stdout clean for machine-readable output; logs go to stderr then.
    let console_writer = if json_mode {
        tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr)
    } else {
        tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout)
    };
    let console_filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("strata=debug,strata_db=debug,strata_content=debug")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console_writer)
        .with_target(false)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    match run_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
