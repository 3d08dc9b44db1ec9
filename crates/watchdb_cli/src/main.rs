//! watchdb CLI
//!
//! Command-line tools for watchdb record stores.
//!
//! # Commands
//!
//! - `inspect` - Display record counts and sizes per database
//! - `dump` - List the records of one database
//! - `apply` - Dispatch hex-encoded Blob frames against a store
//! - `frame` - Build a hex-encoded Blob frame
//! - `verify` - Check the record log for damage
//! - `compact` - Rewrite the record log without dead records

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use watchdb_core::DatabaseId;

/// watchdb command-line store tools.
#[derive(Parser)]
#[command(name = "watchdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display record counts and sizes per database
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the records of one database
    Dump {
        /// Database name (test, pin, app, reminder, notification, app-glance)
        #[arg(short, long)]
        database: DatabaseId,

        /// Maximum number of records to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dispatch Blob frames, one hex-encoded frame per line
    Apply {
        /// File of frames; blank lines and lines starting with '#' are skipped
        file: PathBuf,
    },

    /// Build a hex-encoded Blob frame
    Frame {
        #[command(subcommand)]
        kind: commands::frame::FrameKind,
    },

    /// Check the record log for damage
    Verify,

    /// Rewrite the record log so it holds only live records
    Compact {
        /// Report what would be reclaimed without rewriting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Dump {
            database,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for dump")?;
            commands::dump::run(&path, database, limit, &format)?;
        }
        Commands::Apply { file } => {
            let path = cli.path.ok_or("Store path required for apply")?;
            commands::apply::run(&path, &file)?;
        }
        Commands::Frame { kind } => {
            println!("{}", commands::frame::build(kind)?);
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Version => {
            println!("watchdb CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
