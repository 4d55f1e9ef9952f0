//! SnipVault CLI
//!
//! Offline inspection tools for snippet sync snapshots.
//!
//! # Commands
//!
//! - `plan` - Show what a merge of two snapshots would do, without doing it
//! - `verify` - Check a local snapshot against the sync invariants

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SnipVault snapshot inspection tools.
///
/// Snapshots are JSON arrays: local snapshots hold snippets, remote
/// snapshots hold records, in the same shapes the sync engine exchanges.
#[derive(Parser)]
#[command(name = "snipvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a merge of a local and a remote snapshot would do
    Plan {
        /// Path to the local snapshot (JSON array of snippets)
        local: PathBuf,

        /// Path to the remote snapshot (JSON array of records)
        remote: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check a local snapshot against the sync invariants
    Verify {
        /// Path to the local snapshot (JSON array of snippets)
        local: PathBuf,

        /// Path to a remote snapshot to check links against
        #[arg(short, long)]
        remote: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Plan {
            local,
            remote,
            format,
        } => {
            commands::plan::run(&local, &remote, &format)?;
        }
        Commands::Verify { local, remote } => {
            commands::verify::run(&local, remote.as_deref())?;
        }
        Commands::Version => {
            println!("SnipVault CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
