//! Quay CLI - inspect and edit queues stored in a quay database

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the database directory
    #[arg(short, long, default_value = "./data")]
    db_path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket and entry counts
    Stats,

    /// Number of values in a bucket
    Size {
        /// Bucket name
        bucket: String,
    },

    /// Add a value to a bucket
    Push {
        /// Bucket name
        bucket: String,

        /// Value to store, as UTF-8 text
        value: String,

        /// Push at the front instead of the back
        #[arg(long)]
        front: bool,
    },

    /// Remove a value without waiting; prints nothing when empty
    Pop {
        /// Bucket name
        bucket: String,

        /// Pop from the back instead of the front
        #[arg(long)]
        back: bool,
    },

    /// List values in key order without removing them
    Peek {
        /// Bucket name
        bucket: String,

        /// Maximum number of values to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Stats => commands::stats::execute(cli.db_path)?,
        Commands::Size { bucket } => commands::edit::size(cli.db_path, &bucket)?,
        Commands::Push {
            bucket,
            value,
            front,
        } => commands::edit::push(cli.db_path, &bucket, &value, front)?,
        Commands::Pop { bucket, back } => commands::edit::pop(cli.db_path, &bucket, back)?,
        Commands::Peek { bucket, limit } => commands::peek::execute(cli.db_path, &bucket, limit)?,
    }

    Ok(())
}
