//! rowsync CLI
//!
//! Command-line tools for inspecting list synchronization behavior.
//!
//! # Commands
//!
//! - `diff` - Print the edit script between two row files
//! - `replay` - Run a scenario against an in-memory source and print every notification

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// rowsync command-line tools.
#[derive(Parser)]
#[command(name = "rowsync")]
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
    /// Print the edit script a replace load would emit between two row files
    Diff {
        /// JSON array of the current rows
        from: PathBuf,

        /// JSON array of the incoming rows
        to: PathBuf,

        /// Fall back to display-name equality for rows without an id
        #[arg(short, long)]
        by_name: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run a scenario file and print the resulting notifications
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
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
        Commands::Diff {
            from,
            to,
            by_name,
            format,
        } => {
            commands::diff::run(&from, &to, by_name, &format)?;
        }
        Commands::Replay { scenario, format } => {
            commands::replay::run(&scenario, &format)?;
        }
        Commands::Version => {
            println!("rowsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
