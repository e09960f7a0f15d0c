use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Supply chain data pipeline
#[derive(Debug, Parser)]
#[command(name = "supply-chain", version, about)]
pub struct CliArgs {
    /// Project root (defaults to $SUPPLY_CHAIN_HOME, then the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Ingestion config file (defaults to <root>/configs/data_ingestion.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the training pipeline
    Run,
    /// List configured raw files that are missing
    Check,
    /// Write the default config file if it does not exist
    Init,
    /// Print the data profile of a single CSV file as JSON
    Profile {
        /// CSV file to profile
        csv: PathBuf,
    },
}
