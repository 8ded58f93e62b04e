use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "parrot")]
#[command(about = "Rate-limited auto-reply bot for a single chat channel")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/parrot/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the reply loop; Ctrl-C stops it after the current step
    Run {
        /// Override the activity log path
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Validate configuration and print it with secrets masked
    Check,
}
