use anyhow::Result;
use clap::Parser;

mod cli;
mod logging;
mod orchestrator;
mod run_cmd;
mod timing;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { log_file } => run_cmd::handle_run(cli.config, log_file).await,
        Commands::Check => {
            logging::init_stderr();
            run_cmd::handle_check(cli.config)
        }
    }
}
