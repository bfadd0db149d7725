mod cli;
mod commands;
mod demo;
mod output;
mod timing;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser as _;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::commands::{ListOptions, generate_completions, run_list};
use crate::output::Output;

async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::List {
            role,
            query,
            watch,
            demo,
            format,
            timeout,
        } => {
            run_list(ListOptions {
                role: role.into(),
                query,
                watch,
                demo,
                format,
                timeout: Duration::from_secs(timeout),
            })
            .await
        }
        Commands::Completions { shell } => {
            generate_completions(shell)?;
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    timing::init_tracing(cli.verbose, cli.timing);

    if let Err(err) = dotenvy::dotenv() {
        debug!("No .env loaded: {err}");
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            Output::new().error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
