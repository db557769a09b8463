// Main entry point for multireport

use anyhow::Result;
use clap::Parser;
use tracing::info;

use multireport::cli::{Cli, Commands};
use multireport::commands::{
    handle_completion, handle_init_config, handle_list, handle_show_config, run_reporters,
};
use multireport::config::Config;
use multireport::error::MultiError;
use multireport::logging;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("ERROR: {}", fatal_message(&e));
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    // Load configuration from file (if exists)
    let config = Config::load();

    let cli = Cli::parse();

    let log_level = config.as_ref().map(|c| c.general.log_level.as_str());
    logging::init(cli.verbose, log_level);

    if cli.verbose {
        info!("Starting multireport v{}", env!("CARGO_PKG_VERSION"));
    }

    if cli.config {
        handle_show_config(cli.get_run_args().reporters.as_deref(), config.as_ref());
        return Ok(0);
    }

    if let Some(config_file) = &cli.init_config {
        handle_init_config(config_file)?;
        return Ok(0);
    }

    if let Some(shell_type) = &cli.completion {
        handle_completion(shell_type)?;
        return Ok(0);
    }

    match &cli.command {
        Some(Commands::List(args)) => {
            handle_list(args)?;
            Ok(0)
        }
        Some(Commands::Run(args)) => run_reporters(args, config.as_ref()).await,
        // Implicit run
        None => run_reporters(&cli.run_args, config.as_ref()).await,
    }
}

/// Setup errors print their own message; anything else prints its context chain
fn fatal_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<MultiError>() {
        Some(e) => e.to_string(),
        None => format!("{:#}", error),
    }
}
