// CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fan one test run out to several reporters, each with its own destination
#[derive(Parser, Debug)]
#[command(name = "multireport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Replay a test run into several reporters at once",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // Flattened so that `multireport events.jsonl` runs without a subcommand
    #[command(flatten)]
    pub run_args: RunArgs,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion (bash, zsh, fish, elvish, powershell)
    #[arg(
        long,
        value_name = "SHELL_TYPE",
        value_parser = ["bash", "zsh", "fish", "elvish", "powershell"]
    )]
    pub completion: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay an event log into the configured reporters (default)
    Run(RunArgs),

    /// List reporters that can be named in a setup
    List(ListArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON-lines event log; `-` or absent reads stdin
    #[arg(required = false, value_name = "EVENTS")]
    pub events: Option<PathBuf>,

    /// Reporter setup, `name=destination name=destination`
    #[arg(short = 'R', long, value_name = "SETUP")]
    pub reporters: Option<String>,

    /// Option shared by every reporter (repeatable)
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub options: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

impl Cli {
    /// Helper to get effective RunArgs
    pub fn get_run_args(&self) -> &RunArgs {
        match &self.command {
            Some(Commands::Run(args)) => args,
            _ => &self.run_args,
        }
    }
}

fn is_json_format(value: &str) -> bool {
    value.eq_ignore_ascii_case("json")
}

impl ListArgs {
    pub fn is_json(&self) -> bool {
        is_json_format(&self.format)
    }
}

/// Parse a `KEY=VALUE` pair; the value may itself contain `=`
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
