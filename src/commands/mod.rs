// Commands module - handles CLI command execution

use anyhow::{Context, Result};
use std::path::Path;

pub mod list;
pub mod run;

pub use list::handle_list;
pub use run::{EXIT_INTERRUPTED, run_reporters};

use crate::config::{self, Config};

/// Handle shell completion
pub fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Supported: bash, zsh, fish, elvish, powershell",
                shell_type
            );
        }
    };

    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    generate(shell, &mut cmd, name, &mut stdout);

    Ok(())
}

/// Write the starter configuration to `path`
pub fn handle_init_config(path: &Path) -> Result<()> {
    let toml_content = Config::sample().to_toml();
    crate::utils::FileUtils::write_file(path, &toml_content)
        .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

    println!("Configuration file created: {}", path.display());
    println!("\nYou can now edit the file to customize your settings.");
    print_precedence();
    Ok(())
}

/// Print where the setup would come from, and the loaded file
pub fn handle_show_config(reporters_flag: Option<&str>, config: Option<&Config>) {
    println!("Current configuration:");

    println!("\n  Command-line arguments:");
    match reporters_flag {
        Some(setup) => println!("    Reporters: {}", setup),
        None => println!("    Reporters: not set"),
    }

    match config {
        Some(cfg) => {
            println!("\n  Configuration file loaded:");
            for line in cfg.to_toml().lines() {
                println!("    {}", line);
            }
        }
        None => {
            println!("\n  No configuration file loaded");
            println!("  Create one with: multireport --init-config .multireportrc.toml");
        }
    }

    println!("\n  Environment variables:");
    match std::env::var(config::ENV_MULTI) {
        Ok(value) => println!("    {}: {}", config::ENV_MULTI, value),
        Err(_) => println!("    {}: not set", config::ENV_MULTI),
    }

    print_precedence();
}

fn print_precedence() {
    println!("\nReporter setup precedence:");
    println!("  1. --reporters (highest)");
    println!("  2. [reporters] table of the configuration file");
    println!("  3. `{}` environment variable (lowest)", config::ENV_MULTI);
}
