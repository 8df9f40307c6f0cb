// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # devenv CLI
//!
//! The `devenv` binary manages development environment stacks and serves the
//! status dashboard.
//!
//! ## Commands
//!
//! - `devenv destroy|glass [NAME]` - Delete a stack (and recreate it with `glass`)
//! - `devenv status [NAME]`, `devenv list` - Inspect stacks
//! - `devenv systems` - One-shot dashboard aggregation as JSON
//! - `devenv serve` - Run the dashboard HTTP server
//! - `devenv config show|validate|generate` - Configuration management
//!
//! A missing stack name falls back to `spec.stack.name`, then to an
//! interactive prompt.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use devenv_cli::commands::{self, ConfigCommand};
use devenv_cli::observability::{init_logging, init_metrics, logging_settings, LogFormat};

/// devenv - Nuke, pave and inspect development environment stacks
#[derive(Parser)]
#[command(name = "devenv")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "DEVENV_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Stack name (takes precedence over the positional argument)
    #[arg(short, long, global = true)]
    name: Option<String>,

    /// SSH key pair for recreated stacks (overrides spec.stack.key_name)
    #[arg(long, global = true)]
    key_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DEVENV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, env = "DEVENV_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Destroy a dev env by name
    Destroy {
        /// Stack name
        name: Option<String>,
    },

    /// Nuke and pave an environment (destroy, then recreate)
    Glass {
        /// Stack name
        name: Option<String>,
    },

    /// Show the current status of a stack
    Status {
        /// Stack name
        name: Option<String>,
    },

    /// List all stacks visible to the configured credentials
    List,

    /// Aggregate every stack once and print the dashboard JSON
    Systems {
        /// Include per-stack failures and the account
        #[arg(long)]
        report: bool,
    },

    /// Run the dashboard HTTP server
    Serve {
        /// Listen port (overrides spec.dashboard.port)
        #[arg(long, env = "DEVENV_PORT")]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { command } = cli.command {
        let level = cli.log_level.as_deref().unwrap_or("warn");
        let format = LogFormat::parse(cli.log_format.as_deref().unwrap_or("text"))?;
        init_logging(level, format)?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = commands::load_config(cli.config)?;
    let (level, format) = logging_settings(cli.log_level.as_deref(), cli.log_format.as_deref(), &config)?;
    init_logging(&level, format)?;
    init_metrics(&config)?;

    let resolve = |argument: Option<String>| {
        commands::resolve_stack_name(cli.name.clone(), argument, &config, commands::prompt_stack_name)
    };

    match cli.command {
        Commands::Destroy { name } => {
            let name = resolve(name)?;
            commands::stack::destroy(&config, name, cli.key_name.clone(), format).await
        }
        Commands::Glass { name } => {
            let name = resolve(name)?;
            commands::stack::glass(&config, name, cli.key_name.clone(), format).await
        }
        Commands::Status { name } => {
            let name = resolve(name)?;
            commands::stack::status(&config, name).await
        }
        Commands::List => commands::stack::list(&config).await,
        Commands::Systems { report } => commands::dashboard::systems(&config, report).await,
        Commands::Serve { port } => commands::dashboard::serve(&config, port).await,
        // Handled before configuration is loaded.
        Commands::Config { .. } => Ok(()),
    }
}
