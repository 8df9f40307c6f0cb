// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use devenv_core::domain::config::{DevEnvConfigManifest, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./devenv-config.yaml)
        #[arg(short, long, default_value = "./devenv-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate {
            output,
            examples,
            force,
        } => generate(&output, examples, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config =
        DevEnvConfigManifest::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./devenv-config.yaml");
        println!("  4. ~/.devenv/config.yaml");
        println!("  5. /etc/devenv/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", config.to_yaml_string()?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let provider = &config.spec.provider;
    println!("{}", "Provisioning Service:".bold());
    println!("  Type: {:?}", provider.provider_type);
    println!("  Endpoint: {}", provider.endpoint.as_deref().unwrap_or("(none)"));
    if let Some(region) = &provider.region {
        println!("  Region: {}", region);
    }
    println!(
        "  API token: {}",
        if provider.api_token.is_some() { "(set)" } else { "(none)" }
    );
    println!();

    let stack = &config.spec.stack;
    println!("{}", "Default Stack:".bold());
    println!("  Name: {}", stack.name.as_deref().unwrap_or("(prompt)"));
    println!("  Template: {}", stack.template.as_deref().unwrap_or("(none)"));
    if let Some(key_name) = &stack.key_name {
        println!("  Key pair: {}", key_name);
    }
    println!();

    let lifecycle = &config.spec.lifecycle;
    println!("{}", "Lifecycle:".bold());
    println!("  Poll interval: {:?}", lifecycle.poll_interval);
    println!("  Destroy timeout: {:?}", lifecycle.destroy_timeout);
    println!("  Max failed status checks: {}", lifecycle.max_unknown_polls);
    println!();

    let dashboard = &config.spec.dashboard;
    println!("{}", "Dashboard:".bold());
    println!("  Listen: {}:{}", dashboard.bind_address, dashboard.port);
    println!("  Probe: {} (timeout {:?})", dashboard.probe_scheme, dashboard.probe_timeout);
    println!("  Concurrency: {}", dashboard.concurrency);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = DevEnvConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    std::fs::write(output, sample_config(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

pub fn sample_config(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}
