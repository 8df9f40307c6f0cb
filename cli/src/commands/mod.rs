// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for devenv CLI

pub mod config;
pub mod dashboard;
pub mod stack;

pub use self::config::ConfigCommand;

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use devenv_core::domain::config::DevEnvConfigManifest;
use devenv_core::domain::stack::StackName;

/// Load, override and validate the configuration for a command.
pub fn load_config(config_path: Option<PathBuf>) -> Result<DevEnvConfigManifest> {
    let config = DevEnvConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Pick the stack to operate on: `--name` flag, positional argument, configured
/// default, then `prompt`.
pub fn resolve_stack_name(
    flag: Option<String>,
    argument: Option<String>,
    config: &DevEnvConfigManifest,
    prompt: impl FnOnce() -> Result<String>,
) -> Result<StackName> {
    let explicit = flag.or(argument).filter(|name| !name.trim().is_empty());

    let raw = match explicit {
        Some(name) => name,
        None => match config.default_stack_name() {
            Some(name) => return Ok(name),
            None => prompt()?,
        },
    };

    StackName::new(raw.as_str()).map_err(|e| anyhow!("Invalid stack name '{}': {}", raw.trim(), e))
}

/// Interactive fallback used when no stack name was supplied.
pub fn prompt_stack_name() -> Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt("Please enter stack name")
        .interact_text()
        .context("Failed to read stack name")
}
