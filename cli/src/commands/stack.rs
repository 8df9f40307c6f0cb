// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stack lifecycle commands
//!
//! Commands: destroy, glass, status, list

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use devenv_core::application::{
    LifecycleOrchestrator, PollObserver, PollOutcome, PollSample, PollerSettings, StackHandle, TracingObserver,
};
use devenv_core::domain::config::DevEnvConfigManifest;
use devenv_core::domain::provisioning::ProvisioningClient;
use devenv_core::domain::stack::{StackName, StackStatus};
use devenv_core::infrastructure::provisioning;

use crate::observability::LogFormat;

/// Prints one line per status check in the `  HH:MM:SS STATUS` format.
pub struct ConsoleObserver<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            if let Err(e) = writeln!(out, "{}", text) {
                debug!(error = %e, "Failed to write status line");
            }
        }
    }
}

#[async_trait]
impl<W: Write + Send> PollObserver for ConsoleObserver<W> {
    async fn on_progress(&self, sample: &PollSample) {
        let local = sample.observed_at.with_timezone(&Local);
        self.line(&format!("  {} {}", local.format("%H:%M:%S"), sample.status));
    }

    async fn on_status_unknown(&self, attempt: u32, reason: &str) {
        self.line(&format!("  {}", format!("status check {} failed: {}", attempt, reason).yellow()));
    }

    async fn on_deleted(&self, _outcome: &PollOutcome) {
        self.line("  DELETE_COMPLETE");
    }
}

/// Status lines on the console for text output; structured log events for JSON.
pub fn poll_observer(format: LogFormat) -> Box<dyn PollObserver> {
    match format {
        LogFormat::Text => Box::new(ConsoleObserver::new(std::io::stdout())),
        LogFormat::Json => Box::new(TracingObserver),
    }
}

pub fn deletion_summary(elapsed: Duration) -> String {
    format!("Stack Deletion took {:.6} minutes.", elapsed.as_secs_f64() / 60.0)
}

fn orchestrator(config: &DevEnvConfigManifest, key_name: Option<String>) -> Result<LifecycleOrchestrator> {
    let client = provisioning::from_config(&config.spec.provider).context("Failed to create provisioning client")?;

    let mut stack = config.spec.stack.clone();
    if key_name.is_some() {
        stack.key_name = key_name;
    }

    Ok(LifecycleOrchestrator::new(
        client,
        stack,
        PollerSettings::from(&config.spec.lifecycle),
    ))
}

pub async fn destroy(
    config: &DevEnvConfigManifest,
    name: StackName,
    key_name: Option<String>,
    format: LogFormat,
) -> Result<()> {
    let orchestrator = orchestrator(config, key_name)?;
    let observer = poll_observer(format);

    println!("Deleting Stack {:?}.", name.as_str());
    println!("Checking Status");

    let report = orchestrator
        .destroy(&name, observer.as_ref())
        .await
        .context("Error running destroy")?;

    println!("{}", deletion_summary(report.elapsed));
    Ok(())
}

pub async fn glass(
    config: &DevEnvConfigManifest,
    name: StackName,
    key_name: Option<String>,
    format: LogFormat,
) -> Result<()> {
    let orchestrator = orchestrator(config, key_name)?;
    let observer = poll_observer(format);

    println!("Glassing Stack {:?} (destroy, then recreate).", name.as_str());
    println!("Checking Status");

    let report = orchestrator
        .glass(&name, observer.as_ref())
        .await
        .context("Error running glass")?;

    println!("{}", deletion_summary(report.destroy.elapsed));
    println!(
        "{}",
        format!("✓ Stack {} recreation requested", name).green()
    );
    Ok(())
}

pub async fn status(config: &DevEnvConfigManifest, name: StackName) -> Result<()> {
    let client = provisioning::from_config(&config.spec.provider).context("Failed to create provisioning client")?;
    let handle = StackHandle::new(name.clone(), client);

    match handle.status().await {
        StackStatus::Active(status) => println!("{} {}", name.as_str().bold(), status),
        StackStatus::Deleted => println!("{} {}", name.as_str().bold(), "DELETE_COMPLETE".dimmed()),
        StackStatus::Unknown(reason) => {
            anyhow::bail!("Status of stack {} unavailable: {}", name, reason)
        }
    }
    Ok(())
}

pub async fn list(config: &DevEnvConfigManifest) -> Result<()> {
    let client = provisioning::from_config(&config.spec.provider).context("Failed to create provisioning client")?;
    print_stacks(client.as_ref(), &mut std::io::stdout()).await
}

async fn print_stacks(client: &dyn ProvisioningClient, out: &mut impl Write) -> Result<()> {
    let stacks = StackHandle::list_all(client).await.context("Error listing stacks")?;

    if stacks.is_empty() {
        writeln!(out, "{}", "No stacks found".dimmed())?;
        return Ok(());
    }

    writeln!(out, "{:<32} {:<24} {}", "NAME".bold(), "STATUS".bold(), "CREATED".bold())?;
    for stack in stacks {
        writeln!(
            out,
            "{:<32} {:<24} {}",
            stack.name,
            stack.status,
            stack.created.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    Ok(())
}
