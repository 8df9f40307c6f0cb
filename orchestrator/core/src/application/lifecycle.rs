// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stack Lifecycle Orchestrator
//!
//! | Operation | Sequence |
//! |-----------|----------|
//! | `destroy` | delete request → poll until absent |
//! | `glass` | build creation spec → `destroy` → create request |
//!
//! A failed destroy phase is returned exactly as `destroy` produced it and
//! the create request is never sent. A failed create after a successful
//! destroy leaves the stack destroyed; there is no rollback.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info};

use crate::application::stack_handle::StackHandle;
use crate::application::status_poller::{PollObserver, PollerSettings, StatusPoller};
use crate::domain::config::{ConfigError, StackConfig};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError};
use crate::domain::stack::StackName;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot glass stack '{stack}': {source}")]
    Config {
        stack: StackName,
        #[source]
        source: ConfigError,
    },

    #[error("Failed destroying stack '{stack}': {source}")]
    DestroyRequest {
        stack: StackName,
        #[source]
        source: ProvisioningError,
    },

    #[error("Stack deletion timeout exceeded for '{stack}' after {elapsed:?} ({attempts} status checks)")]
    DestroyTimedOut {
        stack: StackName,
        elapsed: Duration,
        attempts: u32,
        last_status: Option<String>,
    },

    #[error("Status of stack '{stack}' unavailable after {attempts} checks: {reason}")]
    StatusUnavailable {
        stack: StackName,
        attempts: u32,
        reason: String,
    },

    #[error("Stack '{stack}' was destroyed but could not be recreated and must be recreated manually: {source}")]
    RecreateFailed {
        stack: StackName,
        #[source]
        source: ProvisioningError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyReport {
    pub stack: StackName,
    /// Status checks issued after the delete request was acknowledged
    pub polls: u32,
    /// Delete request plus polling
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlassReport {
    pub destroy: DestroyReport,
    pub elapsed: Duration,
}

pub struct LifecycleOrchestrator {
    client: Arc<dyn ProvisioningClient>,
    stack: StackConfig,
    poller: StatusPoller,
}

impl LifecycleOrchestrator {
    pub fn new(client: Arc<dyn ProvisioningClient>, stack: StackConfig, settings: PollerSettings) -> Self {
        Self {
            client,
            stack,
            poller: StatusPoller::new(settings),
        }
    }

    pub fn handle(&self, name: &StackName) -> StackHandle {
        StackHandle::new(name.clone(), self.client.clone()).with_config(self.stack.clone())
    }

    pub async fn destroy(
        &self,
        name: &StackName,
        observer: &dyn PollObserver,
    ) -> Result<DestroyReport, LifecycleError> {
        let handle = self.handle(name);
        let started = Instant::now();

        handle
            .destroy()
            .await
            .map_err(|source| LifecycleError::DestroyRequest {
                stack: name.clone(),
                source,
            })?;

        let outcome = self.poller.poll_until_deleted(&handle, observer).await?;

        let elapsed = started.elapsed();
        metrics::histogram!("devenv_destroy_duration_seconds").record(elapsed.as_secs_f64());

        Ok(DestroyReport {
            stack: name.clone(),
            polls: outcome.attempts,
            elapsed,
        })
    }

    /// Nuke and pave: destroy the stack, then create it again from configuration.
    pub async fn glass(
        &self,
        name: &StackName,
        observer: &dyn PollObserver,
    ) -> Result<GlassReport, LifecycleError> {
        let handle = self.handle(name);
        let started = Instant::now();

        // Refuse before deleting anything if the stack could not be recreated.
        let spec = handle
            .creation_spec()
            .map_err(|source| LifecycleError::Config {
                stack: name.clone(),
                source,
            })?;

        info!(stack = %name, "Glass: destroying stack");
        let destroy = self.destroy(name, observer).await?;

        info!(stack = %name, "Glass: recreating stack");
        if let Err(source) = handle.create(&spec).await {
            error!(stack = %name, error = %source, "Glass: stack destroyed but recreate failed");
            return Err(LifecycleError::RecreateFailed {
                stack: name.clone(),
                source,
            });
        }

        Ok(GlassReport {
            destroy,
            elapsed: started.elapsed(),
        })
    }
}
