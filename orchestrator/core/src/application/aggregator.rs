// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stack Aggregator
//!
//! Builds the dashboard view of every stack visible to the current
//! credentials:
//!
//! 1. list stacks and resolve the account identity (one call each)
//! 2. per stack, with at most `concurrency` stacks in flight: fetch outputs,
//!    probe the login / API / CA endpoints, assemble a [`DisplayRecord`]
//! 3. collect results in listing order
//!
//! A stack whose outputs cannot be fetched becomes a [`StackFailure`] in the
//! report instead of failing the whole call. Only listing and identity
//! failures are fatal.

use futures::future::join_all;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::readiness::ReadinessProbe;
use crate::application::stack_handle::StackHandle;
use crate::domain::display::{endpoint_targets, DisplayRecord};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError};
use crate::domain::stack::{StackName, StackSummary};

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Error listing stacks: {0}")]
    ListStacks(#[source] ProvisioningError),

    #[error("Error getting caller identity: {0}")]
    Identity(#[source] ProvisioningError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub account: String,
    pub records: Vec<DisplayRecord>,
    pub failures: Vec<StackFailure>,
    /// True when at least one listed stack is missing from `records`
    pub partial: bool,
}

impl AggregationReport {
    pub fn stack_count(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

pub struct StackAggregator {
    client: Arc<dyn ProvisioningClient>,
    probe: Arc<dyn ReadinessProbe>,
    concurrency: usize,
}

impl StackAggregator {
    pub fn new(client: Arc<dyn ProvisioningClient>, probe: Arc<dyn ReadinessProbe>, concurrency: usize) -> Self {
        Self {
            client,
            probe,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn aggregate(&self) -> Result<AggregationReport, AggregationError> {
        let started = Instant::now();

        let stacks = StackHandle::list_all(self.client.as_ref())
            .await
            .map_err(AggregationError::ListStacks)?;
        let account = self
            .client
            .caller_identity()
            .await
            .map_err(AggregationError::Identity)?;

        let account_ref = account.as_str();
        let results: Vec<(String, Result<DisplayRecord, ProvisioningError>)> = futures::stream::iter(stacks)
            .map(move |summary| async move {
                let result = self.display_record(account_ref, &summary).await;
                (summary.name, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(stack = %name, error = %e, "Failed getting outputs");
                    failures.push(StackFailure {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let partial = !failures.is_empty();
        metrics::histogram!("devenv_aggregation_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("devenv_aggregations_total", "partial" => partial.to_string()).increment(1);
        info!(
            account = %account,
            records = records.len(),
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregated stacks"
        );

        Ok(AggregationReport {
            account,
            records,
            failures,
            partial,
        })
    }

    async fn display_record(
        &self,
        account: &str,
        summary: &StackSummary,
    ) -> Result<DisplayRecord, ProvisioningError> {
        let name = StackName::new(summary.name.as_str()).map_err(|e| {
            ProvisioningError::InvalidResponse(format!("listed stack name '{}': {}", summary.name, e))
        })?;
        let handle = StackHandle::new(name, self.client.clone());

        let outputs = handle.outputs().await?;
        let targets = endpoint_targets(&outputs);
        let probes = join_all(
            targets
                .iter()
                .map(|target| async move { (target.kind, self.probe.probe(&target.host).await) }),
        )
        .await;

        Ok(DisplayRecord::assemble(account, summary, &outputs, &probes))
    }
}
