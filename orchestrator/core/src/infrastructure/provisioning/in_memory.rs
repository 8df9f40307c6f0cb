// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory provisioning service
//!
//! Simulates the stack lifecycle inside the process: creation completes
//! immediately; after a delete request the `deletion_polls`-th `describe`
//! call finds the stack gone and answers "does not exist".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::provisioning::{DescribedStack, ProvisioningClient, ProvisioningError, VALIDATION_ERROR_CODE};
use crate::domain::stack::{StackName, StackOutputs, StackSpec, StackSummary};

pub const DEFAULT_ACCOUNT: &str = "000000000000";
pub const DEFAULT_DELETION_POLLS: u32 = 3;

const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
const DELETE_IN_PROGRESS: &str = "DELETE_IN_PROGRESS";

#[derive(Debug, Clone)]
struct SimulatedStack {
    status: String,
    created: DateTime<Utc>,
    outputs: StackOutputs,
    /// Describe calls left until a deleting stack is reported absent
    remaining_polls: u32,
}

pub struct InMemoryProvisioningClient {
    account: String,
    deletion_polls: u32,
    stacks: RwLock<BTreeMap<String, SimulatedStack>>,
}

impl Default for InMemoryProvisioningClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvisioningClient {
    pub fn new() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
            deletion_polls: DEFAULT_DELETION_POLLS,
            stacks: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_deletion_polls(mut self, polls: u32) -> Self {
        self.deletion_polls = polls;
        self
    }

    /// Seed a stack in `CREATE_COMPLETE` with the given outputs.
    pub fn with_stack(mut self, name: &str, outputs: StackOutputs) -> Self {
        self.stacks.get_mut().insert(
            name.to_string(),
            SimulatedStack {
                status: CREATE_COMPLETE.to_string(),
                created: Utc::now(),
                outputs,
                remaining_polls: 0,
            },
        );
        self
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.stacks.read().await.contains_key(name)
    }

    fn synthesized_outputs(name: &StackName) -> StackOutputs {
        [
            ("Address", format!("{}.devenv.internal", name)),
            ("Login", format!("login.{}.devenv.internal", name)),
            ("Api", format!("api.{}.devenv.internal", name)),
            ("CA", format!("ca.{}.devenv.internal", name)),
        ]
        .into_iter()
        .collect()
    }

    fn does_not_exist(name: &StackName) -> ProvisioningError {
        ProvisioningError::Service {
            code: VALIDATION_ERROR_CODE.to_string(),
            message: format!("Stack with id {} does not exist", name),
            status: Some(400),
        }
    }
}

#[async_trait]
impl ProvisioningClient for InMemoryProvisioningClient {
    async fn create_stack(&self, spec: &StackSpec) -> Result<(), ProvisioningError> {
        let mut stacks = self.stacks.write().await;
        if stacks.contains_key(spec.name.as_str()) {
            return Err(ProvisioningError::Service {
                code: "AlreadyExistsException".to_string(),
                message: format!("Stack [{}] already exists", spec.name),
                status: Some(400),
            });
        }

        stacks.insert(
            spec.name.to_string(),
            SimulatedStack {
                status: CREATE_COMPLETE.to_string(),
                created: Utc::now(),
                outputs: Self::synthesized_outputs(&spec.name),
                remaining_polls: 0,
            },
        );
        debug!(stack = %spec.name, "Simulated stack created");
        Ok(())
    }

    async fn delete_stack(&self, name: &StackName) -> Result<(), ProvisioningError> {
        // Deleting an unknown stack succeeds, like the real service.
        if let Some(stack) = self.stacks.write().await.get_mut(name.as_str()) {
            if stack.status != DELETE_IN_PROGRESS {
                stack.status = DELETE_IN_PROGRESS.to_string();
                stack.remaining_polls = self.deletion_polls;
            }
        }
        Ok(())
    }

    async fn describe_stack(&self, name: &StackName) -> Result<DescribedStack, ProvisioningError> {
        let mut stacks = self.stacks.write().await;
        let Some(stack) = stacks.get_mut(name.as_str()) else {
            return Err(Self::does_not_exist(name));
        };

        if stack.status == DELETE_IN_PROGRESS {
            stack.remaining_polls = stack.remaining_polls.saturating_sub(1);
            if stack.remaining_polls == 0 {
                stacks.remove(name.as_str());
                debug!(stack = %name, "Simulated stack deleted");
                return Err(Self::does_not_exist(name));
            }
        }

        Ok(DescribedStack {
            name: name.to_string(),
            status: stack.status.clone(),
        })
    }

    async fn stack_outputs(&self, name: &StackName) -> Result<StackOutputs, ProvisioningError> {
        let stacks = self.stacks.read().await;
        let stack = stacks.get(name.as_str()).ok_or_else(|| Self::does_not_exist(name))?;

        if !stack.status.ends_with("_COMPLETE") {
            return Err(ProvisioningError::Service {
                code: "OutputsUnavailable".to_string(),
                message: format!("Stack {} is {}", name, stack.status),
                status: Some(409),
            });
        }
        Ok(stack.outputs.clone())
    }

    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProvisioningError> {
        Ok(self
            .stacks
            .read()
            .await
            .iter()
            .map(|(name, stack)| StackSummary {
                name: name.clone(),
                status: stack.status.clone(),
                created: stack.created,
            })
            .collect())
    }

    async fn caller_identity(&self) -> Result<String, ProvisioningError> {
        Ok(self.account.clone())
    }
}
