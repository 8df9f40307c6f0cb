// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stack Handle
//!
//! Binds one stack name (plus the stack section of the configuration) to a
//! [`ProvisioningClient`]. This is the only place that interprets raw
//! provisioning errors as stack states.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::config::{ConfigError, StackConfig};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError};
use crate::domain::stack::{StackName, StackOutputs, StackSpec, StackStatus, StackSummary};

/// Terminal status some providers keep reporting for a deleted stack.
pub const DELETE_COMPLETE: &str = "DELETE_COMPLETE";

#[derive(Clone)]
pub struct StackHandle {
    name: StackName,
    stack: StackConfig,
    client: Arc<dyn ProvisioningClient>,
}

impl StackHandle {
    pub fn new(name: StackName, client: Arc<dyn ProvisioningClient>) -> Self {
        Self {
            name,
            stack: StackConfig::default(),
            client,
        }
    }

    pub fn with_config(mut self, stack: StackConfig) -> Self {
        self.stack = stack;
        self
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    /// Creation request for this stack built from the bound configuration.
    pub fn creation_spec(&self) -> Result<StackSpec, ConfigError> {
        self.stack.spec_for(&self.name)
    }

    /// Request creation; returns once the provisioning service acknowledged it.
    pub async fn create(&self, spec: &StackSpec) -> Result<(), ProvisioningError> {
        info!(stack = %self.name, template = %spec.template, "Requesting stack creation");
        self.client.create_stack(spec).await
    }

    /// Request deletion; the deletion itself proceeds out-of-band.
    pub async fn destroy(&self) -> Result<(), ProvisioningError> {
        info!(stack = %self.name, "Requesting stack deletion");
        self.client.delete_stack(&self.name).await
    }

    pub async fn status(&self) -> StackStatus {
        match self.client.describe_stack(&self.name).await {
            Ok(described) if described.status == DELETE_COMPLETE => StackStatus::Deleted,
            Ok(described) => StackStatus::Active(described.status),
            Err(e) if e.is_stack_absent() => {
                debug!(stack = %self.name, error = %e, "Stack reported absent");
                StackStatus::Deleted
            }
            Err(e) => StackStatus::Unknown(e.to_string()),
        }
    }

    /// Output mapping; fails while the stack does not expose outputs.
    pub async fn outputs(&self) -> Result<StackOutputs, ProvisioningError> {
        self.client.stack_outputs(&self.name).await
    }

    /// All stacks visible under the client's credentials.
    pub async fn list_all(client: &dyn ProvisioningClient) -> Result<Vec<StackSummary>, ProvisioningError> {
        let stacks = client.list_stacks().await?;
        debug!(count = stacks.len(), "Listed stacks");
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provisioning::DescribedStack;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct ScriptedClient {
        describe: Mutex<Vec<Result<DescribedStack, ProvisioningError>>>,
    }

    impl ScriptedClient {
        fn new(describe: Vec<Result<DescribedStack, ProvisioningError>>) -> Self {
            Self {
                describe: Mutex::new(describe),
            }
        }
    }

    #[async_trait]
    impl ProvisioningClient for ScriptedClient {
        async fn create_stack(&self, _spec: &StackSpec) -> Result<(), ProvisioningError> {
            Ok(())
        }

        async fn delete_stack(&self, _name: &StackName) -> Result<(), ProvisioningError> {
            Ok(())
        }

        async fn describe_stack(&self, _name: &StackName) -> Result<DescribedStack, ProvisioningError> {
            self.describe.lock().await.remove(0)
        }

        async fn stack_outputs(&self, name: &StackName) -> Result<StackOutputs, ProvisioningError> {
            Err(ProvisioningError::NotFound(name.to_string()))
        }

        async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProvisioningError> {
            Ok(vec![])
        }

        async fn caller_identity(&self) -> Result<String, ProvisioningError> {
            Ok("000000000000".to_string())
        }
    }

    fn described(status: &str) -> Result<DescribedStack, ProvisioningError> {
        Ok(DescribedStack {
            name: "dev1".to_string(),
            status: status.to_string(),
        })
    }

    #[tokio::test]
    async fn test_status_is_three_valued() {
        let client = Arc::new(ScriptedClient::new(vec![
            described("DELETE_IN_PROGRESS"),
            described(DELETE_COMPLETE),
            Err(ProvisioningError::Service {
                code: "ValidationError".to_string(),
                message: "Stack with id dev1 does not exist".to_string(),
                status: Some(400),
            }),
            Err(ProvisioningError::Service {
                code: "Throttling".to_string(),
                message: "Rate exceeded".to_string(),
                status: Some(400),
            }),
            Err(ProvisioningError::Transport("connection refused".to_string())),
        ]));
        let handle = StackHandle::new(StackName::new("dev1").unwrap(), client);

        assert_eq!(handle.status().await, StackStatus::Active("DELETE_IN_PROGRESS".to_string()));
        assert_eq!(handle.status().await, StackStatus::Deleted);
        assert_eq!(handle.status().await, StackStatus::Deleted);
        assert!(matches!(handle.status().await, StackStatus::Unknown(reason) if reason.contains("Throttling")));
        assert!(matches!(handle.status().await, StackStatus::Unknown(_)));
    }

    #[tokio::test]
    async fn test_creation_spec_requires_template() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let name = StackName::new("dev1").unwrap();

        let bare = StackHandle::new(name.clone(), client.clone());
        assert!(bare.creation_spec().is_err());

        let configured = StackHandle::new(name.clone(), client).with_config(StackConfig {
            template: Some("s3://templates/devenv.yaml".to_string()),
            ..StackConfig::default()
        });
        let spec = configured.creation_spec().unwrap();
        assert_eq!(spec.name, name);
    }
}
