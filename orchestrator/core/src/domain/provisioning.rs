// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Provisioning Service Port
//!
//! The provisioning service is the external cloud orchestration API that
//! actually creates and deletes stacks. The domain only depends on the
//! [`ProvisioningClient`] trait; adapters live in
//! `crate::infrastructure::provisioning`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::stack::{StackName, StackOutputs, StackSpec, StackSummary};

/// Error codes the provisioning service uses to say "this stack does not exist".
pub const STACK_ABSENT_CODES: &[&str] = &["StackNotFound", "ResourceNotFound"];

/// Generic validation code; only means "absent" together with the message below.
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";
const DOES_NOT_EXIST_MESSAGE: &str = "does not exist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedStack {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Stack not found: {0}")]
    NotFound(String),

    #[error("Provisioning service returned {code}: {message}")]
    Service {
        code: String,
        message: String,
        status: Option<u16>,
    },

    #[error("Failed to reach provisioning service: {0}")]
    Transport(String),

    #[error("Invalid response from provisioning service: {0}")]
    InvalidResponse(String),
}

impl ProvisioningError {
    /// True only when the error explicitly says the stack is gone.
    ///
    /// Throttling, permission errors and transport failures all return false.
    pub fn is_stack_absent(&self) -> bool {
        match self {
            ProvisioningError::NotFound(_) => true,
            ProvisioningError::Service { code, message, .. } => {
                STACK_ABSENT_CODES.contains(&code.as_str())
                    || (code == VALIDATION_ERROR_CODE && message.contains(DOES_NOT_EXIST_MESSAGE))
            }
            ProvisioningError::Transport(_) | ProvisioningError::InvalidResponse(_) => false,
        }
    }
}

/// Raw stack operations offered by the provisioning service.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Request stack creation; returns once the request is acknowledged.
    async fn create_stack(&self, spec: &StackSpec) -> Result<(), ProvisioningError>;

    /// Request stack deletion; deletion itself proceeds asynchronously.
    async fn delete_stack(&self, name: &StackName) -> Result<(), ProvisioningError>;

    async fn describe_stack(&self, name: &StackName) -> Result<DescribedStack, ProvisioningError>;

    async fn stack_outputs(&self, name: &StackName) -> Result<StackOutputs, ProvisioningError>;

    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProvisioningError>;

    /// Account identifier of the current credentials.
    async fn caller_identity(&self) -> Result<String, ProvisioningError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(code: &str, message: &str) -> ProvisioningError {
        ProvisioningError::Service {
            code: code.to_string(),
            message: message.to_string(),
            status: Some(400),
        }
    }

    #[test]
    fn test_explicit_absence_codes() {
        assert!(ProvisioningError::NotFound("dev1".into()).is_stack_absent());
        assert!(service("StackNotFound", "gone").is_stack_absent());
        assert!(service("ValidationError", "Stack with id dev1 does not exist").is_stack_absent());
    }

    #[test]
    fn test_other_failures_are_not_absence() {
        assert!(!service("ValidationError", "Template format error").is_stack_absent());
        assert!(!service("Throttling", "Rate exceeded").is_stack_absent());
        assert!(!service("AccessDenied", "not authorized").is_stack_absent());
        assert!(!ProvisioningError::Transport("connection reset".into()).is_stack_absent());
        assert!(!ProvisioningError::InvalidResponse("bad json".into()).is_stack_absent());
    }
}
