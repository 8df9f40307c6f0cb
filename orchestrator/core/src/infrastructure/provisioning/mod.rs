// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provisioning Service Adapters
//
// Implementations of the ProvisioningClient port. The adapter is selected by
// `spec.provider.type` in the configuration manifest.

pub mod http;
pub mod in_memory;

pub use http::HttpProvisioningClient;
pub use in_memory::InMemoryProvisioningClient;

use std::sync::Arc;
use tracing::info;

use crate::domain::config::{ConfigError, ProviderConfig, ProviderType};
use crate::domain::provisioning::ProvisioningClient;

/// Build the provisioning client described by `config`.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn ProvisioningClient>, ConfigError> {
    match config.provider_type {
        ProviderType::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| ConfigError::Invalid("spec.provider.endpoint is required for http provider".to_string()))?;
            let token = config.resolve_api_token()?;

            info!(endpoint = %endpoint, region = ?config.region, "Using HTTP provisioning gateway");
            let client = HttpProvisioningClient::new(endpoint, config.region.clone(), token, config.request_timeout)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            Ok(Arc::new(client))
        }
        ProviderType::InMemory => {
            info!("Using in-memory provisioning service");
            Ok(Arc::new(InMemoryProvisioningClient::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_provider_requires_endpoint() {
        let config = ProviderConfig::default();
        assert!(matches!(from_config(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_token_variable_is_reported() {
        let config = ProviderConfig {
            endpoint: Some("http://localhost:4000".to_string()),
            api_token: Some("env:DEVENV_TEST_TOKEN_THAT_IS_NOT_SET".to_string()),
            ..ProviderConfig::default()
        };
        assert!(matches!(from_config(&config), Err(ConfigError::MissingEnv(_))));
    }

    #[tokio::test]
    async fn test_in_memory_provider() {
        let config = ProviderConfig {
            provider_type: ProviderType::InMemory,
            ..ProviderConfig::default()
        };
        let client = from_config(&config).unwrap();
        assert_eq!(client.caller_identity().await.unwrap(), in_memory::DEFAULT_ACCOUNT);
    }
}
