// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP adapter for the provisioning gateway
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /stacks` |
//! | describe | `GET /stacks/{name}` |
//! | create | `POST /stacks` |
//! | delete | `DELETE /stacks/{name}` |
//! | outputs | `GET /stacks/{name}/outputs` |
//! | identity | `GET /identity` |
//!
//! Non-2xx responses carry `{"code": "...", "message": "..."}`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::provisioning::{DescribedStack, ProvisioningClient, ProvisioningError};
use crate::domain::stack::{StackName, StackOutputs, StackSpec, StackSummary};

pub const REGION_HEADER: &str = "x-devenv-region";

#[derive(Debug, Clone)]
pub struct HttpProvisioningClient {
    client: Client,
    base_url: String,
    region: Option<String>,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct StackList {
    stacks: Vec<StackSummary>,
}

#[derive(Deserialize)]
struct OutputEntry {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct OutputList {
    outputs: Vec<OutputEntry>,
}

#[derive(Deserialize)]
struct Identity {
    account: String,
}

impl HttpProvisioningClient {
    pub fn new(
        base_url: impl Into<String>,
        region: Option<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProvisioningError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisioningError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            region,
            api_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.region {
            Some(region) => request.header(REGION_HEADER, region),
            None => request,
        };
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProvisioningError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProvisioningError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %body, "Provisioning gateway returned error");
        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => (err.code, err.message),
            Err(_) => (format!("Http{}", status.as_u16()), body),
        };

        Err(ProvisioningError::Service {
            code,
            message,
            status: Some(status.as_u16()),
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ProvisioningError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ProvisioningError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ProvisioningClient for HttpProvisioningClient {
    async fn create_stack(&self, spec: &StackSpec) -> Result<(), ProvisioningError> {
        self.send(self.client.post(self.url("/stacks")).json(spec)).await?;
        Ok(())
    }

    async fn delete_stack(&self, name: &StackName) -> Result<(), ProvisioningError> {
        self.send(self.client.delete(self.url(&format!("/stacks/{}", name))))
            .await?;
        Ok(())
    }

    async fn describe_stack(&self, name: &StackName) -> Result<DescribedStack, ProvisioningError> {
        #[derive(Deserialize)]
        struct Described {
            name: String,
            status: String,
        }

        let response = self
            .send(self.client.get(self.url(&format!("/stacks/{}", name))))
            .await?;
        let described: Described = Self::json(response).await?;

        Ok(DescribedStack {
            name: described.name,
            status: described.status,
        })
    }

    async fn stack_outputs(&self, name: &StackName) -> Result<StackOutputs, ProvisioningError> {
        let response = self
            .send(self.client.get(self.url(&format!("/stacks/{}/outputs", name))))
            .await?;
        let list: OutputList = Self::json(response).await?;

        Ok(list.outputs.into_iter().map(|o| (o.key, o.value)).collect())
    }

    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProvisioningError> {
        let response = self.send(self.client.get(self.url("/stacks"))).await?;
        let list: StackList = Self::json(response).await?;
        Ok(list.stacks)
    }

    async fn caller_identity(&self) -> Result<String, ProvisioningError> {
        let response = self.send(self.client.get(self.url("/identity"))).await?;
        let identity: Identity = Self::json(response).await?;
        Ok(identity.account)
    }
}
