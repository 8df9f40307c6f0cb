// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Readiness Probe
//!
//! Classifies a stack endpoint as ready or not by issuing one GET request.
//! Probes never fail: any connection or TLS error just means `NotReady`.
//!
//! Stack control planes serve self-issued certificates, so certificate
//! validation is disabled on the probe's own `reqwest::Client`. No other
//! client in the process is affected.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::config::DashboardConfig;
use crate::domain::display::Readiness;

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn probe(&self, host: &str) -> Readiness;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub scheme: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for ProbeSettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            scheme: config.probe_scheme.clone(),
            timeout: config.probe_timeout,
            accept_invalid_certs: true,
        }
    }
}

pub struct HttpReadinessProbe {
    client: reqwest::Client,
    scheme: String,
}

impl HttpReadinessProbe {
    pub fn new(settings: &ProbeSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            scheme: settings.scheme.clone(),
        })
    }

    fn url_for(&self, host: &str) -> String {
        format!("{}://{}", self.scheme, host)
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn probe(&self, host: &str) -> Readiness {
        let url = self.url_for(host);
        let readiness = match self.client.get(&url).send().await {
            // Any HTTP answer means the endpoint is up.
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Endpoint answered");
                Readiness::Ready
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Endpoint not ready");
                Readiness::NotReady
            }
        };

        let label = if readiness.is_ready() { "ready" } else { "not_ready" };
        metrics::counter!("devenv_readiness_probes_total", "result" => label).increment(1);
        readiness
    }
}
