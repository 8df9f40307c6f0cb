// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Dashboard Display Model
//!
//! [`DisplayRecord`] is the aggregated status-and-endpoint view of a single
//! stack served by `GET /api/systems`. Records are assembled in one step from
//! a listing row, the stack outputs and the readiness of each probed endpoint,
//! so a record is never observed half-built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::stack::{StackOutputs, StackSummary};

/// Label shown instead of a URL when its endpoint did not answer.
pub const NOT_READY: &str = "Not Ready";

/// Output key carrying the stack's public address.
pub const ADDRESS_OUTPUT_KEY: &str = "Address";

/// Port of the kotsadm admin console on the stack address.
pub const KOTSADM_PORT: u16 = 8800;

/// Path of the PEM bundle served by the certificate authority endpoint.
pub const CA_PEM_PATH: &str = "/v1/pki/ca/pem";

/// Endpoints exposed by a stack that get a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Login,
    Api,
    CertificateAuthority,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 3] = [
        EndpointKind::Login,
        EndpointKind::Api,
        EndpointKind::CertificateAuthority,
    ];

    pub fn output_key(&self) -> &'static str {
        match self {
            EndpointKind::Login => "Login",
            EndpointKind::Api => "Api",
            EndpointKind::CertificateAuthority => "CA",
        }
    }

    /// URL shown on the dashboard for an endpoint host.
    pub fn display_url(&self, host: &str) -> String {
        match self {
            EndpointKind::Login | EndpointKind::Api => format!("https://{}", host),
            EndpointKind::CertificateAuthority => format!("https://{}{}", host, CA_PEM_PATH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// An endpoint host taken from the stack outputs, waiting to be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    pub kind: EndpointKind,
    pub host: String,
}

/// Endpoint hosts present in `outputs`, in [`EndpointKind::ALL`] order.
pub fn endpoint_targets(outputs: &StackOutputs) -> Vec<EndpointTarget> {
    EndpointKind::ALL
        .iter()
        .filter_map(|kind| {
            outputs
                .get(kind.output_key())
                .filter(|host| !host.is_empty())
                .map(|host| EndpointTarget {
                    kind: *kind,
                    host: host.to_string(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub account: String,
    pub name: String,
    pub status: String,
    pub address: String,
    #[serde(rename = "kotsadm-url")]
    pub kotsadm_url: String,
    pub api: String,
    pub login: String,
    pub ca: String,
    pub created: DateTime<Utc>,
}

impl DisplayRecord {
    /// Assemble a record. An endpoint without a probe result counts as not ready;
    /// an endpoint missing from the outputs renders as an empty string.
    pub fn assemble(
        account: &str,
        summary: &StackSummary,
        outputs: &StackOutputs,
        probes: &[(EndpointKind, Readiness)],
    ) -> Self {
        let label = |kind: EndpointKind| -> String {
            match outputs.get(kind.output_key()).filter(|h| !h.is_empty()) {
                None => String::new(),
                Some(host) => {
                    let ready = probes
                        .iter()
                        .any(|(probed, readiness)| *probed == kind && readiness.is_ready());
                    if ready {
                        kind.display_url(host)
                    } else {
                        NOT_READY.to_string()
                    }
                }
            }
        };

        let address = outputs.get(ADDRESS_OUTPUT_KEY).unwrap_or_default().to_string();
        let kotsadm_url = if address.is_empty() {
            String::new()
        } else {
            format!("http://{}:{}", address, KOTSADM_PORT)
        };

        Self {
            account: account.to_string(),
            name: summary.name.clone(),
            status: summary.status.clone(),
            kotsadm_url,
            address,
            api: label(EndpointKind::Api),
            login: label(EndpointKind::Login),
            ca: label(EndpointKind::CertificateAuthority),
            created: summary.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> StackSummary {
        StackSummary {
            name: "dev1".to_string(),
            status: "CREATE_COMPLETE".to_string(),
            created: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn outputs() -> StackOutputs {
        [
            ("Address", "10.0.0.5"),
            ("Login", "login.dev1.example.com"),
            ("Api", "api.dev1.example.com"),
            ("CA", "ca.dev1.example.com"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_targets_follow_output_keys() {
        let targets = endpoint_targets(&outputs());
        let kinds: Vec<_> = targets.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, EndpointKind::ALL.to_vec());
        assert_eq!(targets[2].host, "ca.dev1.example.com");

        let partial: StackOutputs = [("Address", "10.0.0.5"), ("Api", "")].into_iter().collect();
        assert!(endpoint_targets(&partial).is_empty());
    }

    #[test]
    fn test_assemble_all_ready() {
        let probes: Vec<_> = EndpointKind::ALL.iter().map(|k| (*k, Readiness::Ready)).collect();
        let record = DisplayRecord::assemble("123456789012", &summary(), &outputs(), &probes);

        assert_eq!(record.account, "123456789012");
        assert_eq!(record.name, "dev1");
        assert_eq!(record.status, "CREATE_COMPLETE");
        assert_eq!(record.address, "10.0.0.5");
        assert_eq!(record.kotsadm_url, "http://10.0.0.5:8800");
        assert_eq!(record.login, "https://login.dev1.example.com");
        assert_eq!(record.api, "https://api.dev1.example.com");
        assert_eq!(record.ca, "https://ca.dev1.example.com/v1/pki/ca/pem");
    }

    #[test]
    fn test_assemble_downgrades_each_endpoint_independently() {
        let probes = vec![
            (EndpointKind::Login, Readiness::Ready),
            (EndpointKind::Api, Readiness::NotReady),
        ];
        let record = DisplayRecord::assemble("acct", &summary(), &outputs(), &probes);

        assert_eq!(record.login, "https://login.dev1.example.com");
        assert_eq!(record.api, NOT_READY);
        // CA was never probed.
        assert_eq!(record.ca, NOT_READY);
    }

    #[test]
    fn test_assemble_without_outputs() {
        let record = DisplayRecord::assemble("acct", &summary(), &StackOutputs::new(), &[]);
        assert_eq!(record.address, "");
        assert_eq!(record.kotsadm_url, "");
        assert_eq!(record.login, "");
    }

    #[test]
    fn test_json_field_names() {
        let record = DisplayRecord::assemble("acct", &summary(), &outputs(), &[]);
        let json = serde_json::to_value(&record).unwrap();
        for field in ["account", "name", "status", "address", "kotsadm-url", "api", "login", "ca", "created"] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(json["created"], "2026-03-01T12:00:00Z");
    }
}
