// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// devenv Configuration Types
//
// Defines the configuration schema for the devenv CLI and dashboard:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Provisioning service connection settings
// - Default stack definition (name, template, parameters)
// - Destroy polling cadence and deadline
// - Dashboard bind address, probe settings and fan-out
// - Logging and metrics settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::stack::{StackName, StackSpec};

pub const API_VERSION: &str = "devenv/v1";
pub const KIND: &str = "DevEnvConfig";
pub const CONFIG_PATH_ENV: &str = "DEVENV_CONFIG_PATH";
pub const STACK_NAME_ENV: &str = "DEVENV_STACK_NAME";
pub const PROVIDER_ENDPOINT_ENV: &str = "DEVENV_PROVIDER_ENDPOINT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Environment variable '{0}' referenced by config is not set")]
    MissingEnv(String),
}

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevEnvConfigManifest {
    /// API version (must be "devenv/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DevEnvConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: DevEnvConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevEnvConfigSpec {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Default stack used when a command is given no name
    #[serde(default)]
    pub stack: StackConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    /// JSON gateway in front of the cloud provisioning API
    Http,
    /// Process-local simulation, for dry runs
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    /// Base URL of the provisioning gateway (required for `http`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Bearer token (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::Http,
            endpoint: None,
            region: None,
            api_token: None,
            request_timeout: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Resolve `api_token`, expanding an `env:VAR_NAME` reference.
    pub fn resolve_api_token(&self) -> Result<Option<String>, ConfigError> {
        match self.api_token.as_deref() {
            None => Ok(None),
            Some(token) => match token.strip_prefix("env:") {
                Some(var) => std::env::var(var)
                    .map(Some)
                    .map_err(|_| ConfigError::MissingEnv(var.to_string())),
                None => Ok(Some(token.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Template location handed to the provisioning service on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// SSH key pair attached to stack instances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StackConfig {
    /// Build the creation request for `name` from the configured template.
    pub fn spec_for(&self, name: &StackName) -> Result<StackSpec, ConfigError> {
        let template = self
            .template
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Invalid("spec.stack.template is required to create a stack".to_string()))?;

        let mut parameters = self.parameters.clone();
        if let Some(key_name) = &self.key_name {
            parameters.entry("KeyName".to_string()).or_insert_with(|| key_name.clone());
        }

        Ok(StackSpec {
            name: name.clone(),
            template,
            key_name: self.key_name.clone(),
            parameters,
            tags: self.tags.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Delay between destroy status polls
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Give up on a destroy after this long
    #[serde(default = "default_destroy_timeout", with = "humantime_serde")]
    pub destroy_timeout: Duration,

    /// Consecutive non-absence status failures tolerated (0 = unlimited)
    #[serde(default = "default_max_unknown_polls")]
    pub max_unknown_polls: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            destroy_timeout: default_destroy_timeout(),
            max_unknown_polls: default_max_unknown_polls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_dashboard_port")]
    pub port: u16,

    /// Directory of static dashboard assets served at `/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,

    /// Scheme used for readiness probes ("https" in production)
    #[serde(default = "default_probe_scheme")]
    pub probe_scheme: String,

    /// Stacks aggregated concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_dashboard_port(),
            assets_dir: None,
            probe_timeout: default_probe_timeout(),
            probe_scheme: default_probe_scheme(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_destroy_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_max_unknown_polls() -> u32 {
    3
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dashboard_port() -> u16 {
    8080
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_probe_scheme() -> String {
    "https".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for DevEnvConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "devenv".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                labels: None,
            },
            spec: DevEnvConfigSpec::default(),
        }
    }
}

impl DevEnvConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Standard locations checked after the `--config` flag, in order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./devenv-config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".devenv").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/devenv/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\devenv\\config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    /// 1. DEVENV_CONFIG_PATH environment variable
    /// 2. ./devenv-config.yaml (working directory)
    /// 3. ~/.devenv/config.yaml (user home)
    /// 4. /etc/devenv/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration: explicit path (must exist), then discovery, then defaults.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup(STACK_NAME_ENV).filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: {}={}", STACK_NAME_ENV, name);
            self.spec.stack.name = Some(name);
        }

        if let Some(endpoint) = lookup(PROVIDER_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: {}={}", PROVIDER_ENDPOINT_ENV, endpoint);
            self.spec.provider.endpoint = Some(endpoint);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.api_version != API_VERSION {
            return invalid(format!(
                "apiVersion '{}' is not supported. Must be '{}'",
                self.api_version, API_VERSION
            ));
        }
        if self.kind != KIND {
            return invalid(format!("kind '{}' is not supported. Must be '{}'", self.kind, KIND));
        }
        if self.metadata.name.is_empty() {
            return invalid("metadata.name cannot be empty".to_string());
        }

        let provider = &self.spec.provider;
        if provider.provider_type == ProviderType::Http
            && provider.endpoint.as_deref().map_or(true, str::is_empty)
        {
            return invalid("spec.provider.endpoint is required for the http provider".to_string());
        }

        if let Some(name) = &self.spec.stack.name {
            StackName::new(name.as_str())
                .map_err(|e| ConfigError::Invalid(format!("spec.stack.name: {}", e)))?;
        }

        let lifecycle = &self.spec.lifecycle;
        if lifecycle.poll_interval.is_zero() {
            return invalid("spec.lifecycle.poll_interval must be greater than zero".to_string());
        }
        if lifecycle.poll_interval >= lifecycle.destroy_timeout {
            return invalid(format!(
                "spec.lifecycle.poll_interval ({:?}) must be shorter than destroy_timeout ({:?})",
                lifecycle.poll_interval, lifecycle.destroy_timeout
            ));
        }

        let dashboard = &self.spec.dashboard;
        if dashboard.concurrency == 0 {
            return invalid("spec.dashboard.concurrency must be at least 1".to_string());
        }
        if !matches!(dashboard.probe_scheme.as_str(), "http" | "https") {
            return invalid(format!(
                "spec.dashboard.probe_scheme '{}' must be 'http' or 'https'",
                dashboard.probe_scheme
            ));
        }

        Ok(())
    }

    /// Configured default stack name, validated.
    pub fn default_stack_name(&self) -> Option<StackName> {
        self.spec
            .stack
            .name
            .as_deref()
            .and_then(|name| StackName::new(name).ok())
    }
}
