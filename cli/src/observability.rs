// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Logging and metrics initialization

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

use devenv_core::domain::config::{DevEnvConfigManifest, LoggingConfig, MetricsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "compact" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unsupported log format '{}' (expected 'text' or 'json')", other),
        }
    }
}

/// Effective log level and format: command-line flags, then the manifest, then defaults.
pub fn logging_settings(
    level_flag: Option<&str>,
    format_flag: Option<&str>,
    config: &DevEnvConfigManifest,
) -> Result<(String, LogFormat)> {
    let configured: Option<&LoggingConfig> = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.logging.as_ref());

    let level = level_flag
        .map(str::to_string)
        .or_else(|| configured.map(|l| l.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let format = format_flag
        .or_else(|| configured.map(|l| l.format.as_str()))
        .unwrap_or("text");

    Ok((level, LogFormat::parse(format)?))
}

/// Initialize tracing subscriber for logging
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Start the Prometheus scrape endpoint when metrics are enabled.
pub fn init_metrics(config: &DevEnvConfigManifest) -> Result<()> {
    let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
        .filter(|m: &&MetricsConfig| m.enabled)
    else {
        return Ok(());
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devenv_core::domain::config::ObservabilityConfig;

    #[test]
    fn test_flags_override_manifest() {
        let mut config = DevEnvConfigManifest::default();
        config.spec.observability = Some(ObservabilityConfig {
            logging: Some(LoggingConfig {
                level: "debug".to_string(),
                format: "json".to_string(),
            }),
            metrics: None,
        });

        assert_eq!(
            logging_settings(None, None, &config).unwrap(),
            ("debug".to_string(), LogFormat::Json)
        );
        assert_eq!(
            logging_settings(Some("warn"), Some("text"), &config).unwrap(),
            ("warn".to_string(), LogFormat::Text)
        );
    }

    #[test]
    fn test_defaults_without_observability() {
        let config = DevEnvConfigManifest::default();
        assert_eq!(
            logging_settings(None, None, &config).unwrap(),
            ("info".to_string(), LogFormat::Text)
        );
        assert!(LogFormat::parse("xml").is_err());
    }

    #[test]
    fn test_metrics_disabled_is_noop() {
        assert!(init_metrics(&DevEnvConfigManifest::default()).is_ok());
    }
}
