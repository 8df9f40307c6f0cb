// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dashboard commands
//!
//! Commands: systems, serve

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use devenv_core::application::{HttpReadinessProbe, ProbeSettings, StackAggregator};
use devenv_core::domain::config::DevEnvConfigManifest;
use devenv_core::infrastructure::provisioning;
use devenv_core::presentation::{app, DashboardState};

fn aggregator(config: &DevEnvConfigManifest) -> Result<StackAggregator> {
    let client = provisioning::from_config(&config.spec.provider).context("Failed to create provisioning client")?;
    let probe = HttpReadinessProbe::new(&ProbeSettings::from(&config.spec.dashboard))
        .context("Failed to create readiness probe client")?;

    Ok(StackAggregator::new(
        client,
        Arc::new(probe),
        config.spec.dashboard.concurrency,
    ))
}

/// One-shot aggregation printed as JSON.
pub async fn systems(config: &DevEnvConfigManifest, report: bool) -> Result<()> {
    let result = aggregator(config)?
        .aggregate()
        .await
        .context("Failed to aggregate stacks")?;

    let json = if report {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.records)?
    };
    println!("{}", json);

    if result.partial {
        for failure in &result.failures {
            eprintln!("warning: {}: {}", failure.name, failure.error);
        }
    }
    Ok(())
}

pub async fn serve(config: &DevEnvConfigManifest, port_override: Option<u16>) -> Result<()> {
    let dashboard = &config.spec.dashboard;
    let state = Arc::new(DashboardState::new(aggregator(config)?));
    let router = app(state, dashboard.assets_dir.clone());

    let addr = format!("{}:{}", dashboard.bind_address, port_override.unwrap_or(dashboard.port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Dashboard listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Dashboard shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
