// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::aggregator::StackAggregator;

pub struct DashboardState {
    pub aggregator: StackAggregator,
    pub start_time: Instant,
}

impl DashboardState {
    pub fn new(aggregator: StackAggregator) -> Self {
        Self {
            aggregator,
            start_time: Instant::now(),
        }
    }
}

/// Dashboard router. Unknown paths fall through to `assets_dir` when set.
pub fn app(state: Arc<DashboardState>, assets_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/", get(ping_handler))
        .route("/api/systems", get(systems_handler))
        .route("/api/systems/report", get(report_handler))
        .with_state(state);

    let router = match assets_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn health_handler(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn ping_handler() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

async fn systems_handler(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    match state.aggregator.aggregate().await {
        Ok(report) => (StatusCode::OK, Json(json!(report.records))),
        Err(e) => {
            error!(error = %e, "Failed to aggregate stacks");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!([])))
        }
    }
}

async fn report_handler(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    match state.aggregator.aggregate().await {
        Ok(report) => (StatusCode::OK, Json(json!(report))),
        Err(e) => {
            error!(error = %e, "Failed to aggregate stacks");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}
