// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`devenv-core`)
//!
//! HTTP surface of the dashboard. Handlers only translate requests into
//! [`StackAggregator`](crate::application::StackAggregator) calls and shape
//! the JSON responses.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /api/systems` | Array of display records; `[]` with 500 on failure |
//! | `GET /api/systems/report` | Records plus per-stack failures |
//! | `GET /api/` | Liveness ping |
//! | `GET /health` | Status and uptime |
//! | `/*` | Static assets, when an assets directory is configured |

pub mod api;

pub use api::{app, DashboardState};
