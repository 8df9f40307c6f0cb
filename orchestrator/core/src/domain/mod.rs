// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Stack identity and status, the provisioning service port, the destroy poll
//! state machine, the dashboard display model and configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and rules; no clocks, sockets or files except config loading

pub mod config;
pub mod display;
pub mod poll;
pub mod provisioning;
pub mod stack;
