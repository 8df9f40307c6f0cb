// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! devenv core
//!
//! Stack lifecycle orchestration (destroy polling, glass) and the multi-stack
//! dashboard aggregator.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, application services, provisioning adapters and the HTTP facade

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
