// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod aggregator;
pub mod lifecycle;
pub mod readiness;
pub mod stack_handle;
pub mod status_poller;

// Re-export services for convenience
pub use aggregator::{AggregationError, AggregationReport, StackAggregator, StackFailure};
pub use lifecycle::{DestroyReport, GlassReport, LifecycleError, LifecycleOrchestrator};
pub use readiness::{HttpReadinessProbe, ProbeSettings, ReadinessProbe};
pub use stack_handle::StackHandle;
pub use status_poller::{PollObserver, PollOutcome, PollSample, PollerSettings, StatusPoller, TracingObserver};
