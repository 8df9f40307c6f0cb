// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Destroy Poll State Machine
//!
//! Pure bookkeeping for the destroy poller: no clocks, no I/O. The
//! application layer feeds it one [`StackStatus`] per tick together with the
//! elapsed time since polling began, and acts on the returned [`PollState`].
//!
//! ## Transition Table
//! | Observation | Elapsed | Next state |
//! |-------------|---------|------------|
//! | any | ≥ timeout | `TimedOut` |
//! | `Deleted` | < timeout | `Completed` |
//! | `Active(status)` | < timeout | `Polling` (status recorded) |
//! | `Unknown` | < timeout, under the unknown budget | `Polling` |
//! | `Unknown` | < timeout, budget exhausted | `StatusUnavailable` |

use std::time::Duration;

use crate::domain::stack::StackStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
    TimedOut,
    /// Too many consecutive status calls failed for reasons other than absence.
    StatusUnavailable,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling)
    }
}

#[derive(Debug, Clone)]
pub struct DestroyPoll {
    timeout: Duration,
    max_consecutive_unknown: u32,
    state: PollState,
    attempts: u32,
    consecutive_unknown: u32,
    last_status: Option<String>,
    last_unknown: Option<String>,
}

impl DestroyPoll {
    /// `max_consecutive_unknown == 0` disables the unknown budget; only the
    /// deadline then bounds a run of failing status calls.
    pub fn new(timeout: Duration, max_consecutive_unknown: u32) -> Self {
        Self {
            timeout,
            max_consecutive_unknown,
            state: PollState::Polling,
            attempts: 0,
            consecutive_unknown: 0,
            last_status: None,
            last_unknown: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn last_unknown(&self) -> Option<&str> {
        self.last_unknown.as_deref()
    }

    /// Record one status observation taken `elapsed` after polling began.
    pub fn observe(&mut self, elapsed: Duration, status: &StackStatus) -> PollState {
        if self.state.is_terminal() {
            return self.state;
        }

        self.attempts += 1;

        if elapsed >= self.timeout {
            self.state = PollState::TimedOut;
            return self.state;
        }

        match status {
            StackStatus::Deleted => {
                self.state = PollState::Completed;
            }
            StackStatus::Active(current) => {
                self.consecutive_unknown = 0;
                self.last_status = Some(current.clone());
            }
            StackStatus::Unknown(reason) => {
                self.consecutive_unknown += 1;
                self.last_unknown = Some(reason.clone());
                if self.max_consecutive_unknown > 0
                    && self.consecutive_unknown >= self.max_consecutive_unknown
                {
                    self.state = PollState::StatusUnavailable;
                }
            }
        }

        self.state
    }

    /// The deadline fired while waiting for the next tick.
    pub fn expire(&mut self) -> PollState {
        if !self.state.is_terminal() {
            self.state = PollState::TimedOut;
        }
        self.state
    }

    /// The deadline fired while a status call was outstanding. The call was
    /// issued, so it counts as an attempt.
    pub fn expire_in_flight(&mut self) -> PollState {
        if !self.state.is_terminal() {
            self.attempts += 1;
        }
        self.expire()
    }
}
