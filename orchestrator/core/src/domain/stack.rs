// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stack Domain Model
//!
//! A *stack* is a named, deployed environment instance owned by the
//! provisioning service. This crate only ever references stacks by name; it
//! never owns their lifetime.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`StackName`] | Validated stack identifier |
//! | [`StackSummary`] | One row of a stack listing (name, status, created) |
//! | [`StackOutputs`] | Output key → value map exposed once provisioning completes |
//! | [`StackStatus`] | Three-valued status probe result used by the destroy poller |
//! | [`StackSpec`] | Everything needed to (re)create a stack |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum stack name length accepted by the provisioning service.
pub const MAX_STACK_NAME_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    /// Validate and wrap a stack name.
    ///
    /// Names must start with a letter and contain only ASCII alphanumerics and
    /// hyphens, mirroring the provisioning service's own naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidStackName> {
        let name = name.into();
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(InvalidStackName::Empty);
        }
        if trimmed.len() > MAX_STACK_NAME_LEN {
            return Err(InvalidStackName::TooLong(trimmed.len()));
        }
        if !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(InvalidStackName::BadStart(trimmed.to_string()));
        }
        if let Some(c) = trimmed.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(InvalidStackName::BadCharacter {
                name: trimmed.to_string(),
                character: c,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StackName {
    type Error = InvalidStackName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StackName> for String {
    fn from(name: StackName) -> Self {
        name.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStackName {
    #[error("stack name cannot be empty")]
    Empty,
    #[error("stack name is {0} characters long (max {MAX_STACK_NAME_LEN})")]
    TooLong(usize),
    #[error("stack name '{0}' must start with a letter")]
    BadStart(String),
    #[error("stack name '{name}' contains invalid character '{character}'")]
    BadCharacter { name: String, character: char },
}

/// One entry of a stack listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    pub name: String,
    pub status: String,
    pub created: DateTime<Utc>,
}

/// Output key → value mapping of a provisioned stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackOutputs(BTreeMap<String, String>);

impl StackOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StackOutputs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of asking the provisioning service for a stack's status.
///
/// `Deleted` is only produced when the service answered with an explicit
/// "stack does not exist" error code. Every other failure is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    Active(String),
    Deleted,
    Unknown(String),
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackStatus::Active(status) => f.write_str(status),
            StackStatus::Deleted => f.write_str("DELETE_COMPLETE"),
            StackStatus::Unknown(reason) => write!(f, "UNKNOWN ({})", reason),
        }
    }
}

/// Everything the provisioning service needs to create a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSpec {
    pub name: StackName,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
