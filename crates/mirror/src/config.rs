// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration.
//!
//! # Environment
//!
//! | Variable            | Values                          | Default  |
//! |---------------------|---------------------------------|----------|
//! | `MIRROR_DUPLICATES` | `reject`, `overwrite`           | `reject` |
//! | `MIRROR_CASCADE`    | `1/0`, `true/false`, `on/off`   | `on`     |
//!
//! Unparseable values are ignored with a warning and the default is kept.

use std::fmt;
use std::str::FromStr;

use crate::error::ReflectError;

pub const ENV_DUPLICATES: &str = "MIRROR_DUPLICATES";
pub const ENV_CASCADE: &str = "MIRROR_CASCADE";

/// What to do when a registration reuses a member, index or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Fail the registration with a typed error.
    #[default]
    Reject,
    /// Later registration wins every lookup.
    Overwrite,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = ReflectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(ReflectError::InvalidConfig(format!(
                "unknown duplicate policy '{}'",
                other
            ))),
        }
    }
}

/// Registry behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Handling of duplicate members, indices and names.
    pub duplicates: DuplicatePolicy,

    /// Reflect each member's value type when the member is registered.
    pub cascade_member_types: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::Reject,
            cascade_member_types: true,
        }
    }
}

impl RegistryConfig {
    /// Defaults overridden by `MIRROR_DUPLICATES` and `MIRROR_CASCADE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DUPLICATES) {
            match raw.parse() {
                Ok(policy) => config.duplicates = policy,
                Err(e) => log::warn!("[RegistryConfig] Ignoring {}: {}", ENV_DUPLICATES, e),
            }
        }

        if let Some(raw) = lookup(ENV_CASCADE) {
            match parse_switch(&raw) {
                Some(on) => config.cascade_member_types = on,
                None => log::warn!(
                    "[RegistryConfig] Ignoring {}: expected on/off, got '{}'",
                    ENV_CASCADE,
                    raw
                ),
            }
        }

        config
    }

    /// Set the duplicate policy.
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Enable or disable member type cascading.
    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade_member_types = cascade;
        self
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
