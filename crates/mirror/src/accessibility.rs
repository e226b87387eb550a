// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Property accessibility scale and filters.

use std::fmt;
use std::str::FromStr;

use crate::error::ReflectError;

/// Ordered visibility tag attached to a property.
///
/// `Public < Protected < Private`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Accessibility {
    /// All levels in scale order.
    pub const ALL: [Self; 3] = [Self::Public, Self::Protected, Self::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Accessibility {
    type Err = ReflectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "protected" => Ok(Self::Protected),
            "private" => Ok(Self::Private),
            other => Err(ReflectError::InvalidConfig(format!(
                "unknown accessibility '{}'",
                other
            ))),
        }
    }
}

/// Comparison used when filtering properties by accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessFilter {
    /// Everything from `Public` down to the given level (`<=`).
    DownTo,
    /// The given level and everything more restricted (`>=`).
    UpFrom,
    /// Exactly the given level.
    Exactly,
    /// Every level except the given one.
    Except,
}

impl AccessFilter {
    /// Check `candidate` against `level` with this comparison.
    pub fn matches(self, candidate: Accessibility, level: Accessibility) -> bool {
        match self {
            Self::DownTo => candidate <= level,
            Self::UpFrom => candidate >= level,
            Self::Exactly => candidate == level,
            Self::Except => candidate != level,
        }
    }
}
