// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by registration and property access.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors raised while registering types or accessing properties.
///
/// Registration errors abort the whole registration session: every
/// descriptor created during that session is evicted before the error is
/// returned, so a failed registration never leaves a half-built type in the
/// registry. Access errors are local to the call that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    // ========================================================================
    // Access Errors
    // ========================================================================
    /// Requested value type differs from the property's declared value type.
    #[error("type mismatch: property holds {expected}, requested {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Object handed to a property is not an instance of its owning type.
    #[error("object mismatch: property belongs to {expected}, object is {found}")]
    ObjectMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// The same member was registered twice on one type.
    #[error("member '{field}' of {owner} is already registered")]
    DuplicateMember { owner: &'static str, field: &'static str },
    /// Two members of one type were given the same index.
    #[error("index {index} is already used by another member of {owner}")]
    DuplicateIndex { owner: &'static str, index: u32 },
    /// Two members of one type were given the same name.
    #[error("property name '{name}' is already used on {owner}")]
    DuplicatePropertyName { owner: &'static str, name: String },
    /// A declared type name is already claimed by another type.
    #[error("type name '{name}' is already declared by {existing}")]
    DuplicateTypeName { name: String, existing: &'static str },
    /// A type (directly or transitively) lists itself as a base class.
    #[error("{owner} cannot derive from {base}: base is still being registered")]
    CyclicBaseClass {
        owner: &'static str,
        base: &'static str,
    },
    /// Members or bases were registered on a type without the CLASS flag.
    #[error("{0} is not a class type and cannot hold properties")]
    NotAClass(&'static str),

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No ready type is registered under this name.
    #[error("type not found: {0}")]
    TypeNotFound(String),
    /// No property matches this index or name.
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The global registry was already initialised.
    #[error("global registry is already initialized")]
    AlreadyInitialized,
}

impl ReflectError {
    /// True for errors raised by the registration DSL.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateMember { .. }
                | Self::DuplicateIndex { .. }
                | Self::DuplicatePropertyName { .. }
                | Self::DuplicateTypeName { .. }
                | Self::CyclicBaseClass { .. }
                | Self::NotAClass(_)
        )
    }
}
