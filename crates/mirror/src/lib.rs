// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Mirror - static reflection for Rust types
//!
//! Types describe their data members and embedded bases once, through a
//! registration function; generic code then enumerates, queries, reads and
//! writes those members through type-erased property handles.
//!
//! ## Quick Start
//!
//! ```rust
//! use mirror::{Accessibility, AccessFilter, Reflect, Registry};
//!
//! #[derive(Reflect, Default)]
//! #[reflect(name = "Motor", description = "Drive motor state")]
//! pub struct Motor {
//!     pub rpm: u32,
//!     pub(crate) temperature: f32,
//!     serial: String,
//! }
//!
//! let registry = Registry::new();
//! let motor = registry.get_type::<Motor>().unwrap();
//! let props = motor.properties().unwrap();
//!
//! let mut m = Motor::default();
//! props.get_by_name("rpm").unwrap().set(&mut m, 1200u32).unwrap();
//! assert_eq!(m.rpm, 1200);
//!
//! let visible = props.get_all_by_access(Accessibility::Protected, AccessFilter::DownTo);
//! assert_eq!(visible.len(), 2);
//! assert!(registry.get_by_name("Motor").is_some());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  Registry   TypeId -> TypeDescriptor, name -> TypeId           |
//! +---------------------------------------------------------------+
//! |  TypeDescriptor   name | flags | Properties | BaseClass edges  |
//! +---------------------------------------------------------------+
//! |  Properties   by member | by index | by name, base-first view  |
//! +---------------------------------------------------------------+
//! |  Property   Member<T, V> accessors behind dyn Property         |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Lazily built cache of type descriptors |
//! | [`Reflect`] | Static registration function of a type |
//! | [`Mirror`] | Registration DSL passed to [`Reflect::reflect`] |
//! | [`TypeDescriptor`] | Metadata of one type |
//! | [`Properties`] | Members of one class type, bases merged in |
//! | [`Property`] | One member, erased over owner and value types |
//! | [`Member`] | Field handle built with [`member!`] |
//!
//! ## Environment
//!
//! The global registry reads `MIRROR_DUPLICATES` and `MIRROR_CASCADE`; see
//! [`RegistryConfig`].

// Allow the derive macro to work inside this crate's tests
extern crate self as mirror;

/// Ordered accessibility scale and filter modes.
pub mod accessibility;
/// Registry configuration and duplicate policy.
pub mod config;
/// Registration DSL.
pub mod dsl;
/// Error type.
pub mod error;
/// Static type trait flags.
pub mod flags;
/// Process-wide type identities.
pub mod identity;
/// Field handles.
pub mod member;
/// Property descriptors and collections.
pub mod property;
/// The `Reflect` trait.
pub mod reflect;
/// Type descriptor cache.
pub mod registry;
/// Per-type metadata.
pub mod type_descriptor;

pub use accessibility::{AccessFilter, Accessibility};
pub use config::{DuplicatePolicy, RegistryConfig};
pub use dsl::{Mirror, PropertyBuilder};
pub use error::{ReflectError, Result};
pub use flags::TypeFlags;
pub use identity::TypeIdentity;
pub use member::{Member, MemberKey};
pub use property::{Properties, Property, PropertyInfo, PropertyRef};
pub use reflect::Reflect;
pub use registry::Registry;
pub use type_descriptor::{BaseClass, TypeDescriptor, TypeState};

// Derive macro (for #[derive(mirror::Reflect)])
#[cfg(feature = "derive")]
pub use mirror_codegen::Reflect;

use std::sync::Arc;

/// Descriptor of `T` from the global registry, registering it on first use.
pub fn get_type<T: Reflect>() -> Result<Arc<TypeDescriptor>> {
    Registry::global().get_type::<T>()
}

/// Descriptor declared under `name` in the global registry.
pub fn get_type_by_name(name: &str) -> Option<Arc<TypeDescriptor>> {
    Registry::global().get_by_name(name)
}

/// True when `T` is registered in the global registry.
pub fn is_registered<T: 'static>() -> bool {
    Registry::global().is_registered::<T>()
}

/// Evict `T` from the global registry.
pub fn clear<T: 'static>() -> bool {
    Registry::global().evict::<T>()
}

/// Empty the global registry. `false` when called from a registration
/// callback.
pub fn clear_all() -> bool {
    Registry::global().clear()
}
