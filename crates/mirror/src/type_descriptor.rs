// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type metadata nodes.
//!
//! # Lifecycle
//!
//! ```text
//! (absent) --get_type--> Registering --callback returns--> Staged
//!                                                            |
//!                              outermost get_type returns    v
//!                                                          Ready --evict/clear--> Destroyed
//! ```
//!
//! A descriptor is inserted into the registry cache while `Registering`,
//! so recursive queries from its own callback find it instead of recursing.
//! Its body (name, properties, bases) is built off to the side and only
//! published once the whole registration session succeeds; until then the
//! descriptor reads as empty. A `Ready` body never changes again.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::flags::TypeFlags;
use crate::identity::TypeIdentity;
use crate::property::{InheritedProperty, Properties, PropertyRef, Upcast};
use crate::reflect::Reflect;

/// Externally visible construction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeState {
    /// Inserted in the cache, registration still in progress.
    Registering,
    /// Fully built and immutable.
    Ready,
    /// Evicted from its registry.
    Destroyed,
}

const REGISTERING: u8 = 0;
const STAGED: u8 = 1;
const READY: u8 = 2;
const DESTROYED: u8 = 3;

/// Mutable part of a descriptor, filled in by the registration callback.
pub(crate) struct TypeBody {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) properties: Option<Properties>,
}

impl TypeBody {
    pub(crate) fn new(identity: TypeIdentity, flags: TypeFlags) -> Self {
        Self {
            name: None,
            description: None,
            properties: flags.is_class().then(|| Properties::new(identity)),
        }
    }
}

/// Metadata for one reflected type.
pub struct TypeDescriptor {
    identity: TypeIdentity,
    flags: TypeFlags,
    state: AtomicU8,
    body: OnceLock<TypeBody>,
    staged: Mutex<Option<TypeBody>>,
    placeholder: TypeBody,
}

impl TypeDescriptor {
    pub(crate) fn new<T: Reflect>() -> Self {
        let identity = TypeIdentity::of::<T>();
        let flags = TypeFlags::measure::<T>(T::FLAGS);
        Self {
            identity,
            flags,
            state: AtomicU8::new(REGISTERING),
            body: OnceLock::new(),
            staged: Mutex::new(None),
            placeholder: TypeBody::new(identity, flags),
        }
    }

    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Rust type path of the described type.
    pub fn type_name(&self) -> &'static str {
        self.identity.type_name()
    }

    /// Declared name, if the type declared one.
    pub fn name(&self) -> Option<&str> {
        self.body().name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.body().description.as_deref()
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn has_flags(&self, flags: TypeFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Property collection; `None` for non-class types.
    pub fn properties(&self) -> Option<&Properties> {
        self.body().properties.as_ref()
    }

    /// Direct base classes in declaration order.
    pub fn base_classes(&self) -> &[BaseClass] {
        self.properties().map(Properties::bases).unwrap_or(&[])
    }

    /// Registry descriptors are never base-class views; see [`BaseClass`].
    pub fn is_base_class(&self) -> bool {
        false
    }

    pub fn state(&self) -> TypeState {
        match self.state.load(Ordering::Acquire) {
            READY => TypeState::Ready,
            DESTROYED => TypeState::Destroyed,
            _ => TypeState::Registering,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// True while the registration callback of this type is on the stack.
    pub(crate) fn is_registering(&self) -> bool {
        self.state.load(Ordering::Acquire) == REGISTERING
    }

    /// Park the body built by the callback until the session commits.
    pub(crate) fn stage(&self, body: TypeBody) {
        *self.staged.lock() = Some(body);
        self.state.store(STAGED, Ordering::Release);
    }

    /// Move the staged body into place. The state is left as it is.
    pub(crate) fn publish(&self) {
        if let Some(body) = self.staged.lock().take() {
            if self.body.set(body).is_err() {
                log::warn!(
                    "[TypeDescriptor] {} was committed twice, keeping the first body",
                    self.type_name()
                );
            }
        }
    }

    pub(crate) fn mark_ready(&self) {
        self.state.store(READY, Ordering::Release);
    }

    pub(crate) fn destroy(&self) {
        self.staged.lock().take();
        self.state.store(DESTROYED, Ordering::Release);
    }

    fn body(&self) -> &TypeBody {
        self.body.get().unwrap_or(&self.placeholder)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("identity", &self.identity)
            .field("name", &self.name())
            .field("flags", &self.flags)
            .field("state", &self.state())
            .field("properties", &self.properties().map(Properties::len))
            .field("bases", &self.base_classes().len())
            .finish()
    }
}

/// One direct base-class edge of a type.
///
/// Each edge is addressed by its own index, so the same base type reached
/// twice (repeated or diamond bases) stays individually addressable.
/// Dereferences to the base's [`TypeDescriptor`].
#[derive(Clone)]
pub struct BaseClass {
    index: u32,
    descriptor: Arc<TypeDescriptor>,
    upcast: Arc<dyn Upcast>,
}

impl BaseClass {
    pub(crate) fn new(index: u32, descriptor: Arc<TypeDescriptor>, upcast: Arc<dyn Upcast>) -> Self {
        Self {
            index,
            descriptor,
            upcast,
        }
    }

    /// Base-class index given at registration.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn is_base_class(&self) -> bool {
        true
    }

    /// View a base property from the derived type.
    pub(crate) fn inherit(&self, property: PropertyRef) -> PropertyRef {
        Arc::new(InheritedProperty::new(
            property,
            Arc::clone(&self.upcast),
            self.index,
        ))
    }
}

impl Deref for BaseClass {
    type Target = TypeDescriptor;

    fn deref(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

impl fmt::Debug for BaseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClass")
            .field("index", &self.index)
            .field("type", &self.descriptor.identity)
            .finish()
    }
}
