// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide type identities.
//!
//! Every type that reaches the reflection layer gets a small integer id the
//! first time it is seen. Ids are never zero, never reused, and survive
//! registry eviction: clearing a registry drops descriptors, not identities.
//!
//! # Thread Safety
//!
//! - Lookups hit a sharded `DashMap` and take no global lock.
//! - First-time assignment is serialised by a `parking_lot::Mutex` around
//!   the assign-if-absent step, so racing threads agree on one id.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU64;
use std::sync::OnceLock;

use dashmap::DashMap;
use parking_lot::Mutex;

/// Stable identity of a statically-known type.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    id: NonZeroU64,
    type_id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    /// Identity of `T`, assigned on first use.
    pub fn of<T: ?Sized + 'static>() -> Self {
        IdTable::global().identity(TypeId::of::<T>(), type_name::<T>())
    }

    /// Raw id (never zero).
    pub fn id(&self) -> u64 {
        self.id.get()
    }

    /// Compiler type id.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type path as reported by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Check whether this identity belongs to `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIdentity({}: {})", self.id, self.name)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Assign-once table from compiler type ids to identities.
struct IdTable {
    ids: DashMap<TypeId, TypeIdentity>,
    assigned: Mutex<u64>,
}

impl IdTable {
    fn global() -> &'static IdTable {
        static TABLE: OnceLock<IdTable> = OnceLock::new();
        TABLE.get_or_init(|| IdTable {
            ids: DashMap::new(),
            assigned: Mutex::new(0),
        })
    }

    fn identity(&self, type_id: TypeId, name: &'static str) -> TypeIdentity {
        if let Some(found) = self.ids.get(&type_id) {
            return *found;
        }

        let mut assigned = self.assigned.lock();
        // Another thread may have won the race while we waited.
        if let Some(found) = self.ids.get(&type_id) {
            return *found;
        }

        let Some(id) = next_id(*assigned) else {
            panic!("type identity space exhausted after {} ids", *assigned);
        };
        let identity = TypeIdentity { id, type_id, name };
        *assigned = id.get();
        self.ids.insert(type_id, identity);

        log::trace!("[TypeIdentity] Assigned id={} to {}", identity.id, name);
        identity
    }
}

/// Id following the `assigned` ids handed out so far.
fn next_id(assigned: u64) -> Option<NonZeroU64> {
    assigned.checked_add(1).and_then(NonZeroU64::new)
}
