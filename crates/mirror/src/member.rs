// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member handles: the reflection analog of a pointer-to-member.
//!
//! A [`Member<T, V>`] names one field of `T` holding a `V`. It carries the
//! field name and offset (its identity) and a pair of accessor function
//! pointers (how it is read and written). Build one with [`member!`](crate::member).

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Handle to a field of type `V` inside `T`.
pub struct Member<T, V> {
    field: &'static str,
    offset: usize,
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
    _owner: PhantomData<fn(T) -> V>,
}

impl<T, V> Member<T, V> {
    /// Create a member handle.
    ///
    /// `field` and `offset` (as given by `core::mem::offset_of!`) are only
    /// used as an identity key.
    pub const fn new(
        field: &'static str,
        offset: usize,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self {
            field,
            offset,
            get,
            get_mut,
            _owner: PhantomData,
        }
    }

    /// Field name as written in the type definition.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Borrow the field.
    pub fn get<'a>(&self, object: &'a T) -> &'a V {
        (self.get)(object)
    }

    /// Mutably borrow the field.
    pub fn get_mut<'a>(&self, object: &'a mut T) -> &'a mut V {
        (self.get_mut)(object)
    }

    /// Overwrite the field.
    pub fn set(&self, object: &mut T, value: V) {
        *(self.get_mut)(object) = value;
    }
}

impl<T: 'static, V: 'static> Member<T, V> {
    /// Identity key used to deduplicate registrations.
    pub fn key(&self) -> MemberKey {
        MemberKey {
            owner: TypeId::of::<T>(),
            field: self.field,
            offset: self.offset,
            value: TypeId::of::<V>(),
        }
    }
}

impl<T, V> Clone for Member<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Member<T, V> {}

impl<T, V> fmt::Debug for Member<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("owner", &std::any::type_name::<T>())
            .field("value", &std::any::type_name::<V>())
            .field("field", &self.field)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Exact identity of a registered member.
///
/// Two handles with the same owner, field name, offset and value type name
/// the same field. Zero-sized fields sharing an offset stay distinct by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub owner: TypeId,
    pub field: &'static str,
    pub offset: usize,
    pub value: TypeId,
}

/// Build a [`Member`] handle for `Type::field`.
///
/// ```rust
/// use mirror::{member, Member};
///
/// struct Point { x: f32, y: f32 }
///
/// let y: Member<Point, f32> = member!(Point, y);
/// let mut p = Point { x: 1.0, y: 2.0 };
/// y.set(&mut p, 5.0);
/// assert_eq!(*y.get(&p), 5.0);
/// assert_eq!(p.x, 1.0);
/// ```
#[macro_export]
macro_rules! member {
    ($owner:ty, $field:tt) => {
        $crate::Member::<$owner, _>::new(
            ::core::stringify!($field),
            ::core::mem::offset_of!($owner, $field),
            |object: &$owner| &object.$field,
            |object: &mut $owner| &mut object.$field,
        )
    };
}
