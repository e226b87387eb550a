// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Property descriptors.
//!
//! A property is one registered data member. Concrete properties are
//! monomorphised per `(owner, value)` pair and erased behind the
//! [`Property`] trait, so a collection can hold members of any value type.
//!
//! # Access paths
//!
//! - **Erased**: [`Property::get_any`], [`Property::get_any_mut`] and
//!   [`Property::set_any`] take `dyn Any` handles. Every call is checked
//!   with an `Any` downcast and mismatches come back as errors.
//! - **Typed**: `impl dyn Property` offers [`get`](trait.Property.html#method.get),
//!   [`get_mut`](trait.Property.html#method.get_mut) and
//!   [`set`](trait.Property.html#method.set), generic over the object and
//!   value types known at the call site.

mod collection;

pub use collection::Properties;

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::accessibility::Accessibility;
use crate::error::{ReflectError, Result};
use crate::identity::TypeIdentity;
use crate::member::{Member, MemberKey};

/// Shared handle to a property.
pub type PropertyRef = Arc<dyn Property>;

/// Metadata common to every property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub index: u32,
    /// Identity of the member's value type.
    pub value_type: TypeIdentity,
    /// Identity of the `Member<Owner, Value>` handle type: tells apart
    /// members with the same value type declared on different types.
    pub declared_type: TypeIdentity,
    pub accessibility: Accessibility,
    pub custom_flags: u32,
}

/// One reflected data member, erased over its owner and value types.
pub trait Property: Send + Sync {
    fn info(&self) -> &PropertyInfo;

    /// Type whose instances this property reads and writes.
    fn owner(&self) -> TypeIdentity;

    /// Identity key of the underlying field.
    fn member_key(&self) -> MemberKey;

    /// Base-class index through which an inherited property is reached.
    ///
    /// `None` for properties declared directly on [`owner`](Self::owner).
    fn via_base(&self) -> Option<u32> {
        None
    }

    /// Borrow the member of `object` as an erased value.
    fn get_any<'a>(&self, object: &'a dyn Any) -> Result<&'a dyn Any>;

    /// Mutably borrow the member of `object` as an erased value.
    fn get_any_mut<'a>(&self, object: &'a mut dyn Any) -> Result<&'a mut dyn Any>;

    /// Overwrite the member of `object` with `value`.
    ///
    /// Nothing is written when either handle has the wrong type.
    fn set_any(&self, object: &mut dyn Any, value: Box<dyn Any>) -> Result<()>;

    fn name(&self) -> Option<&str> {
        self.info().name.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.info().description.as_deref()
    }

    fn index(&self) -> u32 {
        self.info().index
    }

    fn value_type(&self) -> TypeIdentity {
        self.info().value_type
    }

    fn declared_type(&self) -> TypeIdentity {
        self.info().declared_type
    }

    fn accessibility(&self) -> Accessibility {
        self.info().accessibility
    }

    fn custom_flags(&self) -> u32 {
        self.info().custom_flags
    }
}

impl dyn Property {
    /// Check whether the property holds a `V`.
    pub fn is<V: Any>(&self) -> bool {
        self.value_type().is::<V>()
    }

    /// Borrow the member of `object` as a `V`.
    pub fn get<'a, V: Any, T: Any>(&self, object: &'a T) -> Result<&'a V> {
        self.check::<V, T>()?;
        let value = self.get_any(object)?;
        value.downcast_ref::<V>().ok_or_else(|| self.mismatch::<V>())
    }

    /// Mutably borrow the member of `object` as a `V`.
    pub fn get_mut<'a, V: Any, T: Any>(&self, object: &'a mut T) -> Result<&'a mut V> {
        self.check::<V, T>()?;
        let mismatch = self.mismatch::<V>();
        let value = self.get_any_mut(object)?;
        value.downcast_mut::<V>().ok_or(mismatch)
    }

    /// Overwrite the member of `object` with `value`.
    pub fn set<V: Any, T: Any>(&self, object: &mut T, value: V) -> Result<()> {
        *self.get_mut::<V, T>(object)? = value;
        Ok(())
    }

    /// Clone the member of `object` out as a `V`.
    pub fn value<V: Any + Clone, T: Any>(&self, object: &T) -> Result<V> {
        self.get::<V, T>(object).cloned()
    }

    fn check<V: Any, T: Any>(&self) -> Result<()> {
        let owner = self.owner();
        if !owner.is::<T>() {
            return Err(ReflectError::ObjectMismatch {
                expected: owner.type_name(),
                found: type_name::<T>(),
            });
        }
        if !self.is::<V>() {
            return Err(self.mismatch::<V>());
        }
        Ok(())
    }

    fn mismatch<V: Any>(&self) -> ReflectError {
        ReflectError::TypeMismatch {
            expected: self.value_type().type_name(),
            found: type_name::<V>(),
        }
    }
}

impl fmt::Debug for dyn Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        f.debug_struct("Property")
            .field("owner", &self.owner())
            .field("index", &info.index)
            .field("name", &info.name)
            .field("value_type", &info.value_type)
            .field("accessibility", &info.accessibility)
            .field("via_base", &self.via_base())
            .finish()
    }
}

/// Property backed by a [`Member`] of `T`.
pub(crate) struct FieldProperty<T, V> {
    member: Member<T, V>,
    owner: TypeIdentity,
    info: PropertyInfo,
    _marker: PhantomData<fn(T) -> V>,
}

impl<T: 'static, V: 'static> FieldProperty<T, V> {
    pub(crate) fn new(member: Member<T, V>, info: PropertyInfo) -> Self {
        Self {
            member,
            owner: TypeIdentity::of::<T>(),
            info,
            _marker: PhantomData,
        }
    }

    fn object<'a>(&self, object: &'a dyn Any) -> Result<&'a T> {
        object
            .downcast_ref::<T>()
            .ok_or_else(|| self.object_mismatch())
    }

    fn object_mismatch(&self) -> ReflectError {
        ReflectError::ObjectMismatch {
            expected: self.owner.type_name(),
            found: "a different type",
        }
    }
}

impl<T: 'static, V: 'static> Property for FieldProperty<T, V> {
    fn info(&self) -> &PropertyInfo {
        &self.info
    }

    fn owner(&self) -> TypeIdentity {
        self.owner
    }

    fn member_key(&self) -> MemberKey {
        self.member.key()
    }

    fn get_any<'a>(&self, object: &'a dyn Any) -> Result<&'a dyn Any> {
        let object = self.object(object)?;
        Ok(self.member.get(object))
    }

    fn get_any_mut<'a>(&self, object: &'a mut dyn Any) -> Result<&'a mut dyn Any> {
        let mismatch = self.object_mismatch();
        let object = object.downcast_mut::<T>().ok_or(mismatch)?;
        Ok(self.member.get_mut(object))
    }

    fn set_any(&self, object: &mut dyn Any, value: Box<dyn Any>) -> Result<()> {
        let mismatch = self.object_mismatch();
        let object = object.downcast_mut::<T>().ok_or(mismatch)?;
        let value = value.downcast::<V>().map_err(|_| ReflectError::TypeMismatch {
            expected: self.info.value_type.type_name(),
            found: "a different type",
        })?;
        self.member.set(object, *value);
        Ok(())
    }
}

/// Erased conversion from a derived object to one of its embedded bases.
pub(crate) trait Upcast: Send + Sync {
    fn derived(&self) -> TypeIdentity;
    fn upcast<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any>;
    fn upcast_mut<'a>(&self, object: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

/// Upcast through the member that embeds base `B` in `T`.
pub(crate) struct FieldUpcast<T, B> {
    member: Member<T, B>,
    derived: TypeIdentity,
}

impl<T: 'static, B: 'static> FieldUpcast<T, B> {
    pub(crate) fn new(member: Member<T, B>) -> Self {
        Self {
            member,
            derived: TypeIdentity::of::<T>(),
        }
    }
}

impl<T: 'static, B: 'static> Upcast for FieldUpcast<T, B> {
    fn derived(&self) -> TypeIdentity {
        self.derived
    }

    fn upcast<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any> {
        let object = object.downcast_ref::<T>()?;
        Some(self.member.get(object))
    }

    fn upcast_mut<'a>(&self, object: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let object = object.downcast_mut::<T>()?;
        Some(self.member.get_mut(object))
    }
}

/// A base-class property seen from a derived type.
///
/// Metadata (index, name, declared type) stays that of the base member;
/// the owner becomes the derived type and access goes through the upcast.
pub(crate) struct InheritedProperty {
    inner: PropertyRef,
    upcast: Arc<dyn Upcast>,
    base_index: u32,
}

impl InheritedProperty {
    pub(crate) fn new(inner: PropertyRef, upcast: Arc<dyn Upcast>, base_index: u32) -> Self {
        Self {
            inner,
            upcast,
            base_index,
        }
    }

    fn object_mismatch(&self) -> ReflectError {
        ReflectError::ObjectMismatch {
            expected: self.upcast.derived().type_name(),
            found: "a different type",
        }
    }
}

impl Property for InheritedProperty {
    fn info(&self) -> &PropertyInfo {
        self.inner.info()
    }

    fn owner(&self) -> TypeIdentity {
        self.upcast.derived()
    }

    fn member_key(&self) -> MemberKey {
        self.inner.member_key()
    }

    fn via_base(&self) -> Option<u32> {
        Some(self.base_index)
    }

    fn get_any<'a>(&self, object: &'a dyn Any) -> Result<&'a dyn Any> {
        let base = self
            .upcast
            .upcast(object)
            .ok_or_else(|| self.object_mismatch())?;
        self.inner.get_any(base)
    }

    fn get_any_mut<'a>(&self, object: &'a mut dyn Any) -> Result<&'a mut dyn Any> {
        let mismatch = self.object_mismatch();
        let base = self.upcast.upcast_mut(object).ok_or(mismatch)?;
        self.inner.get_any_mut(base)
    }

    fn set_any(&self, object: &mut dyn Any, value: Box<dyn Any>) -> Result<()> {
        let mismatch = self.object_mismatch();
        let base = self.upcast.upcast_mut(object).ok_or(mismatch)?;
        self.inner.set_any(base, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member;

    #[derive(Default)]
    struct Gauge {
        level: u32,
        unit: String,
    }

    #[derive(Default)]
    struct Panel {
        gauge: Gauge,
        slot: u8,
    }

    fn info<T: 'static, V: 'static>(index: u32) -> PropertyInfo {
        PropertyInfo {
            name: None,
            description: None,
            index,
            value_type: TypeIdentity::of::<V>(),
            declared_type: TypeIdentity::of::<Member<T, V>>(),
            accessibility: Accessibility::Public,
            custom_flags: 0,
        }
    }

    fn level_property() -> PropertyRef {
        Arc::new(FieldProperty::new(member!(Gauge, level), info::<Gauge, u32>(0)))
    }

    #[test]
    fn test_typed_round_trip() {
        let prop = level_property();
        let mut gauge = Gauge::default();

        assert_eq!(*prop.get::<u32, _>(&gauge).unwrap(), 0);
        prop.set(&mut gauge, 17u32).unwrap();
        assert_eq!(prop.value::<u32, _>(&gauge).unwrap(), 17);
        *prop.get_mut::<u32, _>(&mut gauge).unwrap() += 1;
        assert_eq!(gauge.level, 18);
    }

    #[test]
    fn test_typed_path_refuses_mismatch() {
        let prop = level_property();
        let mut gauge = Gauge::default();

        let err = prop.get::<u8, _>(&gauge).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));

        let err = prop.set(&mut gauge, 3u64).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
        assert_eq!(gauge.level, 0);

        let panel = Panel::default();
        let err = prop.get::<u32, _>(&panel).unwrap_err();
        assert!(matches!(err, ReflectError::ObjectMismatch { .. }));
    }

    #[test]
    fn test_erased_path() {
        let prop: PropertyRef = Arc::new(FieldProperty::new(
            member!(Gauge, unit),
            info::<Gauge, String>(1),
        ));
        let mut gauge = Gauge::default();

        prop.set_any(&mut gauge, Box::new(String::from("kPa")))
            .unwrap();
        let value = prop.get_any(&gauge).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("kPa"));

        assert!(prop.set_any(&mut gauge, Box::new(5u32)).is_err());
        assert!(prop.set_any(&mut 5u32, Box::new(String::new())).is_err());
        assert_eq!(gauge.unit, "kPa");
    }

    #[test]
    fn test_inherited_access_goes_through_upcast() {
        let upcast: Arc<dyn Upcast> = Arc::new(FieldUpcast::new(member!(Panel, gauge)));
        let inherited: PropertyRef =
            Arc::new(InheritedProperty::new(level_property(), upcast, 0));
        let mut panel = Panel::default();

        assert!(inherited.owner().is::<Panel>());
        assert_eq!(inherited.via_base(), Some(0));
        assert_eq!(inherited.index(), 0);

        inherited.set(&mut panel, 9u32).unwrap();
        assert_eq!(panel.gauge.level, 9);
        assert_eq!(panel.slot, 0);

        // The derived view no longer accepts the base object itself.
        let gauge = Gauge::default();
        assert!(inherited.get::<u32, _>(&gauge).is_err());
    }
}
