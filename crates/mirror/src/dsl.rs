// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration DSL handed to [`Reflect::reflect`].
//!
//! A [`Mirror`] is bound to exactly one descriptor under construction. What
//! it records only becomes visible to other queries once the registration
//! session that created the descriptor commits.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::accessibility::Accessibility;
use crate::error::{ReflectError, Result};
use crate::identity::TypeIdentity;
use crate::member::Member;
use crate::property::{FieldProperty, FieldUpcast, Properties, PropertyInfo, PropertyRef};
use crate::reflect::Reflect;
use crate::registry::Registry;
use crate::type_descriptor::{BaseClass, TypeBody, TypeDescriptor};

/// Registration facade for type `T`.
pub struct Mirror<'m, T: Reflect> {
    registry: &'m Registry,
    identity: TypeIdentity,
    body: &'m mut TypeBody,
    _type: PhantomData<fn() -> T>,
}

impl<'m, T: Reflect> Mirror<'m, T> {
    pub(crate) fn new(registry: &'m Registry, descriptor: &TypeDescriptor, body: &'m mut TypeBody) -> Self {
        Self {
            registry,
            identity: descriptor.identity(),
            body,
            _type: PhantomData,
        }
    }

    /// Registry running this registration.
    pub fn registry(&self) -> &'m Registry {
        self.registry
    }

    /// Identity of the type being registered.
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Give the type a name, making it retrievable with
    /// [`Registry::get_by_name`].
    ///
    /// Declaring again renames the type and releases the previous name.
    pub fn declare(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        if self.body.name.as_deref() == Some(name.as_str()) {
            return Ok(self);
        }
        self.registry.claim_name(&name, self.identity)?;
        if let Some(previous) = self.body.name.replace(name) {
            self.registry.release_name(&previous, self.identity);
        }
        Ok(self)
    }

    /// Attach a human description to the type.
    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.body.description = Some(description.into());
        self
    }

    /// Register a public, unnamed member.
    pub fn member<V: Reflect>(&mut self, member: Member<T, V>, index: u32) -> Result<PropertyRef> {
        self.property(member, index).register()
    }

    /// Start registering a member whose value type is itself reflectable.
    ///
    /// Unless disabled in the registry config, registering it also
    /// reflects `V`.
    pub fn property<V: Reflect>(&mut self, member: Member<T, V>, index: u32) -> PropertyBuilder<'_, 'm, T, V> {
        PropertyBuilder::new(self, member, index, Some(cascade::<V>))
    }

    /// Start registering a member whose value type is not reflectable.
    pub fn opaque<V: 'static>(&mut self, member: Member<T, V>, index: u32) -> PropertyBuilder<'_, 'm, T, V> {
        PropertyBuilder::new(self, member, index, None)
    }

    /// Register the base `B` embedded in `T` through `member`.
    ///
    /// Fails with [`ReflectError::CyclicBaseClass`] when `B`'s own
    /// registration is still running, i.e. `B` derives from `T` or is `T`.
    pub fn base_class<B: Reflect>(&mut self, index: u32, member: Member<T, B>) -> Result<Arc<TypeDescriptor>> {
        let owner = self.identity.type_name();
        if self.body.properties.is_none() {
            return Err(ReflectError::NotAClass(owner));
        }

        let base = self.registry.get_type::<B>()?;
        if base.is_registering() {
            return Err(ReflectError::CyclicBaseClass {
                owner,
                base: base.type_name(),
            });
        }
        if !base.flags().is_class() {
            return Err(ReflectError::NotAClass(base.type_name()));
        }

        log::trace!("[Mirror] {} derives from {} at base index {}", owner, base.type_name(), index);
        let edge = BaseClass::new(index, Arc::clone(&base), Arc::new(FieldUpcast::new(member)));
        self.properties_mut()?.push_base(edge);
        Ok(base)
    }

    /// Reflect another type from inside this registration.
    pub fn reflect_type<U: Reflect>(&self) -> Result<Arc<TypeDescriptor>> {
        self.registry.get_type::<U>()
    }

    fn properties_mut(&mut self) -> Result<&mut Properties> {
        let owner = self.identity.type_name();
        self.body
            .properties
            .as_mut()
            .ok_or(ReflectError::NotAClass(owner))
    }
}

fn cascade<V: Reflect>(registry: &Registry) -> Result<()> {
    registry.get_type::<V>().map(drop)
}

/// Optional settings of one member registration.
///
/// Nothing is recorded until [`register`](Self::register) is called.
#[must_use = "a property is only recorded by register()"]
pub struct PropertyBuilder<'a, 'm, T: Reflect, V: 'static> {
    mirror: &'a mut Mirror<'m, T>,
    member: Member<T, V>,
    cascade: Option<fn(&Registry) -> Result<()>>,
    info: PropertyInfo,
}

impl<'a, 'm, T: Reflect, V: 'static> PropertyBuilder<'a, 'm, T, V> {
    fn new(
        mirror: &'a mut Mirror<'m, T>,
        member: Member<T, V>,
        index: u32,
        cascade: Option<fn(&Registry) -> Result<()>>,
    ) -> Self {
        Self {
            mirror,
            member,
            cascade,
            info: PropertyInfo {
                name: None,
                description: None,
                index,
                value_type: TypeIdentity::of::<V>(),
                declared_type: TypeIdentity::of::<Member<T, V>>(),
                accessibility: Accessibility::Public,
                custom_flags: 0,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.info.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.info.accessibility = accessibility;
        self
    }

    /// Consumer-defined tag bits.
    pub fn custom_flags(mut self, flags: u32) -> Self {
        self.info.custom_flags = flags;
        self
    }

    /// Record the property on the type under construction.
    pub fn register(self) -> Result<PropertyRef> {
        let Self {
            mirror,
            member,
            cascade,
            info,
        } = self;
        let registry = mirror.registry;
        let config = registry.config();

        let index = info.index;
        let property: PropertyRef = Arc::new(FieldProperty::new(member, info));
        let property = mirror.properties_mut()?.insert(property, config.duplicates)?;
        log::trace!(
            "[Mirror] {} member {} '{}' registered at offset {} ({})",
            mirror.identity,
            index,
            member.field(),
            member.offset(),
            property.value_type()
        );

        if let Some(cascade) = cascade.filter(|_| config.cascade_member_types) {
            cascade(registry)?;
        }
        Ok(property)
    }
}
