// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type property collection.
//!
//! Holds the properties a type declares directly, indexed three ways
//! (member identity, declared index, declared name), plus the type's base
//! class edges. Every "all properties" view is base-first: each base's
//! complete view in base declaration order, then this type's own
//! properties in registration order.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::accessibility::{AccessFilter, Accessibility};
use crate::config::DuplicatePolicy;
use crate::error::{ReflectError, Result};
use crate::identity::TypeIdentity;
use crate::member::{Member, MemberKey};
use crate::property::PropertyRef;
use crate::type_descriptor::BaseClass;

/// Properties of one class type.
pub struct Properties {
    owner: TypeIdentity,
    own: Vec<PropertyRef>,
    by_member: HashMap<MemberKey, usize>,
    by_index: BTreeMap<u32, usize>,
    by_name: HashMap<String, usize>,
    bases: Vec<BaseClass>,
}

impl Properties {
    pub(crate) fn new(owner: TypeIdentity) -> Self {
        Self {
            owner,
            own: Vec::new(),
            by_member: HashMap::new(),
            by_index: BTreeMap::new(),
            by_name: HashMap::new(),
            bases: Vec::new(),
        }
    }

    /// Type owning this collection.
    pub fn owner(&self) -> TypeIdentity {
        self.owner
    }

    /// Add a property declared directly on the owner.
    ///
    /// Under [`DuplicatePolicy::Reject`] nothing is modified when the
    /// member, index or name is already taken. Under
    /// [`DuplicatePolicy::Overwrite`] the newest registration wins every
    /// lookup, and re-registering the same member replaces it in place.
    pub(crate) fn insert(
        &mut self,
        property: PropertyRef,
        policy: DuplicatePolicy,
    ) -> Result<PropertyRef> {
        let key = property.member_key();
        let index = property.index();
        let name = property
            .name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let existing = self.by_member.get(&key).copied();

        if policy == DuplicatePolicy::Reject {
            self.check_free(key, index, name.as_deref(), existing)?;
        }

        let slot = match existing {
            Some(slot) => {
                log::warn!(
                    "[Properties] Member '{}' of {} registered again, replacing index {}",
                    key.field,
                    self.owner,
                    self.own[slot].index()
                );
                self.own[slot] = PropertyRef::clone(&property);
                self.by_index.retain(|_, s| *s != slot);
                self.by_name.retain(|_, s| *s != slot);
                slot
            }
            None => {
                self.own.push(PropertyRef::clone(&property));
                self.own.len() - 1
            }
        };

        if let Some(previous) = self.by_index.insert(index, slot) {
            log::warn!(
                "[Properties] Index {} of {} now points at a newer member (was slot {})",
                index,
                self.owner,
                previous
            );
        }
        if let Some(name) = name {
            if let Some(previous) = self.by_name.insert(name, slot) {
                log::warn!(
                    "[Properties] Name of slot {} on {} reassigned to a newer member",
                    previous,
                    self.owner
                );
            }
        }
        self.by_member.insert(key, slot);

        Ok(property)
    }

    fn check_free(
        &self,
        key: MemberKey,
        index: u32,
        name: Option<&str>,
        existing: Option<usize>,
    ) -> Result<()> {
        let owner = self.owner.type_name();
        if existing.is_some() {
            return Err(ReflectError::DuplicateMember {
                owner,
                field: key.field,
            });
        }
        if self.by_index.contains_key(&index) {
            return Err(ReflectError::DuplicateIndex { owner, index });
        }
        if let Some(name) = name {
            if self.by_name.contains_key(name) {
                return Err(ReflectError::DuplicatePropertyName {
                    owner,
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn push_base(&mut self, base: BaseClass) {
        self.bases.push(base);
    }

    /// Direct base classes in declaration order.
    pub fn bases(&self) -> &[BaseClass] {
        &self.bases
    }

    /// Properties declared directly on the owner, in registration order.
    pub fn own(&self) -> &[PropertyRef] {
        &self.own
    }

    /// Number of properties in the base-first view.
    pub fn len(&self) -> usize {
        let inherited: usize = self
            .bases
            .iter()
            .filter_map(|base| base.properties())
            .map(Properties::len)
            .sum();
        inherited + self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every property, base classes first.
    pub fn get_all(&self) -> Vec<PropertyRef> {
        let mut all = Vec::with_capacity(self.len());
        for base in &self.bases {
            if let Some(properties) = base.properties() {
                all.extend(
                    properties
                        .get_all()
                        .into_iter()
                        .map(|property| base.inherit(property)),
                );
            }
        }
        all.extend(self.own.iter().cloned());
        all
    }

    /// Every property holding a value of the given type.
    pub fn get_all_of_type(&self, value_type: TypeId) -> Vec<PropertyRef> {
        self.get_all()
            .into_iter()
            .filter(|property| property.value_type().type_id() == value_type)
            .collect()
    }

    /// Every property holding a `V`.
    pub fn get_all_of<V: Any>(&self) -> Vec<PropertyRef> {
        self.get_all_of_type(TypeId::of::<V>())
    }

    /// Every property whose accessibility passes `filter` against `level`.
    pub fn get_all_by_access(
        &self,
        level: Accessibility,
        filter: AccessFilter,
    ) -> Vec<PropertyRef> {
        self.get_all()
            .into_iter()
            .filter(|property| filter.matches(property.accessibility(), level))
            .collect()
    }

    /// Property with the given index, own declarations first.
    pub fn get_by_index(&self, index: u32) -> Option<PropertyRef> {
        if let Some(slot) = self.by_index.get(&index) {
            return self.own.get(*slot).cloned();
        }
        self.find_in_bases(|properties| properties.get_by_index(index))
    }

    /// Property with the given name, own declarations first.
    pub fn get_by_name(&self, name: &str) -> Option<PropertyRef> {
        if let Some(slot) = self.by_name.get(name) {
            return self.own.get(*slot).cloned();
        }
        self.find_in_bases(|properties| properties.get_by_name(name))
    }

    /// Property registered for exactly this member.
    ///
    /// A member of a base type resolves through the first base edge that
    /// reaches it.
    pub fn get_by_member<T: 'static, V: 'static>(&self, member: &Member<T, V>) -> Option<PropertyRef> {
        self.get_by_key(member.key())
    }

    fn get_by_key(&self, key: MemberKey) -> Option<PropertyRef> {
        if let Some(slot) = self.by_member.get(&key) {
            return self.own.get(*slot).cloned();
        }
        self.find_in_bases(|properties| properties.get_by_key(key))
    }

    /// Like [`get_by_index`](Self::get_by_index), with a named error.
    pub fn require_index(&self, index: u32) -> Result<PropertyRef> {
        self.get_by_index(index).ok_or_else(|| {
            ReflectError::PropertyNotFound(format!("{}[{}]", self.owner, index))
        })
    }

    /// Like [`get_by_name`](Self::get_by_name), with a named error.
    pub fn require_name(&self, name: &str) -> Result<PropertyRef> {
        self.get_by_name(name)
            .ok_or_else(|| ReflectError::PropertyNotFound(format!("{}.{}", self.owner, name)))
    }

    /// Declared property names, base classes included.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .bases
            .iter()
            .filter_map(|base| base.properties())
            .flat_map(Properties::names)
            .collect();
        names.extend(self.by_name.keys().cloned());
        names
    }

    /// Declared property indices, base classes included.
    pub fn indices(&self) -> BTreeSet<u32> {
        let mut indices: BTreeSet<u32> = self
            .bases
            .iter()
            .filter_map(|base| base.properties())
            .flat_map(Properties::indices)
            .collect();
        indices.extend(self.by_index.keys().copied());
        indices
    }

    fn find_in_bases(&self, find: impl Fn(&Properties) -> Option<PropertyRef>) -> Option<PropertyRef> {
        self.bases.iter().find_map(|base| {
            let found = find(base.properties()?)?;
            Some(base.inherit(found))
        })
    }
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Properties")
            .field("owner", &self.owner)
            .field("own", &self.own.len())
            .field("bases", &self.bases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member;
    use crate::property::{FieldProperty, PropertyInfo};
    use std::sync::Arc;

    struct Gauge {
        a: u32,
        b: u8,
        c: u32,
    }

    fn prop<V: 'static>(member: Member<Gauge, V>, index: u32, name: Option<&str>) -> PropertyRef {
        Arc::new(FieldProperty::new(
            member,
            PropertyInfo {
                name: name.map(str::to_owned),
                description: None,
                index,
                value_type: TypeIdentity::of::<V>(),
                declared_type: TypeIdentity::of::<Member<Gauge, V>>(),
                accessibility: Accessibility::ALL[index as usize % 3],
                custom_flags: 0,
            },
        ))
    }

    fn filled() -> Properties {
        let mut props = Properties::new(TypeIdentity::of::<Gauge>());
        props
            .insert(prop(member!(Gauge, a), 0, Some("a")), DuplicatePolicy::Reject)
            .unwrap();
        props
            .insert(prop(member!(Gauge, b), 1, None), DuplicatePolicy::Reject)
            .unwrap();
        props
            .insert(prop(member!(Gauge, c), 2, Some("c")), DuplicatePolicy::Reject)
            .unwrap();
        props
    }

    #[test]
    fn test_lookups() {
        let props = filled();

        assert_eq!(props.len(), 3);
        assert_eq!(props.get_by_index(1).map(|p| p.index()), Some(1));
        assert_eq!(props.get_by_name("c").map(|p| p.index()), Some(2));
        assert!(props.get_by_name("b").is_none());
        assert!(props.get_by_index(7).is_none());
        assert_eq!(
            props.get_by_member(&member!(Gauge, b)).map(|p| p.index()),
            Some(1)
        );
        assert_eq!(props.names().into_iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(props.indices().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_filters_preserve_order() {
        let props = filled();

        let u32s: Vec<u32> = props.get_all_of::<u32>().iter().map(|p| p.index()).collect();
        assert_eq!(u32s, vec![0, 2]);

        let open: Vec<u32> = props
            .get_all_by_access(Accessibility::Protected, AccessFilter::DownTo)
            .iter()
            .map(|p| p.index())
            .collect();
        assert_eq!(open, vec![0, 1]);

        let private: Vec<u32> = props
            .get_all_by_access(Accessibility::Private, AccessFilter::Exactly)
            .iter()
            .map(|p| p.index())
            .collect();
        assert_eq!(private, vec![2]);
    }

    #[test]
    fn test_reject_leaves_collection_untouched() {
        let mut props = filled();

        let err = props
            .insert(prop(member!(Gauge, a), 9, None), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateMember { .. }));

        let mut other = Properties::new(TypeIdentity::of::<Gauge>());
        other
            .insert(prop(member!(Gauge, a), 0, None), DuplicatePolicy::Reject)
            .unwrap();
        let err = other
            .insert(prop(member!(Gauge, b), 0, None), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateIndex { index: 0, .. }));
        assert_eq!(other.len(), 1);

        let err = other
            .insert(prop(member!(Gauge, c), 5, Some("x")), DuplicatePolicy::Reject)
            .and_then(|_| other.insert(prop(member!(Gauge, b), 6, Some("x")), DuplicatePolicy::Reject))
            .unwrap_err();
        assert!(matches!(err, ReflectError::DuplicatePropertyName { ref name, .. } if name == "x"));
        assert_eq!(other.len(), 2);
        assert!(other.get_by_index(6).is_none());

        assert_eq!(props.len(), 3);
        assert!(props.get_by_index(9).is_none());
    }

    #[test]
    fn test_overwrite_same_member_replaces_in_place() {
        let mut props = filled();

        props
            .insert(prop(member!(Gauge, a), 7, Some("alpha")), DuplicatePolicy::Overwrite)
            .unwrap();

        assert_eq!(props.len(), 3);
        assert_eq!(props.own()[0].index(), 7);
        assert!(props.get_by_index(0).is_none());
        assert!(props.get_by_name("a").is_none());
        assert_eq!(props.get_by_name("alpha").map(|p| p.index()), Some(7));
        assert_eq!(
            props.get_by_member(&member!(Gauge, a)).map(|p| p.index()),
            Some(7)
        );
    }

    #[test]
    fn test_overwrite_duplicate_index_points_at_newest() {
        let mut props = Properties::new(TypeIdentity::of::<Gauge>());
        props
            .insert(prop(member!(Gauge, a), 0, None), DuplicatePolicy::Overwrite)
            .unwrap();
        props
            .insert(prop(member!(Gauge, c), 0, None), DuplicatePolicy::Overwrite)
            .unwrap();

        assert_eq!(props.len(), 2);
        let found = props.get_by_index(0).unwrap();
        assert_eq!(found.member_key(), member!(Gauge, c).key());
        // The older member is still reachable by identity.
        assert!(props.get_by_member(&member!(Gauge, a)).is_some());
    }

    #[test]
    fn test_require_reports_named_errors() {
        let props = filled();
        assert!(props.require_index(0).is_ok());
        let err = props.require_name("missing").unwrap_err();
        assert!(matches!(err, ReflectError::PropertyNotFound(ref what) if what.ends_with(".missing")));
    }
}
