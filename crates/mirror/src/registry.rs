// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: one descriptor per reflected type.
//!
//! # Architecture
//!
//! ```text
//! Registry
//! +-- types: DashMap<TypeId, Arc<TypeDescriptor>>   (cache, lock-free reads)
//! +-- names: DashMap<String, TypeId>                (declared name index)
//! +-- registration: ReentrantMutex<RefCell<Session>>
//!
//! Session (one per outermost get_type miss)
//! +-- depth: nested get_type calls on the owning thread
//! +-- created: descriptors inserted during the session
//! +-- claims: name index edits, for rollback
//! +-- failure: first nested registration error
//! ```
//!
//! # Registration Flow
//!
//! 1. `get_type::<T>()` returns a Ready descriptor without locking
//! 2. On a miss, the registration lock is taken and the cache re-checked
//! 3. A Registering descriptor is inserted, then `T::reflect` runs
//! 4. Nested `get_type` calls on the same thread join the session; a type
//!    already in the cache (even half built) is returned as is
//! 5. When the outermost call returns, every body created in the session is
//!    published, then every descriptor becomes Ready; on failure every one
//!    of them is removed
//!
//! # Thread Safety
//!
//! - One session at a time per registry; other threads block on first use
//!   of an unregistered type, never on Ready lookups
//! - `evict` and `clear` take the registration lock

use std::any::{type_name, TypeId};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::ReentrantMutex;

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::dsl::Mirror;
use crate::error::{ReflectError, Result};
use crate::identity::TypeIdentity;
use crate::reflect::Reflect;
use crate::type_descriptor::{TypeBody, TypeDescriptor};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Default)]
struct Session {
    depth: usize,
    created: Vec<Arc<TypeDescriptor>>,
    claims: Vec<NameClaim>,
    failure: Option<ReflectError>,
}

/// Name index edit: `name` used to map to `previous`.
struct NameClaim {
    name: String,
    previous: Option<TypeId>,
}

impl Session {
    /// Returns true for the outermost call.
    fn enter(&mut self) -> bool {
        self.depth += 1;
        self.depth == 1
    }

    fn leave(&mut self, error: Option<&ReflectError>) {
        self.depth = self.depth.saturating_sub(1);
        if self.failure.is_none() {
            self.failure = error.cloned();
        }
    }
}

/// Cache of type descriptors.
pub struct Registry {
    config: RegistryConfig,
    types: DashMap<TypeId, Arc<TypeDescriptor>>,
    names: DashMap<String, TypeId>,
    registration: ReentrantMutex<RefCell<Session>>,
}

impl Registry {
    /// Empty registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            types: DashMap::new(),
            names: DashMap::new(),
            registration: ReentrantMutex::new(RefCell::new(Session::default())),
        }
    }

    /// Process-wide registry, configured from the environment on first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| {
            let config = RegistryConfig::from_env();
            log::debug!(
                "[Registry] Global registry created (duplicates={}, cascade={})",
                config.duplicates,
                config.cascade_member_types
            );
            Registry::with_config(config)
        })
    }

    /// Create the process-wide registry with an explicit configuration.
    ///
    /// Fails with [`ReflectError::AlreadyInitialized`] once the global
    /// registry exists, including when [`global`](Self::global) created it.
    pub fn init_global(config: RegistryConfig) -> Result<&'static Registry> {
        let mut created = false;
        let registry = GLOBAL.get_or_init(|| {
            created = true;
            Registry::with_config(config)
        });
        if created {
            Ok(registry)
        } else {
            Err(ReflectError::AlreadyInitialized)
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Descriptor of `T`, registering it on first use.
    ///
    /// Called from inside a registration callback, a type whose own
    /// registration is still running is returned in its current (possibly
    /// empty) state instead of being registered again.
    pub fn get_type<T: Reflect>(&self) -> Result<Arc<TypeDescriptor>> {
        let key = TypeId::of::<T>();
        if let Some(descriptor) = self.find_ready(key) {
            return Ok(descriptor);
        }

        let guard = self.registration.lock();
        if let Some(descriptor) = self.find(key) {
            return Ok(descriptor);
        }

        if !guard.borrow_mut().enter() {
            let result = self.construct::<T>();
            guard.borrow_mut().leave(result.as_ref().err());
            return result;
        }

        log::debug!("[Registry] Registration session opened by {}", type_name::<T>());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.construct::<T>()));
        let mut session = guard.replace(Session::default());

        match outcome {
            Ok(result) => {
                let result = match session.failure.take() {
                    Some(first) => Err(first),
                    None => result,
                };
                match result {
                    Ok(descriptor) => {
                        self.commit(session);
                        Ok(descriptor)
                    }
                    Err(e) => {
                        log::debug!("[Registry] Registration of {} failed: {}", type_name::<T>(), e);
                        self.rollback(session);
                        Err(e)
                    }
                }
            }
            Err(payload) => {
                log::debug!("[Registry] Registration of {} panicked", type_name::<T>());
                self.rollback(session);
                drop(guard);
                panic::resume_unwind(payload)
            }
        }
    }

    fn construct<T: Reflect>(&self) -> Result<Arc<TypeDescriptor>> {
        let descriptor = Arc::new(TypeDescriptor::new::<T>());
        self.types.insert(TypeId::of::<T>(), Arc::clone(&descriptor));
        self.registration
            .lock()
            .borrow_mut()
            .created
            .push(Arc::clone(&descriptor));

        let mut body = TypeBody::new(descriptor.identity(), descriptor.flags());
        T::reflect(&mut Mirror::new(self, &descriptor, &mut body))?;
        descriptor.stage(body);
        Ok(descriptor)
    }

    fn commit(&self, session: Session) {
        // Every body is in place before any descriptor turns Ready.
        for descriptor in &session.created {
            descriptor.publish();
        }
        for descriptor in &session.created {
            descriptor.mark_ready();
        }
        log::debug!(
            "[Registry] Registration session committed {} type(s)",
            session.created.len()
        );
    }

    fn rollback(&self, session: Session) {
        for claim in session.claims.into_iter().rev() {
            match claim.previous {
                Some(previous) => {
                    self.names.insert(claim.name, previous);
                }
                None => {
                    self.names.remove(&claim.name);
                }
            }
        }
        for descriptor in session.created.iter().rev() {
            let key = descriptor.identity().type_id();
            self.types
                .remove_if(&key, |_, cached| Arc::ptr_eq(cached, descriptor));
            self.names.retain(|_, id| *id != key);
            descriptor.destroy();
        }
        log::debug!(
            "[Registry] Registration session rolled back {} type(s)",
            session.created.len()
        );
    }

    fn find(&self, key: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.types.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    fn find_ready(&self, key: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.find(key).filter(|descriptor| descriptor.is_ready())
    }

    /// Point `name` at `owner` in the name index.
    pub(crate) fn claim_name(&self, name: &str, owner: TypeIdentity) -> Result<()> {
        let guard = self.registration.lock();
        let previous = self.names.get(name).map(|entry| *entry.value());

        match previous {
            Some(existing) if existing == owner.type_id() => return Ok(()),
            Some(existing) => {
                let existing_name = self
                    .find(existing)
                    .map(|descriptor| descriptor.type_name())
                    .unwrap_or("an evicted type");
                if self.config.duplicates == DuplicatePolicy::Reject {
                    return Err(ReflectError::DuplicateTypeName {
                        name: name.to_string(),
                        existing: existing_name,
                    });
                }
                log::warn!(
                    "[Registry] Type name '{}' moves from {} to {}",
                    name,
                    existing_name,
                    owner
                );
            }
            None => {}
        }

        self.names.insert(name.to_string(), owner.type_id());
        guard.borrow_mut().claims.push(NameClaim {
            name: name.to_string(),
            previous,
        });
        Ok(())
    }

    /// Drop `name` from the index if it still points at `owner`.
    pub(crate) fn release_name(&self, name: &str, owner: TypeIdentity) {
        let guard = self.registration.lock();
        if self
            .names
            .remove_if(name, |_, id| *id == owner.type_id())
            .is_some()
        {
            guard.borrow_mut().claims.push(NameClaim {
                name: name.to_string(),
                previous: Some(owner.type_id()),
            });
        }
    }

    /// Ready descriptor declared under `name`. Never registers anything.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        let key = self.names.get(name).map(|entry| *entry.value())?;
        self.find_ready(key)
    }

    /// Like [`get_by_name`](Self::get_by_name), with a named error.
    pub fn require_by_name(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.get_by_name(name)
            .ok_or_else(|| ReflectError::TypeNotFound(name.to_string()))
    }

    /// True when `T` has a Ready descriptor. Never registers anything.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.find_ready(TypeId::of::<T>()).is_some()
    }

    /// Remove and destroy the descriptor of `T` and its name entry.
    ///
    /// Returns false when `T` is absent or still being registered.
    /// Descriptors deriving from `T` keep their view of it.
    pub fn evict<T: 'static>(&self) -> bool {
        let _guard = self.registration.lock();
        let key = TypeId::of::<T>();
        let Some((_, descriptor)) = self
            .types
            .remove_if(&key, |_, descriptor| descriptor.is_ready())
        else {
            return false;
        };

        self.names.retain(|_, id| *id != key);
        descriptor.destroy();
        log::debug!("[Registry] Evicted {}", descriptor.type_name());
        true
    }

    /// Destroy every descriptor and reset the name index.
    ///
    /// Returns `false`, and clears nothing, when called from a registration
    /// callback.
    pub fn clear(&self) -> bool {
        let guard = self.registration.lock();
        if guard.borrow().depth > 0 {
            log::warn!("[Registry] clear() called during a registration session, ignoring");
            return false;
        }

        let count = self.types.len();
        for entry in self.types.iter() {
            entry.value().destroy();
        }
        self.types.clear();
        self.names.clear();
        log::info!("[Registry] Cleared {} type(s)", count);
        true
    }

    /// Number of Ready descriptors.
    pub fn len(&self) -> usize {
        self.types
            .iter()
            .filter(|entry| entry.value().is_ready())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared names of Ready descriptors, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .iter()
            .filter(|entry| self.find_ready(*entry.value()).is_some())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("types", &self.types.len())
            .field("names", &self.names.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member;
    use crate::type_descriptor::TypeState;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    struct Node {
        value: i64,
        next: Option<Box<Node>>,
    }

    impl Reflect for Node {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Node")?;
            let me = mirror.reflect_type::<Node>()?;
            assert_eq!(me.state(), TypeState::Registering);
            mirror.member(member!(Node, value), 0)?;
            mirror.member(member!(Node, next), 1)?;
            Ok(())
        }
    }

    #[test]
    fn test_get_type_is_idempotent() {
        let registry = Registry::new();
        let first = registry.get_type::<Node>().unwrap();
        let second = registry.get_type::<Node>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_ready());
    }

    #[test]
    fn test_self_reference_terminates() {
        let registry = Registry::new();
        let node = registry.get_type::<Node>().unwrap();
        assert_eq!(node.properties().unwrap().len(), 2);
        assert!(registry.get_type::<Option<Box<Node>>>().unwrap().is_ready());
        assert!(registry.is_registered::<Box<Node>>());
    }

    // Ping -> Pong -> Ping through members.
    struct Ping {
        pong: Vec<Pong>,
    }
    struct Pong {
        ping: Vec<Ping>,
    }

    impl Reflect for Ping {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Ping")?;
            mirror.member(member!(Ping, pong), 0)?;
            Ok(())
        }
    }

    impl Reflect for Pong {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Pong")?;
            mirror.member(member!(Pong, ping), 0)?;
            Ok(())
        }
    }

    #[test]
    fn test_mutual_recursion_commits_together() {
        let registry = Registry::new();
        registry.get_type::<Ping>().unwrap();
        assert!(registry.get_by_name("Pong").unwrap().is_ready());
        assert_eq!(registry.registered_names(), vec!["Ping", "Pong"]);
    }

    // Holder registers Shared as a member before Child names it as a base,
    // so Shared is created ahead of the type deriving from it.
    #[derive(Default)]
    struct Shared {
        tag: u8,
    }
    #[derive(Default)]
    struct Child {
        shared: Shared,
        extra: u16,
    }
    struct Holder {
        shared: Shared,
        child: Child,
    }

    impl Reflect for Shared {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.property(member!(Shared, tag), 0).name("tag").register()?;
            Ok(())
        }
    }

    impl Reflect for Child {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.base_class(0, member!(Child, shared))?;
            mirror.property(member!(Child, extra), 0).name("extra").register()?;
            Ok(())
        }
    }

    impl Reflect for Holder {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.member(member!(Holder, shared), 0)?;
            mirror.member(member!(Holder, child), 1)?;
            Ok(())
        }
    }

    #[test]
    fn test_base_created_before_derived_commits_complete() {
        let registry = Registry::new();
        registry.get_type::<Holder>().unwrap();

        let child = registry.find_ready(TypeId::of::<Child>()).unwrap();
        let names: Vec<_> = child
            .properties()
            .unwrap()
            .get_all()
            .iter()
            .map(|p| p.name().map(str::to_owned))
            .collect();
        assert_eq!(names, vec![Some("tag".to_owned()), Some("extra".to_owned())]);
        assert!(child.base_classes()[0].descriptor().is_ready());

        let mut value = Child::default();
        child.properties().unwrap().require_name("tag").unwrap().set(&mut value, 4u8).unwrap();
        assert_eq!(value.shared.tag, 4);
        assert_eq!(registry.len(), 5);
    }

    // Loop -> Loop as a base.
    struct Loop {
        _inner: u8,
    }

    impl Reflect for Loop {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Loop")?;
            let itself = crate::Member::<Loop, Loop>::new(
                "self",
                0,
                |this: &Loop| this,
                |this: &mut Loop| this,
            );
            mirror.base_class(0, itself)?;
            Ok(())
        }
    }

    #[test]
    fn test_cyclic_base_is_rejected_and_rolled_back() {
        let registry = Registry::new();
        let err = registry.get_type::<Loop>().unwrap_err();
        assert!(matches!(err, ReflectError::CyclicBaseClass { .. }));
        assert!(!registry.is_registered::<Loop>());
        assert!(registry.get_by_name("Loop").is_none());
        assert!(registry.is_empty());
    }

    // Good registers fine, but drags in Bad which fails; the error is
    // swallowed by Good's callback yet still fails the session.
    struct Good {
        bad: Bad,
    }
    struct Bad {
        a: u8,
    }

    impl Reflect for Good {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Good")?;
            let _ = mirror.member(member!(Good, bad), 0);
            Ok(())
        }
    }

    impl Reflect for Bad {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.member(member!(Bad, a), 0)?;
            mirror.member(member!(Bad, a), 1)?;
            Ok(())
        }
    }

    #[test]
    fn test_nested_failure_fails_whole_session() {
        let registry = Registry::new();
        let err = registry.get_type::<Good>().unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateMember { .. }));
        assert!(!registry.is_registered::<Good>());
        assert!(!registry.is_registered::<Bad>());
        assert!(registry.get_by_name("Good").is_none());
        // u8 was registered in the same session.
        assert!(!registry.is_registered::<u8>());
    }

    struct Boom;

    impl Reflect for Boom {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Boom")?;
            mirror.reflect_type::<u32>()?;
            panic!("boom");
        }
    }

    #[test]
    fn test_panic_rolls_back_and_propagates() {
        let registry = Registry::new();
        let caught = panic::catch_unwind(AssertUnwindSafe(|| registry.get_type::<Boom>()));
        assert!(caught.is_err());
        assert!(!registry.is_registered::<Boom>());
        assert!(!registry.is_registered::<u32>());
        assert!(registry.get_by_name("Boom").is_none());

        // The registry is still usable afterwards.
        assert!(registry.get_type::<u32>().unwrap().is_ready());
    }

    struct First;
    struct Second;

    impl Reflect for First {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Shared")?;
            Ok(())
        }
    }

    impl Reflect for Second {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.declare("Shared")?;
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_type_name() {
        let registry = Registry::new();
        registry.get_type::<First>().unwrap();
        let err = registry.get_type::<Second>().unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateTypeName { ref name, .. } if name == "Shared"));
        assert!(registry.get_by_name("Shared").unwrap().identity().is::<First>());

        let lenient = Registry::with_config(
            RegistryConfig::default().with_duplicates(DuplicatePolicy::Overwrite),
        );
        lenient.get_type::<First>().unwrap();
        lenient.get_type::<Second>().unwrap();
        assert!(lenient.get_by_name("Shared").unwrap().identity().is::<Second>());
    }

    #[test]
    fn test_evict_and_clear() {
        let registry = Registry::new();
        let node = registry.get_type::<Node>().unwrap();
        assert!(registry.is_registered::<i64>());

        assert!(registry.evict::<Node>());
        assert_eq!(node.state(), TypeState::Destroyed);
        assert!(registry.get_by_name("Node").is_none());
        assert!(!registry.evict::<Node>());

        let again = registry.get_type::<Node>().unwrap();
        assert!(!Arc::ptr_eq(&node, &again));

        assert!(registry.clear());
        assert!(registry.is_empty());
        assert!(registry.registered_names().is_empty());
        assert_eq!(again.state(), TypeState::Destroyed);
    }

    static CLEARED_INSIDE: AtomicBool = AtomicBool::new(true);

    struct Clearing {
        level: u8,
    }

    impl Reflect for Clearing {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            mirror.member(member!(Clearing, level), 0)?;
            CLEARED_INSIDE.store(mirror.registry().clear(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_clear_is_refused_inside_a_session() {
        let registry = Registry::new();
        registry.get_type::<u32>().unwrap();

        let clearing = registry.get_type::<Clearing>().unwrap();
        assert!(!CLEARED_INSIDE.load(Ordering::SeqCst));
        assert!(clearing.is_ready());
        assert!(registry.is_registered::<u32>());
        assert!(registry.is_registered::<u8>());

        assert!(registry.clear());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_require_by_name() {
        let registry = Registry::new();
        let err = registry.require_by_name("Nowhere").unwrap_err();
        assert_eq!(err, ReflectError::TypeNotFound("Nowhere".into()));
    }

    static SLOW_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Slow {
        a: u32,
    }

    impl Reflect for Slow {
        fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
            SLOW_CALLS.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(20));
            mirror.member(member!(Slow, a), 0)?;
            Ok(())
        }
    }

    #[test]
    fn test_concurrent_first_registration_runs_once() {
        let registry = Arc::new(Registry::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.get_type::<Slow>().unwrap()
                })
            })
            .collect();

        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(SLOW_CALLS.load(Ordering::SeqCst), 1);
        for descriptor in &descriptors {
            assert!(Arc::ptr_eq(descriptor, &descriptors[0]));
            assert_eq!(descriptor.properties().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_init_global_after_global_fails() {
        let global = Registry::global();
        assert!(std::ptr::eq(global, Registry::global()));
        assert_eq!(
            Registry::init_global(RegistryConfig::default()).unwrap_err(),
            ReflectError::AlreadyInitialized
        );
    }
}
