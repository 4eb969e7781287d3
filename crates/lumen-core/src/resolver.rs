// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Singleton service resolver.
//!
//! Services are registered once under their contract type, which may be a
//! concrete type or a trait object such as `dyn ProbeClient`, and resolved by
//! the same type. The resolver never constructs anything itself.
//!
//! - Key = `TypeId::of::<T>()`; the type name is kept for error messages.
//! - Value = `Arc<T>` stored as `Box<dyn Any + Send + Sync>` and downcast on read.
//! - A second registration for the same contract is rejected, so every
//!   successful `resolve` for a contract hands out the same `Arc`.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::LumenError;

type Boxed = Box<dyn Any + Send + Sync>;

struct Entry {
    type_name: &'static str,
    value: Boxed,
}

/// Type-safe registry of singletons keyed by contract type.
pub struct ServiceResolver {
    entries: RwLock<HashMap<TypeId, Entry>>,
    order: RwLock<Vec<&'static str>>,
}

impl ServiceResolver {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Registers the singleton for contract `T`.
    pub fn register<T>(&self, service: Arc<T>) -> Result<(), LumenError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(LumenError::AlreadyRegistered {
                type_name: type_name::<T>(),
            });
        }
        entries.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                value: Box::new(service),
            },
        );
        self.order.write().push(type_name::<T>());
        tracing::trace!(service = type_name::<T>(), "service registered");
        Ok(())
    }

    /// Returns the singleton registered for contract `T`.
    pub fn resolve<T>(&self) -> Result<Arc<T>, LumenError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        let entry = entries
            .get(&TypeId::of::<T>())
            .ok_or(LumenError::NotRegistered {
                type_name: type_name::<T>(),
            })?;

        // The stored value is exactly `Arc<T>`.
        entry
            .value
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| LumenError::Internal(format!("type mismatch for {}", entry.type_name)))
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Contract names in registration order.
    pub fn registered(&self) -> Vec<&'static str> {
        self.order.read().clone()
    }

    /// Drops every registration. Used by the host's final teardown step.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.order.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ServiceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceResolver")
            .field("services", &*self.order.read())
            .finish()
    }
}

/// A lazily resolved handle to a service that is registered later.
///
/// Breaks construction cycles: the holder gets a lookup into the resolver
/// instead of a live reference, and the lookup only happens on [`Deferred::get`].
pub struct Deferred<T: ?Sized> {
    resolver: Weak<ServiceResolver>,
    _contract: PhantomData<fn() -> Arc<T>>,
}

impl<T> Deferred<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub fn new(resolver: &Arc<ServiceResolver>) -> Self {
        Self {
            resolver: Arc::downgrade(resolver),
            _contract: PhantomData,
        }
    }

    /// Resolves the service now. Fails if it was never registered or the
    /// resolver has already been torn down.
    pub fn get(&self) -> Result<Arc<T>, LumenError> {
        let resolver = self
            .resolver
            .upgrade()
            .ok_or_else(|| LumenError::Internal("service resolver dropped".into()))?;
        resolver.resolve::<T>()
    }
}

impl<T: ?Sized> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            _contract: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("contract", &type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync + std::fmt::Debug {
        fn greet(&self) -> String;
    }

    #[derive(Debug)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn resolve_returns_the_same_instance() {
        let resolver = ServiceResolver::new();
        resolver.register::<dyn Greeter>(Arc::new(English)).unwrap();

        let a = resolver.resolve::<dyn Greeter>().unwrap();
        let b = resolver.resolve::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.greet(), "hello");
    }

    #[test]
    fn resolve_unregistered_fails() {
        let resolver = ServiceResolver::new();
        let err = resolver.resolve::<dyn Greeter>().unwrap_err();
        assert!(matches!(err, LumenError::NotRegistered { .. }));
    }

    #[test]
    fn second_registration_is_rejected() {
        let resolver = ServiceResolver::new();
        resolver.register(Arc::new(42u32)).unwrap();
        let err = resolver.register(Arc::new(7u32)).unwrap_err();
        assert!(matches!(err, LumenError::AlreadyRegistered { .. }));
        assert_eq!(*resolver.resolve::<u32>().unwrap(), 42);
    }

    #[test]
    fn concrete_and_trait_contracts_are_distinct() {
        let resolver = ServiceResolver::new();
        let english = Arc::new(English);
        resolver.register(english.clone()).unwrap();
        resolver.register::<dyn Greeter>(english).unwrap();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.registered().len(), 2);
    }

    #[test]
    fn deferred_resolves_registrations_made_after_creation() {
        let resolver = Arc::new(ServiceResolver::new());
        let deferred = Deferred::<dyn Greeter>::new(&resolver);
        assert!(deferred.get().is_err());

        resolver.register::<dyn Greeter>(Arc::new(English)).unwrap();
        assert_eq!(deferred.get().unwrap().greet(), "hello");
    }

    #[test]
    fn deferred_fails_after_resolver_dropped() {
        let resolver = Arc::new(ServiceResolver::new());
        let deferred = Deferred::<u32>::new(&resolver);
        drop(resolver);
        assert!(matches!(deferred.get(), Err(LumenError::Internal(_))));
    }

    #[test]
    fn clear_empties_the_resolver() {
        let resolver = ServiceResolver::new();
        resolver.register(Arc::new(1u8)).unwrap();
        resolver.clear();
        assert!(resolver.is_empty());
        assert!(!resolver.contains::<u8>());
    }
}
