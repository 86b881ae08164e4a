use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{DomainError, DomainResult};
use crate::identity::Identity;

/// Key/value contract for the external identity store.
///
/// The credential core never owns identities; account flows receive an
/// implementation of this trait and use it to look up the stored record
/// (typically a secret digest) for a principal.
pub trait IdentityStore<V>: Send + Sync {
    fn get(&self, identity: &Identity) -> Option<V>;
    /// Insert or replace the record for `identity`.
    fn put(&self, identity: Identity, value: V) -> DomainResult<()>;
    fn exists(&self, identity: &Identity) -> bool;
    /// Insert the record only if `identity` is unknown (atomic check-and-set).
    fn create(&self, identity: Identity, value: V) -> DomainResult<()>;
}

impl<V, S> IdentityStore<V> for Arc<S>
where
    S: IdentityStore<V> + ?Sized,
{
    fn get(&self, identity: &Identity) -> Option<V> {
        (**self).get(identity)
    }

    fn put(&self, identity: Identity, value: V) -> DomainResult<()> {
        (**self).put(identity, value)
    }

    fn exists(&self, identity: &Identity) -> bool {
        (**self).exists(identity)
    }

    fn create(&self, identity: Identity, value: V) -> DomainResult<()> {
        (**self).create(identity, value)
    }
}

/// In-memory identity store for tests/dev.
#[derive(Debug)]
pub struct InMemoryIdentityStore<V> {
    inner: RwLock<HashMap<Identity, V>>,
}

impl<V> InMemoryIdentityStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for InMemoryIdentityStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IdentityStore<V> for InMemoryIdentityStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, identity: &Identity) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(identity).cloned()
    }

    fn put(&self, identity: Identity, value: V) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("identity store lock poisoned"))?;
        map.insert(identity, value);
        Ok(())
    }

    fn exists(&self, identity: &Identity) -> bool {
        self.inner
            .read()
            .map(|m| m.contains_key(identity))
            .unwrap_or(false)
    }

    fn create(&self, identity: Identity, value: V) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("identity store lock poisoned"))?;
        if map.contains_key(&identity) {
            return Err(DomainError::conflict(format!("identity '{identity}' already exists")));
        }
        map.insert(identity, value);
        Ok(())
    }
}
