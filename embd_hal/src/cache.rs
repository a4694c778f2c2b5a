//! Keyed instance caches shared by the generic drivers.
//!
//! A driver owns its cache; every cached object receives a [`DriverLink`], a
//! non-owning handle it uses to evict itself on `close()`. Each insertion is
//! stamped with a serial so a stale link can never evict a newer instance
//! cached under the same key.

use embd_common::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

struct Slot<V> {
    serial: u64,
    value: V,
}

type SlotMap<K, V> = Mutex<HashMap<K, Slot<V>>>;

trait Evict<K>: Send + Sync {
    fn evict(&self, key: &K, serial: u64);
}

impl<K, V> Evict<K> for SlotMap<K, V>
where
    K: Eq + Hash + Send,
    V: Send,
{
    fn evict(&self, key: &K, serial: u64) {
        let mut map = self.lock();
        if map.get(key).is_some_and(|slot| slot.serial == serial) {
            map.remove(key);
        }
    }
}

/// Non-owning back-reference from a cached object to its driver.
#[derive(Clone)]
pub struct DriverLink<K> {
    key: K,
    serial: u64,
    cache: Weak<dyn Evict<K>>,
}

impl<K: Eq + Hash + Send + 'static> DriverLink<K> {
    /// A link not attached to any driver; `unregister` is a no-op.
    pub fn detached(key: K) -> Self {
        let cache: Weak<dyn Evict<K>> = Weak::<SlotMap<K, ()>>::new();
        Self {
            key,
            serial: 0,
            cache,
        }
    }

    /// Remove the owner from its driver's cache, if it is still the cached
    /// instance for its key.
    pub fn unregister(&self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.evict(&self.key, self.serial);
        }
    }

    /// The cache key this link was issued for.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for DriverLink<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverLink")
            .field("key", &self.key)
            .field("serial", &self.serial)
            .finish()
    }
}

/// Mutex-guarded map of live instances.
pub struct Cache<K, V> {
    slots: Arc<SlotMap<K, V>>,
    next_serial: AtomicU64,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_serial: AtomicU64::new(1),
        }
    }

    fn link(&self, key: K) -> DriverLink<K> {
        let cache: Weak<dyn Evict<K>> = Arc::downgrade(&self.slots) as Weak<dyn Evict<K>>;
        DriverLink {
            key,
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
            cache,
        }
    }

    /// Return the cached value for `key` through `reuse`, or build one with
    /// `create` and cache it.
    ///
    /// The cache lock is held across `create`, so two racing callers never
    /// build two instances for one key.
    pub fn acquire<R>(
        &self,
        key: K,
        reuse: impl FnOnce(&V) -> Result<R>,
        create: impl FnOnce(DriverLink<K>) -> Result<(V, R)>,
    ) -> Result<R> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(&key) {
            return reuse(&slot.value);
        }
        let link = self.link(key.clone());
        let serial = link.serial;
        let (value, result) = create(link)?;
        slots.insert(key, Slot { serial, value });
        Ok(result)
    }

    /// Build a value with `create` and cache it, replacing whatever was cached
    /// under `key`. The replaced value is returned so the caller can decide
    /// its fate.
    pub fn replace(
        &self,
        key: K,
        create: impl FnOnce(DriverLink<K>) -> Result<V>,
    ) -> Result<(V, Option<V>)> {
        let mut slots = self.slots.lock();
        let link = self.link(key.clone());
        let serial = link.serial;
        let value = create(link)?;
        let previous = slots.insert(
            key,
            Slot {
                serial,
                value: value.clone(),
            },
        );
        Ok((value, previous.map(|slot| slot.value)))
    }

    /// Drop the entry for `key`, returning it.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.slots.lock().remove(key).map(|slot| slot.value)
    }

    /// Remove and return every cached value. The lock is released before the
    /// caller gets the values, so closing them may call back into the cache.
    pub fn drain(&self) -> Vec<V> {
        self.slots
            .lock()
            .drain()
            .map(|(_, slot)| slot.value)
            .collect()
    }

    /// True if `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        self.slots.lock().contains_key(key)
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
