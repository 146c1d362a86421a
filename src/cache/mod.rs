//! Bounded TTL caches.
//!
//! Every cache in the renderer is a [`TtlCache`]: a capacity-limited map with
//! least-recently-used eviction and lazy expiry. An entry past its deadline is
//! removed by the read that finds it, never by a background sweep.
//!
//! ```text
//! get(k) ──► lock ──► entry? ──► expired? ──► remove, miss
//!                       │            └──────► bump recency, hit
//!                       └──► miss
//! ```
//!
//! One `parking_lot::Mutex` covers lookup, expiry and insert. Callers compute
//! values outside the lock and publish them with [`TtlCache::get_or_insert`],
//! so two threads racing on the same key agree on one value.
//!
//! Time comes from an injected [`Clock`]; tests drive expiry with
//! [`ManualClock`].

mod render;

pub use render::{CompositionCache, CompositionKey, PageKey, PageRenderCache};

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

// ============================================================================
// Clock
// ============================================================================

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

// ============================================================================
// TtlCache
// ============================================================================

struct Entry<V> {
    value: V,
    expires: Option<Instant>,
    /// Recency stamp, key into `Slots::order`.
    tick: u64,
}

struct Slots<K, V> {
    entries: FxHashMap<K, Entry<V>>,
    /// Oldest first.
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V> Slots<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, old: u64) -> u64 {
        let tick = self.next_tick();
        if let Some(key) = self.order.remove(&old) {
            self.order.insert(tick, key);
        }
        tick
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry)
    }

    fn evict_to(&mut self, capacity: usize) {
        while self.entries.len() >= capacity {
            match self.order.pop_first() {
                Some((_, key)) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Capacity-bounded map with LRU eviction and lazy TTL expiry.
pub struct TtlCache<K, V> {
    slots: Mutex<Slots<K, V>>,
    capacity: usize,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.slots.lock().entries.len())
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create a cache. `ttl = None` keeps entries until evicted.
    pub fn new(capacity: usize, ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: FxHashMap::default(),
                order: BTreeMap::new(),
                tick: 0,
            }),
            capacity: capacity.max(1),
            ttl,
            clock,
        }
    }

    /// Look up a live entry, removing it if it has expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        let (expired, old) = match slots.entries.get(key) {
            Some(entry) => (entry.expires.is_some_and(|at| at <= now), entry.tick),
            None => return None,
        };
        if expired {
            slots.remove(key);
            return None;
        }
        let tick = slots.touch(old);
        let entry = slots.entries.get_mut(key)?;
        entry.tick = tick;
        Some(entry.value.clone())
    }

    /// Insert or replace an entry, evicting the least recently used on overflow.
    pub fn insert(&self, key: K, value: V) {
        let expires = self.ttl.map(|ttl| self.clock.now() + ttl);
        let mut slots = self.slots.lock();
        slots.remove(&key);
        slots.evict_to(self.capacity);
        let tick = slots.next_tick();
        slots.order.insert(tick, key.clone());
        slots.entries.insert(key, Entry { value, expires, tick });
    }

    /// Return the live entry for `key`, or publish `value` and return it.
    pub fn get_or_insert(&self, key: K, value: V) -> V {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        if let Some(entry) = slots.entries.get(&key) {
            if entry.expires.is_none_or(|at| at > now) {
                let old = entry.tick;
                let tick = slots.touch(old);
                if let Some(entry) = slots.entries.get_mut(&key) {
                    entry.tick = tick;
                    return entry.value.clone();
                }
            }
            slots.remove(&key);
        }
        slots.evict_to(self.capacity);
        let tick = slots.next_tick();
        slots.order.insert(tick, key.clone());
        slots.entries.insert(
            key,
            Entry {
                value: value.clone(),
                expires: self.ttl.map(|ttl| now + ttl),
                tick,
            },
        );
        value
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.lock().remove(key).map(|entry| entry.value)
    }

    /// Drop every entry for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        let mut slots = self.slots.lock();
        let doomed: Vec<K> = slots
            .entries
            .iter()
            .filter(|(key, entry)| !keep(key, &entry.value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            slots.remove(&key);
        }
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        slots.entries.clear();
        slots.order.clear();
    }

    /// Number of stored entries, expired ones included until read.
    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
