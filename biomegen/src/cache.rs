//! Bounded caches keyed by region coordinates.
//!
//! Cached values are always rebuildable from immutable inputs, so eviction only costs
//! time: an evicted entry built again is identical to the evicted one. There is therefore
//! no invalidation, only a size bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::debug;


/// Pack a region coordinate into a single 64 bits key, x in the low half.
#[inline]
pub fn region_key(x: i32, z: i32) -> u64 {
    (x as u32 as u64) | ((z as u32 as u64) << 32)
}


/// Size bounds of a region cache. The cache may grow up to `ceiling` entries, once it
/// goes past the ceiling the oldest entries are evicted down to `capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheBounds {
    pub capacity: usize,
    pub ceiling: usize,
}

impl CacheBounds {

    /// Create new bounds, the ceiling is raised to the capacity if lower and the
    /// capacity is at least one.
    pub fn new(capacity: usize, ceiling: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ceiling: ceiling.max(capacity),
        }
    }

}

impl Default for CacheBounds {
    fn default() -> Self {
        Self::new(1024, 1100)
    }
}


/// A single-threaded bounded map from region key to value. Entries are kept in
/// insertion order and evicted oldest first. A hit on an entry in the older half of the
/// map moves it to the newest position, which approximates LRU without reordering on
/// every access.
#[derive(Debug)]
pub struct RegionCache<V> {
    entries: IndexMap<u64, V>,
    bounds: CacheBounds,
}

impl<V> RegionCache<V> {

    pub fn new(bounds: CacheBounds) -> Self {
        Self {
            entries: IndexMap::with_capacity(bounds.ceiling + 1),
            bounds,
        }
    }

    pub fn get(&mut self, key: u64) -> Option<&V> {

        let mut index = self.entries.get_index_of(&key)?;
        let last = self.entries.len() - 1;

        if index < self.entries.len() / 2 {
            self.entries.move_index(index, last);
            index = last;
        }

        self.entries.get_index(index).map(|(_, value)| value)

    }

    /// Insert a value, replacing any previous one for that key. Returns the number of
    /// entries evicted to honor the ceiling.
    pub fn insert(&mut self, key: u64, value: V) -> usize {

        if let Some(index) = self.entries.get_index_of(&key) {
            let last = self.entries.len() - 1;
            self.entries.move_index(index, last);
            if let Some((_, slot)) = self.entries.get_index_mut(last) {
                *slot = value;
            }
            return 0;
        }

        self.entries.insert(key, value);

        if self.entries.len() > self.bounds.ceiling {
            self.trim()
        } else {
            0
        }

    }

    /// Evict the oldest entries until the cache is back to its capacity, returns the
    /// number of evicted entries.
    pub fn trim(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.bounds.capacity);
        if excess != 0 {
            self.entries.drain(..excess);
        }
        excess
    }

    /// Remove an entry, keeping the order of the others.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        self.entries.shift_remove(&key)
    }

    /// Get an entry without refreshing its position.
    #[inline]
    pub fn peek(&self, key: u64) -> Option<&V> {
        self.entries.get(&key)
    }

    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> CacheBounds {
        self.bounds
    }

}


/// Snapshot of the counters of a [`SharedRegionCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups served without building.
    pub hits: u64,
    /// Number of values built.
    pub misses: u64,
    /// Number of entries evicted.
    pub evictions: u64,
    /// Number of live entries at snapshot time.
    pub len: usize,
}

impl CacheStats {

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}


/// A thread-safe region cache where each value is built at most once per residency.
///
/// The map itself is only locked to find or create the slot of a key, the build then
/// happens outside of the map lock in the slot's once-cell: concurrent callers for the
/// same key wait for the single build, callers for other keys are not blocked.
#[derive(Debug)]
pub struct SharedRegionCache<V> {
    name: &'static str,
    slots: Mutex<RegionCache<Arc<OnceCell<Arc<V>>>>>,
    counters: Counters,
}

impl<V> SharedRegionCache<V> {

    /// Create a new cache, the name is only used in traces.
    pub fn new(name: &'static str, bounds: CacheBounds) -> Self {
        Self {
            name,
            slots: Mutex::new(RegionCache::new(bounds)),
            counters: Counters::default(),
        }
    }

    /// Get the value of the given region, building it if absent.
    pub fn get_or_build<F>(&self, x: i32, z: i32, build: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_build(x, z, || Ok::<_, std::convert::Infallible>(build())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Get the value of the given region, building it if absent. A failed build leaves
    /// the slot empty, so the next lookup tries again.
    pub fn get_or_try_build<F, E>(&self, x: i32, z: i32, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {

        let key = region_key(x, z);
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    let slot = Arc::new(OnceCell::new());
                    let evicted = slots.insert(key, Arc::clone(&slot));
                    if evicted != 0 {
                        self.counters.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
                        debug!("{} cache evicted {evicted} regions, {} left", self.name, slots.len());
                    }
                    slot
                }
            }
        };

        if let Some(value) = slot.get() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(value));
        }

        let mut built = false;
        let value = match slot.get_or_try_init(|| {
            built = true;
            build().map(Arc::new)
        }) {
            Ok(value) => value,
            Err(e) => {
                // Drop the empty slot so it takes no room, unless it has been replaced.
                let mut slots = self.slots.lock().unwrap();
                if slots.peek(key).is_some_and(|current| Arc::ptr_eq(current, &slot) && current.get().is_none()) {
                    slots.remove(key);
                }
                return Err(e);
            }
        };

        if built {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }

        Ok(Arc::clone(value))

    }

    /// Return true if the region is resident, either built or being built. Failed builds
    /// are not kept.
    pub fn contains(&self, x: i32, z: i32) -> bool {
        let slots = self.slots.lock().unwrap();
        slots.contains(region_key(x, z))
    }

    /// Evict down to the cache capacity.
    pub fn trim(&self) -> usize {
        let evicted = self.slots.lock().unwrap().trim();
        self.counters.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            len: self.slots.lock().unwrap().len(),
        }
    }

}
