//! # Rendered Label Cache
//!
//! A bounded, content-addressed store of rendered labels with strict LRU
//! eviction and in-flight deduplication.
//!
//! ## Lookup Flow
//!
//! ```text
//! get_or_render(key)
//!   ├─ entry present ─────────────► refresh recency, return clone   (hit)
//!   ├─ render in flight for key ──► wait, return the same outcome
//!   └─ otherwise ─► open flight ──► render_fn() ─► insert + evict ─► publish, wake waiters
//! ```
//!
//! At most one render runs per key at a time, and everyone who arrived while
//! it ran gets its outcome. If that render fails, nothing is inserted and
//! every caller of that flight receives the same error. The next request
//! after the flight closes renders again.
//!
//! ## Recency
//!
//! Access stamps come from an injected [`Clock`]. Eviction removes the entry
//! with the oldest access stamp; entries with equal stamps go in insertion
//! order.

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::barcode::BarcodeValue;
use crate::error::EtiquetaError;
use crate::render::RenderedImage;

/// Default number of labels kept in memory
pub const DEFAULT_CAPACITY: usize = 100;

/// Cache identity: the value and the canvas it was rendered on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub value: BarcodeValue,
    pub width: u32,
    pub height: u32,
}

impl RenderKey {
    pub fn new(value: BarcodeValue, width: u32, height: u32) -> Self {
        Self {
            value,
            width,
            height,
        }
    }
}

/// Source of recency stamps.
pub trait Clock: Send + Sync {
    /// Return the stamp for an access happening now.
    fn tick(&self) -> u64;
}

/// Monotonic counter: every tick is unique and increasing.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Clock for Counter {
    fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls made to a render function (successful or not)
    pub renders: u64,
    pub evictions: u64,
    pub entries: usize,
    pub capacity: usize,
}

struct Entry {
    image: RenderedImage,
    inserted: u64,
    last_used: u64,
}

/// One in-flight render and, once finished, its outcome.
#[derive(Default)]
struct Flight {
    outcome: OnceLock<Result<RenderedImage, EtiquetaError>>,
}

#[derive(Default)]
struct State {
    entries: HashMap<RenderKey, Entry>,
    pending: HashMap<RenderKey, Arc<Flight>>,
    next_insert: u64,
}

/// # Image Cache
///
/// ## Example
///
/// ```
/// use etiqueta::barcode::{self, BarcodeValue};
/// use etiqueta::cache::{ImageCache, RenderKey};
/// use etiqueta::render;
///
/// let cache = ImageCache::new(100);
/// let value = BarcodeValue::new("ABC-123")?;
/// let key = RenderKey::new(value.clone(), 600, 300);
///
/// let label = cache.get_or_render(&key, || {
///     render::render(&barcode::encode(&value), 600, 300)
/// })?;
/// assert!(cache.contains(&key));
/// # Ok::<(), etiqueta::EtiquetaError>(())
/// ```
pub struct ImageCache<C: Clock = Counter> {
    capacity: usize,
    clock: C,
    state: Mutex<State>,
    settled: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
    renders: AtomicU64,
    evictions: AtomicU64,
}

impl ImageCache<Counter> {
    /// Create a cache holding at most `capacity` labels (at least one).
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Counter::default())
    }
}

impl Default for ImageCache<Counter> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<C: Clock> ImageCache<C> {
    /// Create a cache with an explicit recency clock.
    pub fn with_clock(capacity: usize, clock: C) -> Self {
        Self {
            capacity: capacity.max(1),
            clock,
            state: Mutex::new(State::default()),
            settled: Condvar::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached label for `key`, rendering it with `render_fn` on a
    /// miss.
    ///
    /// ## Errors
    ///
    /// Whatever `render_fn` returns, or a copy of the error from the render
    /// this call waited on. Failed renders are not cached.
    pub fn get_or_render<F>(
        &self,
        key: &RenderKey,
        render_fn: F,
    ) -> Result<RenderedImage, EtiquetaError>
    where
        F: FnOnce() -> Result<RenderedImage, EtiquetaError>,
    {
        let flight = {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.get_mut(key) {
                entry.last_used = self.clock.tick();
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("cache hit: {:?} {}x{}", key.value.as_str(), key.width, key.height);
                return Ok(entry.image.clone());
            }

            if let Some(flight) = state.pending.get(key).cloned() {
                loop {
                    match flight.outcome.get() {
                        Some(Ok(image)) => {
                            self.hits.fetch_add(1, Ordering::Relaxed);
                            log::debug!("cache shared: {:?}", key.value.as_str());
                            return Ok(image.clone());
                        }
                        Some(Err(e)) => return Err(e.clone()),
                        None => self.settled.wait(&mut state),
                    }
                }
            }

            let flight = Arc::new(Flight::default());
            state.pending.insert(key.clone(), Arc::clone(&flight));
            flight
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("cache miss: {:?} {}x{}", key.value.as_str(), key.width, key.height);

        // Publishes an outcome, closes the flight and wakes waiters on every
        // exit path, including a panicking render_fn.
        let pending = PendingGuard {
            cache: self,
            key,
            flight: &flight,
        };

        let result = render_fn();
        self.renders.fetch_add(1, Ordering::Relaxed);

        if let Ok(image) = &result {
            self.insert(key.clone(), image.clone());
        }
        let _ = flight.outcome.set(result.clone());
        drop(pending);
        result
    }

    /// Look up without rendering or refreshing recency.
    pub fn peek(&self, key: &RenderKey) -> Option<RenderedImage> {
        let state = self.state.lock();
        state.entries.get(key).map(|entry| entry.image.clone())
    }

    pub fn contains(&self, key: &RenderKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &RenderKey) -> bool {
        let removed = self.state.lock().entries.remove(key).is_some();
        if removed {
            log::debug!("cache invalidate: {:?}", key.value.as_str());
        }
        removed
    }

    /// Drop every entry. Renders already in flight still complete and insert.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        log::debug!("cache cleared ({} entries)", dropped);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.capacity,
        }
    }

    fn insert(&self, key: RenderKey, image: RenderedImage) {
        let mut state = self.state.lock();
        let inserted = state.next_insert;
        state.next_insert += 1;
        let last_used = self.clock.tick();
        state.entries.insert(
            key,
            Entry {
                image,
                inserted,
                last_used,
            },
        );

        while state.entries.len() > self.capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_used, entry.inserted))
                .map(|(key, _)| key.clone());
            let Some(victim) = victim else { break };
            state.entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("cache evict: {:?} {}x{}", victim.value.as_str(), victim.width, victim.height);
        }
    }
}

struct PendingGuard<'a, C: Clock> {
    cache: &'a ImageCache<C>,
    key: &'a RenderKey,
    flight: &'a Arc<Flight>,
}

impl<C: Clock> Drop for PendingGuard<'_, C> {
    fn drop(&mut self) {
        // Only unset when render_fn panicked
        let _ = self.flight.outcome.set(Err(EtiquetaError::Image(format!(
            "render of {:?} panicked",
            self.key.value.as_str()
        ))));

        let mut state = self.cache.state.lock();
        if state
            .pending
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, self.flight))
        {
            state.pending.remove(self.key);
        }
        drop(state);
        self.cache.settled.notify_all();
    }
}
