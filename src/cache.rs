//! Time-to-live cache over the loaded sources.
//!
//! Each source gets one [`CacheSlot`]. A slot is Empty until first read, then
//! Fresh until its entry outlives the TTL (or the source file changes on disk,
//! or it is invalidated), then Stale; the next read reloads it. A reload
//! builds the new value completely and publishes it by swapping an `Arc`, so
//! concurrent readers see either the old entry or the new one. Reloads are
//! serialized per slot: readers arriving while a reload is in flight wait for
//! it and reuse its result instead of loading again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant, SystemTime};

use log::{debug, info};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader;
use crate::models::{ImageTable, LoadReport, Loaded, PriceSeries, SourceKind, SupplyTable};

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// A published cache value with the time it was produced.
#[derive(Debug)]
pub struct CacheEntry<T> {
    value: Arc<T>,
    loaded_at: Instant,
    ttl: Option<Duration>,
    source_modified: Option<SystemTime>,
}

impl<T> CacheEntry<T> {
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.loaded_at)
    }

    /// `true` once the entry's age reaches the TTL. Never for an unbounded TTL.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => self.age(now) >= ttl,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Empty,
    Fresh,
    Stale,
}

// ---------------------------------------------------------------------------
// CacheSlot
// ---------------------------------------------------------------------------

/// One process-wide cached value with TTL invalidation.
pub struct CacheSlot<T> {
    ttl: Option<Duration>,
    watch: Option<PathBuf>,
    entry: RwLock<Option<Arc<CacheEntry<T>>>>,
    invalidated: AtomicBool,
    reload: Mutex<()>,
    loads: AtomicUsize,
}

impl<T> CacheSlot<T> {
    /// Create an empty slot. `None` means the value never expires.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            watch: None,
            entry: RwLock::new(None),
            invalidated: AtomicBool::new(false),
            reload: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Also treat the entry as stale when `path`'s modification time differs
    /// from the one recorded at load time (including the file appearing or
    /// disappearing).
    pub fn watching<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.watch = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Number of times the loader has completed successfully.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The currently published entry, fresh or not.
    pub fn entry(&self) -> Option<Arc<CacheEntry<T>>> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Force the next read to reload. The current entry stays published.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> SlotState {
        self.state_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> SlotState {
        match self.entry() {
            None => SlotState::Empty,
            Some(entry) if self.is_fresh(&entry, now) => SlotState::Fresh,
            Some(_) => SlotState::Stale,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<T>, now: Instant) -> bool {
        if self.invalidated.load(Ordering::SeqCst) || entry.is_expired(now) {
            return false;
        }
        match &self.watch {
            Some(path) => loader::file_modified(path) == entry.source_modified,
            None => true,
        }
    }

    fn fresh_value(&self, now: Instant) -> Option<Arc<T>> {
        let entry = self.entry()?;
        if self.is_fresh(&entry, now) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Return the cached value, loading it first if the slot is Empty or Stale.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.get_or_load_at(Instant::now(), load)
    }

    /// [`get_or_load`](Self::get_or_load) with an explicit clock reading.
    ///
    /// A failed load publishes nothing; the previous entry stays in place
    /// and the slot stays Stale, so the next read tries again.
    pub fn get_or_load_at<F>(&self, now: Instant, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.fresh_value(now) {
            return Ok(value);
        }

        let _guard = self.reload.lock().unwrap_or_else(PoisonError::into_inner);
        // Another reader may have reloaded while we waited for the lock.
        if let Some(value) = self.fresh_value(now) {
            return Ok(value);
        }

        // Cleared before loading so an invalidation during the load sticks.
        self.invalidated.store(false, Ordering::SeqCst);
        let source_modified = self.watch.as_deref().and_then(loader::file_modified);
        let value = match load() {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.invalidated.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };
        let entry = Arc::new(CacheEntry {
            value: value.clone(),
            loaded_at: now,
            ttl: self.ttl,
            source_modified,
        });
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// CacheManager
// ---------------------------------------------------------------------------

/// Per-source statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStats {
    pub source: SourceKind,
    pub state: SlotState,
    pub loads: usize,
    pub age: Option<Duration>,
    pub ttl: Option<Duration>,
}

/// Owns the cache slots for the price, supply and image sources.
///
/// Slots are created with the manager and live as long as it does; share
/// one manager (behind an `Arc`) between every consumer that should see the
/// same cached data.
pub struct CacheManager {
    config: PipelineConfig,
    prices: CacheSlot<Loaded<PriceSeries>>,
    supply: CacheSlot<Loaded<SupplyTable>>,
    images: CacheSlot<Loaded<ImageTable>>,
}

impl CacheManager {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let prices = Self::slot(&config, SourceKind::Prices);
        let supply = Self::slot(&config, SourceKind::Supply);
        let images = Self::slot(&config, SourceKind::Images);
        Ok(Self {
            config,
            prices,
            supply,
            images,
        })
    }

    fn slot<T>(config: &PipelineConfig, kind: SourceKind) -> CacheSlot<T> {
        let slot = CacheSlot::new(config.ttl(kind));
        if config.watch_modifications {
            slot.watching(config.source_path(kind))
        } else {
            slot
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        self.config.source_path(kind)
    }

    /// The price history, reloaded when stale.
    pub fn prices(&self) -> Result<Arc<Loaded<PriceSeries>>> {
        let path = self.source_path(SourceKind::Prices);
        self.prices.get_or_load(|| {
            info!("Loading price history from {}", path.display());
            loader::load_price_series(&path)
        })
    }

    /// The supply table, reloaded when stale.
    pub fn supply(&self) -> Result<Arc<Loaded<SupplyTable>>> {
        let path = self.source_path(SourceKind::Supply);
        self.supply.get_or_load(|| {
            info!("Loading supply table from {}", path.display());
            loader::load_supply_table(&path)
        })
    }

    /// The image table, reloaded when stale.
    pub fn images(&self) -> Result<Arc<Loaded<ImageTable>>> {
        let path = self.source_path(SourceKind::Images);
        let schemes = &self.config.image_url_schemes;
        self.images.get_or_load(|| {
            info!("Loading image table from {}", path.display());
            loader::load_image_table(&path, schemes)
        })
    }

    /// Load reports of every source loaded so far.
    pub fn load_reports(&self) -> Vec<LoadReport> {
        let mut reports = Vec::new();
        if let Some(entry) = self.prices.entry() {
            reports.push(entry.value().report.clone());
        }
        if let Some(entry) = self.supply.entry() {
            reports.push(entry.value().report.clone());
        }
        if let Some(entry) = self.images.entry() {
            reports.push(entry.value().report.clone());
        }
        reports
    }

    /// Mark one source stale.
    pub fn invalidate(&self, kind: SourceKind) {
        debug!("Invalidating {} cache", kind);
        match kind {
            SourceKind::Prices => self.prices.invalidate(),
            SourceKind::Supply => self.supply.invalidate(),
            SourceKind::Images => self.images.invalidate(),
        }
    }

    /// Mark every source stale; each reloads on its next read.
    pub fn invalidate_all(&self) {
        for kind in SourceKind::ALL {
            self.invalidate(kind);
        }
    }

    pub fn stats(&self) -> Vec<SlotStats> {
        let now = Instant::now();
        vec![
            slot_stats(SourceKind::Prices, &self.prices, now),
            slot_stats(SourceKind::Supply, &self.supply, now),
            slot_stats(SourceKind::Images, &self.images, now),
        ]
    }
}

fn slot_stats<T>(source: SourceKind, slot: &CacheSlot<T>, now: Instant) -> SlotStats {
    SlotStats {
        source,
        state: slot.state_at(now),
        loads: slot.load_count(),
        age: slot.entry().map(|e| e.age(now)),
        ttl: slot.ttl(),
    }
}
