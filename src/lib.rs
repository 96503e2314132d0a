//! Price history SDK for Rust.
//!
//! Reads a periodically refreshed item price history plus two auxiliary
//! sources (estimated supply counts and image URLs) from local CSV files,
//! caches each source with its own time-to-live, reconciles item names across
//! the sources despite differences in whitespace, case and quoting, and
//! computes gap-tolerant statistics (current price, min/max, percent change,
//! moving average) over a calendar-date window.
//!
//! # Quick start
//!
//! ```no_run
//! use price_history_sdk::{PriceHistorySdk, Selection};
//!
//! let sdk = PriceHistorySdk::builder().data_dir("data").build().unwrap();
//!
//! // First item over the whole history, 6-hour moving average
//! let selection = sdk.prices().default_selection().unwrap().unwrap();
//! for summary in sdk.analytics().dashboard(&selection).unwrap() {
//!     println!(
//!         "{}: {:?} (supply {})",
//!         summary.analytics.item, summary.analytics.current_price, summary.resolution.supply
//!     );
//! }
//! ```

pub mod analytics;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod queries;
pub mod reconcile;

#[cfg(feature = "async")]
pub use async_client::AsyncPriceHistorySdk;
pub use cache::{CacheManager, CacheSlot};
pub use config::PipelineConfig;
pub use error::{PriceHistoryError, Result};
pub use models::{
    AnalyticsResult, DateWindow, ImageTable, ItemSummary, LoadReport, PriceSeries, Resolution,
    Selection, SourceKind, SupplyTable,
};
pub use normalize::name_variants;
pub use reconcile::Reconciler;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::info;

// ---------------------------------------------------------------------------
// PriceHistorySdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceHistorySdk`] instance.
///
/// Use [`PriceHistorySdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](PriceHistorySdkBuilder::build) to create the SDK.
#[derive(Default)]
pub struct PriceHistorySdkBuilder {
    config: PipelineConfig,
    shared_cache: Option<Arc<CacheManager>>,
}

impl PriceHistorySdkBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory holding the source files. Defaults to `./data`.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Price history file, relative to the data directory unless absolute.
    pub fn price_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.price_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Supply file, relative to the data directory unless absolute.
    pub fn supply_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.supply_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Image file, relative to the data directory unless absolute.
    pub fn image_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.image_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Time-to-live of the price cache; `None` never expires.
    ///
    /// Defaults to 60 seconds.
    pub fn price_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.config.price_ttl_secs = ttl.map(|d| d.as_secs_f64());
        self
    }

    /// Time-to-live of the supply cache. Defaults to one hour.
    pub fn supply_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.config.supply_ttl_secs = ttl.map(|d| d.as_secs_f64());
        self
    }

    /// Time-to-live of the image cache. Defaults to never expiring.
    pub fn image_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.config.image_ttl_secs = ttl.map(|d| d.as_secs_f64());
        self
    }

    /// Reload a source as soon as its file's modification time changes.
    ///
    /// Defaults to `true`.
    pub fn watch_modifications(mut self, watch: bool) -> Self {
        self.config.watch_modifications = watch;
        self
    }

    /// Sampling cadence of the price source. Defaults to 2 (every 30 minutes).
    pub fn observations_per_hour(mut self, n: u32) -> Self {
        self.config.observations_per_hour = n;
        self
    }

    /// Image URL reported for items without an image row.
    pub fn fallback_image_url(mut self, url: impl Into<String>) -> Self {
        self.config.fallback_image_url = url.into();
        self
    }

    /// URL prefixes that mark where the URL starts in an image-source line.
    pub fn image_url_schemes<S: Into<String>>(mut self, schemes: impl IntoIterator<Item = S>) -> Self {
        self.config.image_url_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Reuse an existing cache instead of creating one.
    ///
    /// SDK instances built this way share cached entries (and their TTLs).
    /// The cache's own configuration wins over any other builder setting.
    pub fn shared_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Build the SDK.
    ///
    /// Nothing is read eagerly; each source is loaded on first access.
    pub fn build(self) -> Result<PriceHistorySdk> {
        let cache = match self.shared_cache {
            Some(cache) => cache,
            None => Arc::new(CacheManager::new(self.config)?),
        };
        Ok(PriceHistorySdk { cache })
    }
}

// ---------------------------------------------------------------------------
// PriceHistorySdk
// ---------------------------------------------------------------------------

/// The main entry point for the price history SDK.
///
/// Wraps a shared [`CacheManager`] and exposes domain-specific query
/// interfaces as lightweight borrowing wrappers. Cloning is cheap and clones
/// share the cache.
///
/// Created via [`PriceHistorySdk::builder()`].
#[derive(Clone)]
pub struct PriceHistorySdk {
    cache: Arc<CacheManager>,
}

impl PriceHistorySdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> PriceHistorySdkBuilder {
        PriceHistorySdkBuilder::default()
    }

    /// Build an SDK from a JSON config file (see [`PipelineConfig`]).
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = config::load_config(path)?;
        Self::builder().config(config).build()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the price history query interface.
    pub fn prices(&self) -> queries::PriceQuery<'_> {
        queries::PriceQuery::new(&self.cache)
    }

    /// Access the supply/image lookup and reconciliation interface.
    pub fn catalog(&self) -> queries::CatalogQuery<'_> {
        queries::CatalogQuery::new(&self.cache)
    }

    /// Access the analytics interface.
    pub fn analytics(&self) -> queries::AnalyticsQuery<'_> {
        queries::AnalyticsQuery::new(&self.cache)
    }

    // -- Cache and metadata ------------------------------------------------

    /// Mark every cached source stale so the next read reloads it.
    pub fn refresh(&self) {
        self.cache.invalidate_all();
        info!("Price history caches invalidated; sources reload on next access");
    }

    /// Reports of the most recent load of each source read so far.
    pub fn load_reports(&self) -> Vec<LoadReport> {
        self.cache.load_reports()
    }

    /// Per-source cache state, load count and age.
    pub fn cache_stats(&self) -> Vec<cache::SlotStats> {
        self.cache.stats()
    }

    /// The shared cache, for building further SDK instances over it.
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn config(&self) -> &PipelineConfig {
        self.cache.config()
    }

    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        self.cache.source_path(kind)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for PriceHistorySdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.cache.config();
        write!(
            f,
            "PriceHistorySdk(data_dir={}, observations_per_hour={}, watch_modifications={})",
            config.data_dir.display(),
            config.observations_per_hour,
            config.watch_modifications
        )
    }
}
