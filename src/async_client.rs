//! Async wrapper around [`PriceHistorySdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! sources are read and parsed.
//!
//! # Example
//!
//! ```no_run
//! use price_history_sdk::AsyncPriceHistorySdk;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncPriceHistorySdk::builder().data_dir("data").build().await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let items = sdk.run(|s| s.prices().items()).await.unwrap();
//!
//!     // Convenience method for the reconciled item list
//!     let resolved = sdk.resolve_all().await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PriceHistoryError, Result};
use crate::models::{ItemSummary, LoadReport, Resolution, Selection};
use crate::PriceHistorySdk;

// ---------------------------------------------------------------------------
// AsyncPriceHistorySdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncPriceHistorySdk`] instance.
#[derive(Default)]
pub struct AsyncPriceHistorySdkBuilder {
    data_dir: Option<PathBuf>,
    price_ttl: Option<Option<Duration>>,
    config_file: Option<PathBuf>,
}

impl AsyncPriceHistorySdkBuilder {
    /// Set the directory holding the source files.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the time-to-live of the price cache.
    pub fn price_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.price_ttl = Some(ttl);
        self
    }

    /// Read the configuration from a JSON file first; other settings
    /// override it.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the async SDK.
    ///
    /// Reading the config file runs on the blocking thread pool so it won't
    /// block the async event loop.
    pub async fn build(self) -> Result<AsyncPriceHistorySdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = PriceHistorySdk::builder();
            if let Some(path) = self.config_file {
                builder = builder.config(crate::config::load_config(path)?);
            }
            if let Some(dir) = self.data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(ttl) = self.price_ttl {
                builder = builder.price_ttl(ttl);
            }
            Ok(AsyncPriceHistorySdk {
                inner: builder.build()?,
            })
        })
        .await
        .map_err(|e| PriceHistoryError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncPriceHistorySdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`PriceHistorySdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The SDK's cache is thread-safe, so
/// concurrent calls share cached sources without an outer lock.
#[derive(Clone)]
pub struct AsyncPriceHistorySdk {
    inner: PriceHistorySdk,
}

impl AsyncPriceHistorySdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncPriceHistorySdkBuilder {
        AsyncPriceHistorySdkBuilder::default()
    }

    /// Wrap an existing SDK; both keep sharing the same cache.
    pub fn from_sdk(sdk: PriceHistorySdk) -> Self {
        Self { inner: sdk }
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&PriceHistorySdk` reference and should return
    /// a `Result<T>`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use price_history_sdk::AsyncPriceHistorySdk;
    /// # async fn example() -> price_history_sdk::Result<()> {
    /// # let sdk = AsyncPriceHistorySdk::builder().build().await?;
    /// let bounds = sdk.run(|s| s.prices().date_bounds()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PriceHistorySdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&sdk))
            .await
            .map_err(|e| PriceHistoryError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Reconciled supply/image plus statistics for a selection.
    pub async fn dashboard(&self, selection: Selection) -> Result<Vec<ItemSummary>> {
        self.run(move |s| s.analytics().dashboard(&selection)).await
    }

    /// Resolve every price item against the supply and image tables.
    pub async fn resolve_all(&self) -> Result<Vec<Resolution>> {
        self.run(|s| s.catalog().resolve_all()).await
    }

    /// Mark every cached source stale.
    pub async fn refresh(&self) -> Result<()> {
        self.run(|s| {
            s.refresh();
            Ok(())
        })
        .await
    }

    /// Reports of the most recent load of each source.
    pub async fn load_reports(&self) -> Result<Vec<LoadReport>> {
        self.run(|s| Ok(s.load_reports())).await
    }

    /// Borrow the synchronous SDK.
    pub fn sdk(&self) -> &PriceHistorySdk {
        &self.inner
    }
}
