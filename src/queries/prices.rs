//! Price-history queries against the cached price source.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::cache::CacheManager;
use crate::error::{PriceHistoryError, Result};
use crate::models::{DateWindow, Loaded, PriceSeries, Selection};

// ---------------------------------------------------------------------------
// PriceQuery
// ---------------------------------------------------------------------------

/// Query interface for the price history.
pub struct PriceQuery<'a> {
    cache: &'a CacheManager,
}

impl<'a> PriceQuery<'a> {
    /// Create a new `PriceQuery` bound to the given cache.
    pub fn new(cache: &'a CacheManager) -> Self {
        Self { cache }
    }

    /// The cached price history with its load report.
    pub fn load(&self) -> Result<Arc<Loaded<PriceSeries>>> {
        self.cache.prices()
    }

    /// Tracked item names in source column order.
    pub fn items(&self) -> Result<Vec<String>> {
        Ok(self.load()?.value.items().to_vec())
    }

    /// First and last calendar date of the history, `None` when it is empty.
    pub fn date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        Ok(self.load()?.value.date_bounds())
    }

    /// The window covering the whole history.
    pub fn full_window(&self) -> Result<Option<DateWindow>> {
        Ok(DateWindow::full(&self.load()?.value))
    }

    /// First item, full history, default moving average.
    pub fn default_selection(&self) -> Result<Option<Selection>> {
        Ok(Selection::default_for(&self.load()?.value))
    }

    /// The history restricted to `window`, every item kept.
    pub fn filtered(&self, window: &DateWindow) -> Result<PriceSeries> {
        Ok(self.load()?.value.filter(window))
    }

    /// `(timestamp, price)` pairs for one item inside `window`; gaps are `None`.
    pub fn history(
        &self,
        item: &str,
        window: &DateWindow,
    ) -> Result<Vec<(NaiveDateTime, Option<f64>)>> {
        let loaded = self.load()?;
        let series = &loaded.value;
        let column = series
            .column(item)
            .ok_or_else(|| PriceHistoryError::NotFound(format!("Unknown item: {}", item)))?;
        let range = series.row_range(window);
        Ok(series.timestamps()[range.clone()]
            .iter()
            .copied()
            .zip(column[range].iter().copied())
            .collect())
    }
}
