//! Analytics over the cached price history, joined with reconciliation.

use crate::analytics::Analyzer;
use crate::cache::CacheManager;
use crate::error::Result;
use crate::models::{AnalyticsResult, DateWindow, ItemSummary, Selection};
use crate::reconcile::Reconciler;

// ---------------------------------------------------------------------------
// AnalyticsQuery
// ---------------------------------------------------------------------------

/// Query interface for per-item price statistics.
pub struct AnalyticsQuery<'a> {
    cache: &'a CacheManager,
}

impl<'a> AnalyticsQuery<'a> {
    /// Create a new `AnalyticsQuery` bound to the given cache.
    pub fn new(cache: &'a CacheManager) -> Self {
        Self { cache }
    }

    fn analyzer(&self) -> Analyzer {
        Analyzer::new(self.cache.config().observations_per_hour)
    }

    /// Statistics for one item over `window`.
    pub fn analyze(
        &self,
        item: &str,
        window: &DateWindow,
        moving_average_hours: Option<u32>,
    ) -> Result<AnalyticsResult> {
        let prices = self.cache.prices()?;
        self.analyzer()
            .analyze(&prices.value, item, window, moving_average_hours)
    }

    /// Statistics for every selected item. An empty selection yields an
    /// empty list.
    pub fn analyze_selection(&self, selection: &Selection) -> Result<Vec<AnalyticsResult>> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }
        let prices = self.cache.prices()?;
        self.analyzer().analyze_selection(&prices.value, selection)
    }

    /// Statistics for every tracked item.
    pub fn analyze_all(
        &self,
        window: &DateWindow,
        moving_average_hours: Option<u32>,
    ) -> Result<Vec<AnalyticsResult>> {
        let prices = self.cache.prices()?;
        let analyzer = self.analyzer();
        prices
            .value
            .items()
            .iter()
            .map(|item| analyzer.analyze(&prices.value, item, window, moving_average_hours))
            .collect()
    }

    /// Reconciled supply/image plus statistics for every selected item.
    ///
    /// Missing supply or image sources never fail this call; those items
    /// resolve to zero supply and the fallback image.
    pub fn dashboard(&self, selection: &Selection) -> Result<Vec<ItemSummary>> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }
        let prices = self.cache.prices()?;
        let supply = self.cache.supply()?;
        let images = self.cache.images()?;
        let reconciler = Reconciler::new(
            &supply.value,
            &images.value,
            &self.cache.config().fallback_image_url,
        );

        let results = self.analyzer().analyze_selection(&prices.value, selection)?;
        Ok(results
            .into_iter()
            .map(|analytics| ItemSummary {
                resolution: reconciler.resolve(&analytics.item),
                analytics,
            })
            .collect())
    }
}
