//! Supply and image lookups, and reconciliation of price items against them.

use crate::cache::CacheManager;
use crate::error::Result;
use crate::models::Resolution;
use crate::reconcile::Reconciler;

// ---------------------------------------------------------------------------
// CatalogQuery
// ---------------------------------------------------------------------------

/// Query interface for the auxiliary supply and image tables.
pub struct CatalogQuery<'a> {
    cache: &'a CacheManager,
}

impl<'a> CatalogQuery<'a> {
    /// Create a new `CatalogQuery` bound to the given cache.
    pub fn new(cache: &'a CacheManager) -> Self {
        Self { cache }
    }

    /// Estimated supply for a name, tolerant of case, whitespace and quotes.
    ///
    /// `None` means no supply is known; it is not an error.
    pub fn supply(&self, name: &str) -> Result<Option<u64>> {
        let supply = self.cache.supply()?;
        Ok(supply.value.lookup(name).map(|(_, count)| *count))
    }

    /// Image URL for a name, without the fallback.
    pub fn image(&self, name: &str) -> Result<Option<String>> {
        let images = self.cache.images()?;
        Ok(images.value.lookup(name).map(|(_, url)| url.clone()))
    }

    /// Resolve one name to its supply and image, with defaults for misses.
    pub fn resolve(&self, name: &str) -> Result<Resolution> {
        let supply = self.cache.supply()?;
        let images = self.cache.images()?;
        let reconciler = Reconciler::new(
            &supply.value,
            &images.value,
            &self.cache.config().fallback_image_url,
        );
        Ok(reconciler.resolve(name))
    }

    /// Resolve every item of the price history, in column order.
    pub fn resolve_all(&self) -> Result<Vec<Resolution>> {
        let prices = self.cache.prices()?;
        let supply = self.cache.supply()?;
        let images = self.cache.images()?;
        let reconciler = Reconciler::new(
            &supply.value,
            &images.value,
            &self.cache.config().fallback_image_url,
        );
        Ok(reconciler.resolve_all(&prices.value))
    }
}
