//! Joins price-series items with the supply and image tables.
//!
//! Both tables are keyed by every name variant of their source rows, so
//! resolving an item is a probe of the item's own variants in priority order.
//! The first hit wins; with no hit the item still resolves, to zero supply and
//! the fallback image.

use log::debug;

use crate::models::{ImageTable, PriceSeries, Resolution, SupplyTable};

pub struct Reconciler<'a> {
    supply: &'a SupplyTable,
    images: &'a ImageTable,
    fallback_image: &'a str,
}

impl<'a> Reconciler<'a> {
    pub fn new(supply: &'a SupplyTable, images: &'a ImageTable, fallback_image: &'a str) -> Self {
        Self {
            supply,
            images,
            fallback_image,
        }
    }

    /// Resolve one item name.
    pub fn resolve(&self, item: &str) -> Resolution {
        let supply = self.supply.lookup(item);
        let image = self.images.lookup(item);

        if supply.is_none() {
            debug!("No supply entry for '{}'", item);
        }
        if image.is_none() {
            debug!("No image entry for '{}'; using fallback", item);
        }

        let (supply_variant, supply) = match supply {
            Some((variant, count)) => (Some(variant), *count),
            None => (None, 0),
        };
        let (image_variant, image_url) = match image {
            Some((variant, url)) => (Some(variant), url.clone()),
            None => (None, self.fallback_image.to_string()),
        };

        Resolution {
            item: item.to_string(),
            supply,
            supply_variant,
            image_url,
            image_variant,
        }
    }

    /// Resolve every item column of `series`, in column order.
    pub fn resolve_all(&self, series: &PriceSeries) -> Vec<Resolution> {
        series
            .items()
            .iter()
            .map(|item| self.resolve(item))
            .collect()
    }
}
