//! Query modules for the price-history SDK.
//!
//! Each module provides a query struct that borrows the shared
//! [`CacheManager`](crate::cache::CacheManager) and reads sources through it,
//! so every query sees the same cached, TTL-bounded data.

pub mod analytics;
pub mod catalog;
pub mod prices;

pub use analytics::AnalyticsQuery;
pub use catalog::CatalogQuery;
pub use prices::PriceQuery;
