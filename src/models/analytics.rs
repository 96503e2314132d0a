use serde::Serialize;

use crate::config::DEFAULT_MOVING_AVERAGE_HOURS;
use crate::models::{DateWindow, PriceSeries};

// ---------------------------------------------------------------------------
// Selection — what the caller wants analysed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub items: Vec<String>,
    pub window: DateWindow,
    /// Moving-average period in hours; `None` disables the moving average.
    pub moving_average_hours: Option<u32>,
}

impl Selection {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>, window: DateWindow) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            window,
            moving_average_hours: Some(DEFAULT_MOVING_AVERAGE_HOURS),
        }
    }

    pub fn moving_average(mut self, hours: u32) -> Self {
        self.moving_average_hours = Some(hours);
        self
    }

    pub fn without_moving_average(mut self) -> Self {
        self.moving_average_hours = None;
        self
    }

    /// The initial selection for a series: its first item over its full date
    /// range with the default moving average. `None` for an empty series.
    pub fn default_for(series: &PriceSeries) -> Option<Self> {
        let window = DateWindow::full(series)?;
        let items: Vec<String> = series.items().iter().take(1).cloned().collect();
        Some(Self::new(items, window))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AnalyticsResult — per item, per date window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    pub item: String,
    pub window: DateWindow,
    /// Rows in the window, gaps included.
    pub observations: usize,
    pub first_price: Option<f64>,
    /// Last non-gap value in the window.
    pub current_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub percent_change: Option<f64>,
    pub moving_average_hours: Option<u32>,
    /// Aligned with the window's rows; empty when the moving average is off.
    pub moving_average: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Resolution / ItemSummary — reconciled view of one price item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub item: String,
    /// Estimated supply, 0 when no supply row matched.
    pub supply: u64,
    /// Variant that matched in the supply table.
    pub supply_variant: Option<String>,
    /// Image URL, the configured fallback when no image row matched.
    pub image_url: String,
    pub image_variant: Option<String>,
}

impl Resolution {
    pub fn has_supply(&self) -> bool {
        self.supply_variant.is_some()
    }

    pub fn has_image(&self) -> bool {
        self.image_variant.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub resolution: Resolution,
    pub analytics: AnalyticsResult,
}
