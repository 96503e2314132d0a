//! Gap-tolerant statistics over a date-filtered price column.
//!
//! Gaps (`None` cells) are skipped by the scalar statistics and break the
//! moving average: a position only gets an average when every row of its
//! trailing window holds a value. Absent results stay `None`; they are never
//! reported as zero.

use crate::config::{MAX_MOVING_AVERAGE_HOURS, MIN_MOVING_AVERAGE_HOURS};
use crate::error::{PriceHistoryError, Result};
use crate::models::{AnalyticsResult, DateWindow, PriceSeries, Selection};

/// First non-gap value, scanning forward.
pub fn first_valid(values: &[Option<f64>]) -> Option<f64> {
    values.iter().find_map(|v| *v)
}

/// Last non-gap value, scanning backward.
pub fn last_valid(values: &[Option<f64>]) -> Option<f64> {
    values.iter().rev().find_map(|v| *v)
}

/// Minimum and maximum over the non-gap values.
pub fn min_max(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values.iter().flatten().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `(last - first) / first * 100`, or `None` when either end is missing or
/// `first` is zero.
pub fn percent_change(first: Option<f64>, last: Option<f64>) -> Option<f64> {
    match (first, last) {
        (Some(first), Some(last)) if first != 0.0 => {
            let pct = (last - first) / first * 100.0;
            pct.is_finite().then_some(pct)
        }
        _ => None,
    }
}

/// Trailing simple moving average over `window` rows.
///
/// The output has one position per input row. A position is `None` until
/// `window` rows are available, and whenever any row of its window is a gap.
pub fn moving_average(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().all(Option::is_some) {
            let sum: f64 = slice.iter().flatten().sum();
            out[end - 1] = Some(sum / window as f64);
        }
    }
    out
}

/// Convert a moving-average period in hours to a row count.
pub fn moving_average_rows(hours: u32, observations_per_hour: u32) -> Result<usize> {
    if !(MIN_MOVING_AVERAGE_HOURS..=MAX_MOVING_AVERAGE_HOURS).contains(&hours) {
        return Err(PriceHistoryError::InvalidArgument(format!(
            "moving average period must be {}..={} hours, got {}",
            MIN_MOVING_AVERAGE_HOURS, MAX_MOVING_AVERAGE_HOURS, hours
        )));
    }
    if observations_per_hour == 0 {
        return Err(PriceHistoryError::InvalidArgument(
            "observations_per_hour must be at least 1".into(),
        ));
    }
    Ok(hours as usize * observations_per_hour as usize)
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Computes [`AnalyticsResult`]s for items of a price series.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    observations_per_hour: u32,
}

impl Analyzer {
    pub fn new(observations_per_hour: u32) -> Self {
        Self {
            observations_per_hour,
        }
    }

    pub fn observations_per_hour(&self) -> u32 {
        self.observations_per_hour
    }

    /// Analyse one item over `window`.
    ///
    /// An unknown item is `NotFound`; a window with no rows yields a result
    /// whose statistics are all absent.
    pub fn analyze(
        &self,
        series: &PriceSeries,
        item: &str,
        window: &DateWindow,
        moving_average_hours: Option<u32>,
    ) -> Result<AnalyticsResult> {
        let column = series.column(item).ok_or_else(|| {
            PriceHistoryError::NotFound(format!("Unknown item: {}", item))
        })?;
        let ma_rows = moving_average_hours
            .map(|hours| moving_average_rows(hours, self.observations_per_hour))
            .transpose()?;

        let values = &column[series.row_range(window)];
        let first = first_valid(values);
        let last = last_valid(values);
        let (min_price, max_price) = match min_max(values) {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };

        Ok(AnalyticsResult {
            item: item.to_string(),
            window: *window,
            observations: values.len(),
            first_price: first,
            current_price: last,
            min_price,
            max_price,
            percent_change: percent_change(first, last),
            moving_average_hours,
            moving_average: ma_rows
                .map(|rows| moving_average(values, rows))
                .unwrap_or_default(),
        })
    }

    /// Analyse every item of a selection, in selection order.
    pub fn analyze_selection(
        &self,
        series: &PriceSeries,
        selection: &Selection,
    ) -> Result<Vec<AnalyticsResult>> {
        selection
            .items
            .iter()
            .map(|item| {
                self.analyze(
                    series,
                    item,
                    &selection.window,
                    selection.moving_average_hours,
                )
            })
            .collect()
    }
}
