use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{PriceHistoryError, Result};

// ---------------------------------------------------------------------------
// PriceSeries — timestamp-keyed table, one column per tracked item
// ---------------------------------------------------------------------------

/// A price history table.
///
/// Rows are observation instants in strictly increasing order; each item has
/// one column of cells, where `None` marks a gap (no observation recorded).
/// Columns are stored column-major so per-item analytics walk contiguous
/// slices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    timestamps: Vec<NaiveDateTime>,
    items: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceSeries {
    /// Build a series from column-major data.
    ///
    /// Fails with `InvalidArgument` if the column count does not match the
    /// item count, a column length does not match the row count, or the
    /// timestamps are not strictly increasing.
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        items: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if items.len() != columns.len() {
            return Err(PriceHistoryError::InvalidArgument(format!(
                "{} item names but {} columns",
                items.len(),
                columns.len()
            )));
        }
        if let Some((item, col)) = items
            .iter()
            .zip(&columns)
            .find(|(_, col)| col.len() != timestamps.len())
        {
            return Err(PriceHistoryError::InvalidArgument(format!(
                "column '{}' has {} cells for {} timestamps",
                item,
                col.len(),
                timestamps.len()
            )));
        }
        if let Some(pos) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(PriceHistoryError::InvalidArgument(format!(
                "timestamps not strictly increasing at row {}: {} then {}",
                pos + 1,
                timestamps[pos],
                timestamps[pos + 1]
            )));
        }
        Ok(Self {
            timestamps,
            items,
            columns,
        })
    }

    /// Build a series from row-major data (one cell per item per row).
    pub fn from_rows(
        items: Vec<String>,
        rows: Vec<(NaiveDateTime, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(rows.len());
        let mut columns: Vec<Vec<Option<f64>>> =
            vec![Vec::with_capacity(rows.len()); items.len()];
        for (ts, cells) in rows {
            if cells.len() != items.len() {
                return Err(PriceHistoryError::InvalidArgument(format!(
                    "row at {} has {} cells for {} items",
                    ts,
                    cells.len(),
                    items.len()
                )));
            }
            timestamps.push(ts);
            for (col, cell) in columns.iter_mut().zip(cells) {
                col.push(cell);
            }
        }
        Self::new(timestamps, items, columns)
    }

    /// A series with no rows and no items.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows (observation instants).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Item column names in source order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Cells of an item column, or `None` if the item is not tracked.
    pub fn column(&self, item: &str) -> Option<&[Option<f64>]> {
        self.items
            .iter()
            .position(|i| i == item)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// First and last calendar date covered by the series.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.timestamps.first()?;
        let last = self.timestamps.last()?;
        Some((first.date(), last.date()))
    }

    /// Row indices whose calendar date falls inside `window`.
    ///
    /// Timestamps are sorted, so the matching rows form one contiguous range.
    pub fn row_range(&self, window: &DateWindow) -> Range<usize> {
        let start = self
            .timestamps
            .partition_point(|ts| ts.date() < window.start);
        let end = self.timestamps.partition_point(|ts| ts.date() <= window.end);
        start..end.max(start)
    }

    /// Restrict the series to the rows inside `window`, keeping every item.
    pub fn filter(&self, window: &DateWindow) -> PriceSeries {
        let range = self.row_range(window);
        PriceSeries {
            timestamps: self.timestamps[range.clone()].to_vec(),
            items: self.items.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| col[range.clone()].to_vec())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// DateWindow — inclusive calendar-date range
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range compared by calendar date, not exact time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PriceHistoryError::AmbiguousWindow(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from a date-range picker value.
    ///
    /// Exactly two dates are required; a picker that has only received its
    /// first click yields one date, which is an `AmbiguousWindow`.
    pub fn from_bounds(bounds: &[NaiveDate]) -> Result<Self> {
        match bounds {
            [start, end] => Self::new(*start, *end),
            [] => Err(PriceHistoryError::AmbiguousWindow(
                "no date bounds selected".into(),
            )),
            [only] => Err(PriceHistoryError::AmbiguousWindow(format!(
                "only one bound selected ({}); select an end date",
                only
            ))),
            _ => Err(PriceHistoryError::AmbiguousWindow(format!(
                "expected 2 date bounds, got {}",
                bounds.len()
            ))),
        }
    }

    pub fn from_options(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        match (start, end) {
            (Some(s), Some(e)) => Self::new(s, e),
            (Some(_), None) => Err(PriceHistoryError::AmbiguousWindow(
                "start date given without an end date".into(),
            )),
            (None, Some(_)) => Err(PriceHistoryError::AmbiguousWindow(
                "end date given without a start date".into(),
            )),
            (None, None) => Err(PriceHistoryError::AmbiguousWindow(
                "no date bounds selected".into(),
            )),
        }
    }

    /// The window spanning every date in `series`, or `None` if it is empty.
    pub fn full(series: &PriceSeries) -> Option<Self> {
        series
            .date_bounds()
            .map(|(start, end)| Self { start, end })
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let date = ts.date();
        date >= self.start && date <= self.end
    }
}
