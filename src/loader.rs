//! Readers for the three external sources.
//!
//! - Price history: CSV, first column a date-time, one numeric column per
//!   item. Non-numeric cells become gaps; an unparsable timestamp fails the
//!   whole load.
//! - Supply: CSV with `Item Name` and `Estimated Supply` columns.
//! - Images: line-oriented `name,img`, split on the URL scheme prefix because
//!   names may contain commas and URLs may embed other URLs.
//!
//! A missing file is never fatal: the loader returns an empty table and marks
//! the [`LoadReport`] as unavailable. Bad auxiliary rows are skipped and
//! recorded. Files ending in `.gz` are decompressed transparently.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use flate2::read::GzDecoder;
use log::{debug, info, warn};

use crate::config::{
    IMAGE_NAME_COLUMN, IMAGE_URL_COLUMN, SUPPLY_COUNT_COLUMN, SUPPLY_NAME_COLUMN,
};
use crate::error::{PriceHistoryError, Result};
use crate::models::{ImageTable, LoadReport, Loaded, PriceSeries, RowIssue, SourceKind, SupplyTable};

/// Date-time layouts accepted in the price source, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// ---------------------------------------------------------------------------
// File access
// ---------------------------------------------------------------------------

/// Open a source file, or `None` if it does not exist.
///
/// `.gz` files are wrapped in a gzip decoder.
pub fn open_source(path: &Path) -> Result<Option<Box<dyn Read>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Some(Box::new(GzDecoder::new(reader))))
    } else {
        Ok(Some(Box::new(reader)))
    }
}

/// Modification time of `path`, or `None` if it is missing or unsupported.
pub fn file_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn unavailable<T>(value: T, mut report: LoadReport) -> Loaded<T> {
    warn!(
        "{} source unavailable at {}; using an empty table",
        report.source,
        report.path.display()
    );
    report.unavailable = true;
    Loaded { value, report }
}

fn log_outcome(report: &LoadReport) {
    info!(
        "Loaded {} source {}: {} of {} rows used",
        report.source,
        report.path.display(),
        report.rows_used,
        report.rows_read
    );
    if !report.row_issues.is_empty() {
        warn!(
            "Skipped {} malformed rows in {}",
            report.row_issues.len(),
            report.path.display()
        );
        for issue in &report.row_issues {
            debug!("  line {}: {}", issue.line, issue.message);
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Parse a price-source timestamp.
///
/// Accepts RFC 3339 (offset kept as written wall-clock time), common
/// `YYYY-MM-DD HH:MM[:SS[.f]]` layouts and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("empty timestamp".to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err("not a recognized date-time".to_string())
}

/// Parse a price cell. Empty, non-numeric and non-finite cells are gaps.
pub fn parse_price_cell(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an estimated-supply cell.
///
/// Thousands separators are ignored and whole-valued decimals (`"12.0"`)
/// accepted; negative or fractional counts are rejected.
pub fn parse_supply(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }
    let f = cleaned.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Price source
// ---------------------------------------------------------------------------

/// Load the price history from `path`.
pub fn load_price_series(path: &Path) -> Result<Loaded<PriceSeries>> {
    let mut report = LoadReport::new(SourceKind::Prices, path.to_path_buf());
    report.modified = file_modified(path);
    let Some(reader) = open_source(path)? else {
        return Ok(unavailable(PriceSeries::empty(), report));
    };
    let series = read_price_series(reader, &mut report)?;
    log_outcome(&report);
    Ok(Loaded {
        value: series,
        report,
    })
}

/// Parse a price history from any reader.
///
/// Fails with `MalformedTimestamp` if any row's first cell is not a
/// date-time or does not come strictly after the previous row.
pub fn read_price_series<R: Read>(reader: R, report: &mut LoadReport) -> Result<PriceSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(PriceSeries::empty());
    }
    let items: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); items.len()];

    // Byte records, so an undecodable cell is judged on its own instead of
    // failing the whole row.
    for result in rdr.byte_records() {
        report.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if !e.is_io_error() => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                report.row_issues.push(RowIssue::new(line, e.to_string()));
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw_ts = record.get(0).unwrap_or_default();
        let raw_ts = std::str::from_utf8(raw_ts).map_err(|_| {
            PriceHistoryError::MalformedTimestamp {
                line,
                value: String::from_utf8_lossy(raw_ts).into_owned(),
                reason: "not valid UTF-8".to_string(),
            }
        })?;

        let ts = parse_timestamp(raw_ts).map_err(|reason| {
            PriceHistoryError::MalformedTimestamp {
                line,
                value: raw_ts.to_string(),
                reason,
            }
        })?;
        if let Some(prev) = timestamps.last() {
            if ts <= *prev {
                return Err(PriceHistoryError::MalformedTimestamp {
                    line,
                    value: raw_ts.to_string(),
                    reason: format!("not after previous timestamp {}", prev),
                });
            }
        }

        timestamps.push(ts);
        for (idx, col) in columns.iter_mut().enumerate() {
            let cell = record
                .get(idx + 1)
                .and_then(|raw| std::str::from_utf8(raw).ok())
                .and_then(parse_price_cell);
            col.push(cell);
        }
        report.rows_used += 1;
    }

    PriceSeries::new(timestamps, items, columns)
}

// ---------------------------------------------------------------------------
// Supply source
// ---------------------------------------------------------------------------

/// Load the supply table from `path`; a missing file yields an empty table.
pub fn load_supply_table(path: &Path) -> Result<Loaded<SupplyTable>> {
    let mut report = LoadReport::new(SourceKind::Supply, path.to_path_buf());
    report.modified = file_modified(path);
    let Some(reader) = open_source(path)? else {
        return Ok(unavailable(SupplyTable::new(), report));
    };
    let table = read_supply_table(reader, &mut report)?;
    log_outcome(&report);
    Ok(Loaded {
        value: table,
        report,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().trim_matches('"').eq_ignore_ascii_case(name))
}

/// Parse a supply table from any reader.
///
/// Columns are located by header name. Without recognizable headers the
/// first two columns are used and the first line is read as data, so a
/// headerless file keeps its first row (and a foreign header shows up as a
/// row issue on line 1).
pub fn read_supply_table<R: Read>(reader: R, report: &mut LoadReport) -> Result<SupplyTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut table = SupplyTable::new();
    let (name_idx, count_idx) = match (
        find_column(&headers, SUPPLY_NAME_COLUMN),
        find_column(&headers, SUPPLY_COUNT_COLUMN),
    ) {
        (Some(n), Some(c)) => (n, c),
        _ => {
            warn!(
                "Supply source {} lacks '{}'/'{}' headers; using the first two columns",
                report.path.display(),
                SUPPLY_NAME_COLUMN,
                SUPPLY_COUNT_COLUMN
            );
            if !headers.is_empty() {
                report.rows_read += 1;
                insert_supply_row(&mut table, report, 1, &headers, (0, 1));
            }
            (0, 1)
        }
    };

    for result in rdr.records() {
        report.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if !e.is_io_error() => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                report.row_issues.push(RowIssue::new(line, e.to_string()));
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        insert_supply_row(&mut table, report, line, &record, (name_idx, count_idx));
    }
    Ok(table)
}

fn insert_supply_row(
    table: &mut SupplyTable,
    report: &mut LoadReport,
    line: u64,
    record: &csv::StringRecord,
    (name_idx, count_idx): (usize, usize),
) {
    let name = record.get(name_idx).unwrap_or("");
    if name.trim().is_empty() {
        report
            .row_issues
            .push(RowIssue::new(line, "missing item name"));
        return;
    }
    let raw_count = record.get(count_idx).unwrap_or("");
    let Some(count) = parse_supply(raw_count) else {
        report.row_issues.push(RowIssue::new(
            line,
            format!("invalid estimated supply '{}' for '{}'", raw_count, name),
        ));
        return;
    };

    table.insert(name, count);
    report.rows_used += 1;
}

// ---------------------------------------------------------------------------
// Image source
// ---------------------------------------------------------------------------

/// Load the image table from `path`; a missing file yields an empty table.
pub fn load_image_table(path: &Path, schemes: &[String]) -> Result<Loaded<ImageTable>> {
    let mut report = LoadReport::new(SourceKind::Images, path.to_path_buf());
    report.modified = file_modified(path);
    let Some(reader) = open_source(path)? else {
        return Ok(unavailable(ImageTable::new(), report));
    };
    let table = read_image_table(BufReader::new(reader), schemes, &mut report)?;
    log_outcome(&report);
    Ok(Loaded {
        value: table,
        report,
    })
}

/// Split one image-source line into `(name, url)` at the first URL scheme.
///
/// The separator (and a quote opening a quoted URL) before the scheme is
/// removed from the name; the name is otherwise returned as written so the
/// normalizer sees the raw key. Returns `None` when no scheme occurs.
pub fn split_image_line<'a>(line: &'a str, schemes: &[String]) -> Option<(&'a str, &'a str)> {
    let idx = schemes
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| line.find(s.as_str()))
        .min()?;

    let mut name = line[..idx].trim_end();
    if let Some(stripped) = name.strip_suffix('"') {
        if stripped.trim_end().ends_with([',', ';', '\t']) {
            name = stripped.trim_end();
        }
    }
    let name = name
        .strip_suffix([',', ';', '\t'])
        .unwrap_or(name);

    let url = line[idx..].trim_end();
    let url = url.strip_suffix('"').unwrap_or(url).trim_end();
    Some((name, url))
}

fn is_image_header(line: &str) -> bool {
    line.split([',', ';', '\t']).any(|field| {
        let field = field.trim().trim_matches('"');
        field.eq_ignore_ascii_case(IMAGE_NAME_COLUMN)
            || field.eq_ignore_ascii_case(IMAGE_URL_COLUMN)
    })
}

/// Parse an image table from line-oriented input.
///
/// The first line is skipped as a header when it has no URL and names a
/// `name` or `img` column; any other URL-less line is a row issue.
pub fn read_image_table<R: BufRead>(
    reader: R,
    schemes: &[String],
    report: &mut LoadReport,
) -> Result<ImageTable> {
    let mut table = ImageTable::new();

    for (idx, chunk) in reader.split(b'\n').enumerate() {
        let line_no = idx as u64 + 1;
        let bytes = chunk?;
        let Ok(text) = String::from_utf8(bytes) else {
            report.rows_read += 1;
            report
                .row_issues
                .push(RowIssue::new(line_no, "line is not valid UTF-8"));
            continue;
        };
        let line = text.strip_suffix('\r').unwrap_or(&text);
        if line.trim().is_empty() {
            continue;
        }

        let split = split_image_line(line, schemes);
        if line_no == 1 && split.is_none() && is_image_header(line) {
            continue;
        }
        report.rows_read += 1;

        let Some((name, url)) = split else {
            report
                .row_issues
                .push(RowIssue::new(line_no, "missing image URL"));
            continue;
        };
        if name.trim().trim_matches('"').trim().is_empty() {
            report
                .row_issues
                .push(RowIssue::new(line_no, "missing item name"));
            continue;
        }
        if schemes.iter().any(|s| s == url) {
            report.row_issues.push(RowIssue::new(
                line_no,
                format!("empty image URL for '{}'", name),
            ));
            continue;
        }

        table.insert(name, url.to_string());
        report.rows_used += 1;
    }
    Ok(table)
}
