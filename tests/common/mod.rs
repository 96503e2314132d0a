//! Shared test fixtures for the price-history SDK integration tests.
//!
//! Provides `setup_sample_dir()` which writes small price, supply and image
//! sources into a temporary data directory, plus helpers to build an SDK
//! over it.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use price_history_sdk::{PriceHistorySdk, SourceKind};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const PRICE_CSV: &str = "\
timestamp,Rare Gem,\"Common Ore\",Mystic Scroll
2024-03-01 00:00:00,100,5.5,
2024-03-01 00:30:00,110,5.6,
2024-03-01 12:00:00,,5.4,20
2024-03-02 00:00:00,120,n/a,22
2024-03-02 00:30:00,90,5.8,24
2024-03-02 23:30:00,150,6.0,
2024-03-03 00:00:00,140,6.2,26
2024-03-03 00:30:00,160,,28
";

pub const SUPPLY_CSV: &str = "\
Item Name,Estimated Supply
RARE GEM,1200
\" common   ore \",45000
Unused Item,7
Bad Row,lots
";

pub const IMAGE_CSV: &str = "\
name,img
Rare Gem,https://img.example.com/rare-gem.png
\"Dragon Scale, Ancient\",\"https://img.example.com/scale.png\"
Mystic Scroll,https://proxy.example.com/fetch?src=https://cdn.example.com/scroll.png
Broken Row without url
";

pub const FALLBACK: &str = "https://img.example.com/missing.png";

/// Write the three sample sources into a fresh temp directory.
///
/// The caller must keep the `TempDir` alive for the duration of the test.
pub fn setup_sample_dir() -> tempfile::TempDir {
    let tmp_dir = tempfile::tempdir().unwrap();
    write_source(tmp_dir.path(), SourceKind::Prices, PRICE_CSV);
    write_source(tmp_dir.path(), SourceKind::Supply, SUPPLY_CSV);
    write_source(tmp_dir.path(), SourceKind::Images, IMAGE_CSV);
    tmp_dir
}

/// Write `content` to the default file name of `kind` inside `dir`.
pub fn write_source(dir: &Path, kind: SourceKind, content: &str) {
    let name = price_history_sdk::config::source_files()[&kind];
    fs::write(dir.join(name), content).unwrap();
}

pub fn remove_source(dir: &Path, kind: SourceKind) {
    let name = price_history_sdk::config::source_files()[&kind];
    fs::remove_file(dir.join(name)).unwrap();
}

/// SDK over `dir` with long TTLs and the test fallback image.
pub fn sdk_for(dir: &Path) -> PriceHistorySdk {
    PriceHistorySdk::builder()
        .data_dir(dir)
        .price_ttl(Some(Duration::from_secs(3600)))
        .fallback_image_url(FALLBACK)
        .build()
        .unwrap()
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1e-9,
        "{context}: expected {expected}, got {actual} (diff {diff})"
    );
}
