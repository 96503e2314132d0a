use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PriceHistoryError, Result};
use crate::models::SourceKind;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const FALLBACK_IMAGE_URL: &str = "https://via.placeholder.com/64?text=%3F";

/// Sampling cadence of the price source (one observation every 30 minutes).
pub const DEFAULT_OBSERVATIONS_PER_HOUR: u32 = 2;
pub const DEFAULT_MOVING_AVERAGE_HOURS: u32 = 6;
pub const MIN_MOVING_AVERAGE_HOURS: u32 = 1;
pub const MAX_MOVING_AVERAGE_HOURS: u32 = 24;

pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_SUPPLY_TTL: Duration = Duration::from_secs(60 * 60);

pub const SUPPLY_NAME_COLUMN: &str = "Item Name";
pub const SUPPLY_COUNT_COLUMN: &str = "Estimated Supply";
pub const IMAGE_NAME_COLUMN: &str = "name";
pub const IMAGE_URL_COLUMN: &str = "img";

pub fn source_files() -> HashMap<SourceKind, &'static str> {
    HashMap::from([
        (SourceKind::Prices, "price_history.csv"),
        (SourceKind::Supply, "supply.csv"),
        (SourceKind::Images, "images.csv"),
    ])
}

pub fn image_url_schemes() -> Vec<String> {
    vec!["https://".to_string(), "http://".to_string()]
}

/// Pipeline configuration, loadable from a JSON file.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides. TTLs are in (possibly fractional) seconds; a `null` TTL never expires.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub price_file: Option<PathBuf>,
    pub supply_file: Option<PathBuf>,
    pub image_file: Option<PathBuf>,
    pub price_ttl_secs: Option<f64>,
    pub supply_ttl_secs: Option<f64>,
    pub image_ttl_secs: Option<f64>,
    pub watch_modifications: bool,
    pub observations_per_hour: u32,
    pub fallback_image_url: String,
    pub image_url_schemes: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            price_file: None,
            supply_file: None,
            image_file: None,
            price_ttl_secs: Some(DEFAULT_PRICE_TTL.as_secs_f64()),
            supply_ttl_secs: Some(DEFAULT_SUPPLY_TTL.as_secs_f64()),
            image_ttl_secs: None,
            watch_modifications: true,
            observations_per_hour: DEFAULT_OBSERVATIONS_PER_HOUR,
            fallback_image_url: FALLBACK_IMAGE_URL.to_string(),
            image_url_schemes: image_url_schemes(),
        }
    }
}

impl PipelineConfig {
    /// Resolve the on-disk path of a source.
    ///
    /// An explicit per-source path wins; relative explicit paths are taken
    /// relative to `data_dir`.
    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        let explicit = match kind {
            SourceKind::Prices => self.price_file.as_ref(),
            SourceKind::Supply => self.supply_file.as_ref(),
            SourceKind::Images => self.image_file.as_ref(),
        };
        match explicit {
            Some(path) => self.data_dir.join(path),
            None => {
                let files = source_files();
                self.data_dir.join(files[&kind])
            }
        }
    }

    pub fn ttl(&self, kind: SourceKind) -> Option<Duration> {
        let secs = match kind {
            SourceKind::Prices => self.price_ttl_secs,
            SourceKind::Supply => self.supply_ttl_secs,
            SourceKind::Images => self.image_ttl_secs,
        };
        secs.and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    pub fn validate(&self) -> Result<()> {
        if self.observations_per_hour == 0 {
            return Err(PriceHistoryError::InvalidArgument(
                "observations_per_hour must be at least 1".into(),
            ));
        }
        for (name, secs) in [
            ("price_ttl_secs", self.price_ttl_secs),
            ("supply_ttl_secs", self.supply_ttl_secs),
            ("image_ttl_secs", self.image_ttl_secs),
        ] {
            if let Some(secs) = secs {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(PriceHistoryError::InvalidArgument(format!(
                        "{} must be a non-negative number of seconds, got {}",
                        name, secs
                    )));
                }
            }
        }
        if self.image_url_schemes.iter().any(|s| s.is_empty()) {
            return Err(PriceHistoryError::InvalidArgument(
                "image_url_schemes must not contain empty prefixes".into(),
            ));
        }
        Ok(())
    }
}

/// Read a [`PipelineConfig`] from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)?;
    let config: PipelineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
