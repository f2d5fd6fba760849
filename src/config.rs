//! Pipeline configuration.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! TOML file, which is overridden by the environment.
//!
//! ```text
//! stock defaults  →  thumbnailer.toml (--config)  →  THUMBNAIL_BUCKET
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! destination_bucket = "photo-share-buck-resized"
//!
//! [thumbnails]
//! max_edge = 300            # Bounding box edge in pixels
//! quality = 85              # JPEG quality (1-100)
//!
//! [processing]
//! max_workers = 4           # Parallel records per batch (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ThumbnailSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable naming the destination bucket.
pub const DESTINATION_BUCKET_ENV: &str = "THUMBNAIL_BUCKET";

/// Destination bucket used when neither file nor environment names one.
pub const DEFAULT_DESTINATION_BUCKET: &str = "photo-share-buck-resized";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from TOML and the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Bucket that receives derived artifacts.
    pub destination_bucket: String,
    /// Thumbnail geometry and encoding.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destination_bucket: DEFAULT_DESTINATION_BUCKET.to_string(),
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_bucket.trim().is_empty() {
            return Err(ConfigError::Validation(
                "destination_bucket must not be empty".into(),
            ));
        }
        if self.thumbnails.quality == 0 || self.thumbnails.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.max_edge == 0 || self.thumbnails.max_edge > u16::MAX as u32 {
            return Err(ConfigError::Validation(
                "thumbnails.max_edge must be 1-65535".into(),
            ));
        }
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The thumbnail contract these settings describe.
    pub fn thumbnail_spec(&self) -> ThumbnailSpec {
        ThumbnailSpec {
            max_edge: self.thumbnails.max_edge,
            quality: Quality::new(self.thumbnails.quality),
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// An empty variable counts as unset.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(bucket) = lookup(DESTINATION_BUCKET_ENV).filter(|b| !b.trim().is_empty()) {
            self.destination_bucket = bucket;
        }
        self
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Edge of the square bounding box, in pixels.
    pub max_edge: u32,
    /// JPEG quality (1-100).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: 85,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of records processed in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_workers
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Parse a TOML string into a validated config (no environment overlay).
pub fn parse_config(toml_str: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration: stock defaults, then `path` if given, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// [`load_config`] with an injectable environment lookup.
pub fn load_config_with_env(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PipelineConfig, ConfigError> {
    let base = match path {
        Some(path) => toml::from_str::<PipelineConfig>(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    let config = base.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// A documented stock config file, printed by `thumbnailer gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# thumbnailer configuration
# All options are optional - defaults shown below.

# Bucket that receives derived thumbnails.
# Overridden by the THUMBNAIL_BUCKET environment variable.
destination_bucket = "photo-share-buck-resized"

[thumbnails]
# Edge of the square bounding box, in pixels. Images already inside the
# box are re-encoded at their original size, never enlarged.
max_edge = 300
# JPEG quality (1-100). Output is always progressive JPEG.
quality = 85

[processing]
# Maximum records processed in parallel within one batch.
# Omit for auto (= number of CPU cores). Values above the core count
# are clamped down.
# max_workers = 4
"#
}
