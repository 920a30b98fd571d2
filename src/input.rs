//! # Input Configuration Module
//!
//! This module provides configuration parsing and validation for climap
//! jobs. A job file describes the whole pipeline: the catalog to query, the
//! search filter, an optional bounding box for the server-side cutout, the
//! retrieval flags, and the mapping options.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use climap::input::JobConfig;
//!
//! // Load from file (JSON or YAML by extension)
//! let config = JobConfig::from_file("job.json")?;
//!
//! // Load from a JSON string
//! let json = r#"
//! {
//!   "catalog_url": "https://data.isimip.org/api/v1",
//!   "filter": { "climate_variable": "tas" },
//!   "variable_name": "tas",
//!   "years": { "start": 2041, "end": 2060 },
//!   "map_key": "tas_climatology.png"
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::catalog::CatalogFilter;
use crate::download::DownloadOptions;
use crate::render::MapStyle;
use crate::subset::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An inclusive calendar-year window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i64,
    pub end: i64,
}

impl YearRange {
    pub fn new(start: i64, end: i64) -> Result<Self, String> {
        if start > end {
            return Err(format!("year range start ({}) exceeds end ({})", start, end));
        }
        Ok(YearRange { start, end })
    }

    /// True when `year` lies inside the window, bounds included.
    pub fn contains(&self, year: i64) -> bool {
        year >= self.start && year <= self.end
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Main configuration structure for climap jobs.
///
/// Describes the four pipeline stages end to end: catalog query, optional
/// spatial cutout, retrieval, and climatology mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Base URL of the catalog service
    pub catalog_url: String,
    /// Structured search filter sent to the catalog
    #[serde(default)]
    pub filter: CatalogFilter,
    /// Optional bounding box for the server-side cutout
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// Name of the gridded variable to map
    pub variable_name: String,
    /// Inclusive calendar-year window for the climatology
    pub years: YearRange,
    /// Local directory downloads land in
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Path of the output climatology map (PNG)
    pub map_key: String,
    /// Optional path for the masked table export (Parquet)
    #[serde(default)]
    pub table_key: Option<String>,
    /// Rendering options
    #[serde(default)]
    pub style: MapStyle,
    /// Retrieval flags
    #[serde(default)]
    pub download: DownloadOptions,
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file, decided by the
    /// file extension (`.yaml`/`.yml` parse as YAML, everything else as
    /// JSON).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let config = if extension == "yaml" || extension == "yml" {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads a job configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Loads a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    /// Checks the cross-field constraints a deserialized config can break.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.catalog_url.trim().is_empty() {
            return Err("catalog_url must not be empty".into());
        }
        if self.variable_name.trim().is_empty() {
            return Err("variable_name must not be empty".into());
        }
        if self.map_key.trim().is_empty() {
            return Err("map_key must not be empty".into());
        }
        if self.years.start > self.years.end {
            return Err(format!(
                "year range start ({}) exceeds end ({})",
                self.years.start, self.years.end
            )
            .into());
        }
        if let Some(bbox) = &self.bbox {
            // Re-run the constructor checks; serde bypasses them.
            BoundingBox::new(bbox.south, bbox.north, bbox.west, bbox.east)?;
        }
        Ok(())
    }
}
