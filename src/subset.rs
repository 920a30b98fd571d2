//! # Spatial Subsetter Module
//!
//! Requests a server-side spatial crop ("cutout") of repository files. The
//! request carries the repository-relative paths plus a four-element
//! bounding box `[south, north, west, east]`; the response carries the
//! `file_url` of the cropped artifact. No cropping happens client-side and
//! correctness of the crop is entirely delegated to the service.

use crate::catalog::FileRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while requesting a cutout
#[derive(Error, Debug)]
pub enum SubsetError {
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    #[error("cutout request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("subsetting service returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Result type for subsetting operations
pub type SubsetResult<T> = Result<T, SubsetError>;

/// A spatial extent in signed degrees, same convention as the source grid.
///
/// Serialized on the wire as `[south, north, west, east]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Builds a bounding box, validating the degree convention.
    ///
    /// Latitudes must lie in [-90, 90] with `south <= north`, longitudes in
    /// [-180, 180] with `west <= east`.
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> SubsetResult<Self> {
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(SubsetError::InvalidBounds(format!(
                "latitudes must be within [-90, 90], got south={} north={}",
                south, north
            )));
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(SubsetError::InvalidBounds(format!(
                "longitudes must be within [-180, 180], got west={} east={}",
                west, east
            )));
        }
        if south > north {
            return Err(SubsetError::InvalidBounds(format!(
                "south ({}) exceeds north ({})",
                south, north
            )));
        }
        if west > east {
            return Err(SubsetError::InvalidBounds(format!(
                "west ({}) exceeds east ({})",
                west, east
            )));
        }
        Ok(BoundingBox {
            south,
            north,
            west,
            east,
        })
    }

    /// Wire order expected by the subsetting service.
    pub fn to_array(&self) -> [f64; 4] {
        [self.south, self.north, self.west, self.east]
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }
}

#[derive(Serialize)]
struct CutoutRequest<'a> {
    task: &'static str,
    paths: &'a [String],
    bbox: [f64; 4],
}

/// The service's answer to a cutout request.
#[derive(Debug, Clone, Deserialize)]
pub struct CutoutResponse {
    pub file_url: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CutoutResponse {
    /// The cropped artifact as a file reference.
    pub fn file_ref(&self) -> FileRef {
        FileRef {
            file_url: self.file_url.clone(),
            path: self
                .file_url
                .rsplit('/')
                .next()
                .unwrap_or(&self.file_url)
                .to_string(),
        }
    }
}

/// Client for the repository's file-operation endpoint.
#[derive(Debug, Clone)]
pub struct SubsetClient {
    base_url: String,
    client: reqwest::Client,
}

impl SubsetClient {
    pub fn new(base_url: &str) -> Self {
        SubsetClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    /// Requests a server-side crop of `paths` to `bbox`.
    ///
    /// Returns the reference to the new, cropped artifact. Network and
    /// service errors propagate unmodified.
    pub async fn request_cutout(
        &self,
        paths: &[String],
        bbox: &BoundingBox,
    ) -> SubsetResult<CutoutResponse> {
        let url = self.files_url();
        let body = CutoutRequest {
            task: "cutout_bbox",
            paths,
            bbox: bbox.to_array(),
        };
        log::debug!(
            "Requesting cutout of {} paths to {:?} at {}",
            paths.len(),
            bbox.to_array(),
            url
        );

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(SubsetError::Status {
                status: response.status(),
                url,
            });
        }

        Ok(response.json().await?)
    }
}
