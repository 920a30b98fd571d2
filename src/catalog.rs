//! # Catalog Query Module
//!
//! This module implements the client for the remote climate-data catalog.
//! A search sends a structured filter as query parameters and receives a
//! JSON result set with a match count and a list of dataset descriptors,
//! each carrying its specifier metadata and downloadable file references.
//!
//! There is no pagination, retry or rate-limiting logic here. Service and
//! network errors propagate to the caller as [`CatalogError`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use climap::catalog::{CatalogClient, CatalogFilter, HttpCatalog};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = HttpCatalog::new("https://data.isimip.org/api/v1");
//! let filter = CatalogFilter {
//!     simulation_round: Some("ISIMIP3b".to_string()),
//!     climate_variable: Some("tas".to_string()),
//!     ..Default::default()
//! };
//! let response = catalog.search(&filter).await?;
//! println!("{} datasets matched", response.count);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while talking to the catalog service
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("catalog returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Structured search filter over the recognized catalog dimensions.
///
/// Every field is optional; only the set fields are sent as query
/// parameters. The catalog dimensions are fixed, so this is a record with
/// named fields rather than a free-form mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Simulation round, e.g. `ISIMIP3b`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_round: Option<String>,
    /// Product type, e.g. `InputData`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Forcing model, e.g. `gfdl-esm4`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate_forcing: Option<String>,
    /// Scenario, e.g. `ssp585`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate_scenario: Option<String>,
    /// Variable name, e.g. `tas`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate_variable: Option<String>,
}

impl CatalogFilter {
    /// Renders the set fields as query parameters in a fixed order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let fields = [
            ("simulation_round", &self.simulation_round),
            ("product", &self.product),
            ("climate_forcing", &self.climate_forcing),
            ("climate_scenario", &self.climate_scenario),
            ("climate_variable", &self.climate_variable),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        params
    }

    /// True when no filter dimension is set.
    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}

/// A downloadable file reference returned by the catalog.
///
/// Immutable once returned; `path` is the repository-relative path used when
/// requesting server-side operations on the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_url: String,
    pub path: String,
}

/// A dataset descriptor: specifier metadata plus its file references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub specifiers: HashMap<String, String>,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// The catalog's answer to a search: a count and the matching descriptors.
///
/// `count == 0` with an empty result list is a valid answer, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<Dataset>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// All file references across the matched datasets, in catalog order.
    pub fn file_refs(&self) -> Vec<FileRef> {
        self.results
            .iter()
            .flat_map(|dataset| dataset.files.iter().cloned())
            .collect()
    }

    /// Repository-relative paths of every matched file, in catalog order.
    pub fn paths(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|dataset| dataset.files.iter().map(|f| f.path.clone()))
            .collect()
    }
}

/// Trait defining the catalog search interface.
///
/// The HTTP implementation below is the production client; tests substitute
/// a canned implementation.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Searches the catalog with the given filter.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails or the service answers
    /// with a non-success status.
    async fn search(&self, filter: &CatalogFilter) -> CatalogResult<SearchResponse>;
}

/// HTTP catalog client over the repository's JSON API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalog {
    /// Creates a client for the catalog rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        HttpCatalog {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn datasets_url(&self) -> String {
        format!("{}/datasets", self.base_url)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn search(&self, filter: &CatalogFilter) -> CatalogResult<SearchResponse> {
        let url = self.datasets_url();
        log::debug!("Searching catalog at {} with {:?}", url, filter);

        let response = self
            .client
            .get(&url)
            .query(&filter.to_query())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status {
                status: response.status(),
                url,
            });
        }

        let result: SearchResponse = response.json().await?;
        log::debug!(
            "Catalog returned {} datasets ({} file references)",
            result.count,
            result.file_refs().len()
        );
        Ok(result)
    }
}
