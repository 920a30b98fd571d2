//! # climap
//!
//! A Rust library and CLI for querying a remote climate-data repository,
//! requesting server-side spatial cutouts, downloading the resulting
//! netCDF grids, and rendering per-cell climatologies as filled
//! contour-band maps.
//!
//! ## Pipeline
//!
//! Four sequential stages, each consuming the previous stage's output:
//!
//! 1. **Catalog query**: a structured filter is sent to the catalog and a
//!    result set of dataset descriptors comes back.
//! 2. **Spatial cutout** (optional): the matched file paths plus a bounding
//!    box are sent to the subsetting service, which answers with the URL of
//!    a server-side cropped artifact.
//! 3. **Retrieval**: the artifact streams into the local data directory,
//!    with optional checksum validation and archive extraction.
//! 4. **Mapping**: the grid is flattened to a masked table, restricted to
//!    an inclusive year window, averaged per cell, and rendered to PNG.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use climap::{run_pipeline_job, input::JobConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = JobConfig::from_file("job.json")?;
//! run_pipeline_job(&config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "catalog_url": "https://data.isimip.org/api/v1",
//!   "filter": {
//!     "simulation_round": "ISIMIP3b",
//!     "climate_scenario": "ssp585",
//!     "climate_variable": "tas"
//!   },
//!   "bbox": { "south": -10.0, "north": 10.0, "west": 95.0, "east": 141.0 },
//!   "variable_name": "tas",
//!   "years": { "start": 2041, "end": 2060 },
//!   "map_key": "tas_climatology.png"
//! }
//! ```

pub mod catalog;
pub mod climatology;
pub mod cli;
pub mod download;
pub mod extract;
pub mod info;
pub mod input;
pub mod logging;
pub mod output;
pub mod render;
pub mod subset;

#[cfg(test)]
mod tests;

use crate::catalog::{CatalogClient, HttpCatalog};
use crate::climatology::ClimatologyGrid;
use crate::input::{JobConfig, YearRange};
use crate::render::MapStyle;
use crate::subset::SubsetClient;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Runs the whole pipeline described by a job configuration.
///
/// Searches the catalog, optionally requests a server-side cutout, pulls
/// the artifacts into the data directory, and maps the first netCDF grid
/// among them. An empty search result ends the job cleanly before the
/// retriever is ever invoked.
///
/// # Errors
///
/// Any stage failure (network, disk, parse, render) propagates unmodified;
/// there is no retry and no partial-state rollback.
pub async fn run_pipeline_job(config: &JobConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = HttpCatalog::new(&config.catalog_url);
    run_pipeline_with_catalog(&catalog, config).await
}

/// Pipeline body, generic over the catalog implementation.
pub async fn run_pipeline_with_catalog(
    catalog: &dyn CatalogClient,
    config: &JobConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let response = catalog.search(&config.filter).await?;
    logging::show_search_summary(&response);

    if response.is_empty() {
        info!("Catalog query matched no datasets, nothing to retrieve");
        return Ok(());
    }

    let file_refs = match &config.bbox {
        Some(bbox) => {
            let subsetter = SubsetClient::new(&config.catalog_url);
            let cutout = subsetter.request_cutout(&response.paths(), bbox).await?;
            vec![cutout.file_ref()]
        }
        None => response.file_refs(),
    };

    download::ensure_data_dir(&config.data_dir)?;
    let mut artifacts = Vec::with_capacity(file_refs.len());
    for file_ref in &file_refs {
        let artifact = download::fetch(&file_ref.file_url, &config.data_dir, config.download).await?;
        artifacts.push(artifact);
    }

    let grid_path = find_netcdf_artifact(&artifacts)
        .ok_or("No netCDF artifact among the downloaded files")?;
    if artifacts.len() > 1 {
        warn!(
            "{} artifacts retrieved, mapping only {}",
            artifacts.len(),
            grid_path.display()
        );
    }

    map_netcdf_file(
        &grid_path,
        &config.variable_name,
        config.years,
        &config.style,
        &config.map_key,
        config.table_key.as_deref(),
    )
}

/// Maps a local netCDF grid: mask, year filter, per-cell mean, render.
///
/// This is the aggregation half of the pipeline and works without any
/// network access. When `table_key` is set the masked table is also
/// exported to Parquet before aggregation.
pub fn map_netcdf_file(
    nc_path: &Path,
    variable_name: &str,
    years: YearRange,
    style: &MapStyle,
    map_key: &str,
    table_key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = netcdf::open(nc_path)?;
    let df = extract::grid_to_dataframe(&file, variable_name)?;
    info!(
        "Flattened {} into {} rows",
        nc_path.display(),
        df.height()
    );

    if let Some(table_key) = table_key {
        output::write_dataframe_to_parquet(&df, table_key)?;
    }

    let filtered = climatology::filter_years(df, years.start, years.end)?;
    let aggregated = climatology::climatology_mean(filtered, variable_name)?;
    let grid = ClimatologyGrid::from_dataframe(&aggregated, variable_name)?;
    render::render_map(&grid, style, Path::new(map_key))?;
    file.close()?;

    info!("Wrote climatology map to {}", map_key);
    Ok(())
}

/// Picks the first netCDF file among the retrieved artifacts, descending
/// into directories produced by archive extraction.
fn find_netcdf_artifact(artifacts: &[PathBuf]) -> Option<PathBuf> {
    for artifact in artifacts {
        if artifact.is_dir() {
            if let Ok(entries) = fs::read_dir(artifact) {
                let mut grids: Vec<PathBuf> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| is_netcdf(path))
                    .collect();
                grids.sort();
                if let Some(first) = grids.into_iter().next() {
                    return Some(first);
                }
            }
        } else if is_netcdf(artifact) {
            return Some(artifact.clone());
        }
    }
    None
}

fn is_netcdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "nc" || ext == "nc4")
}
