//! # CLI Module
//!
//! This module provides the command-line interface for climap, including:
//! - Argument parsing with clap
//! - Subcommands for each pipeline stage plus the full pipeline
//! - Environment variable support with the CLIMAP_ prefix
//! - Output format selection for structured data
//! - Shell completion generation

use crate::catalog::{CatalogClient, CatalogFilter, HttpCatalog};
use crate::download::{self, DownloadOptions};
use crate::info;
use crate::input::{JobConfig, YearRange};
use crate::logging;
use crate::render::MapStyle;
use crate::subset::{BoundingBox, SubsetClient};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Default catalog endpoint, overridable with CLIMAP_CATALOG_URL.
pub const DEFAULT_CATALOG_URL: &str = "https://data.isimip.org/api/v1";

/// Query climate-data catalogs and map NetCDF climatologies
#[derive(Parser, Debug)]
#[command(name = "climap")]
#[command(about = "Query climate-data catalogs and map NetCDF climatologies")]
#[command(version)]
#[command(long_about = "
climap is a command-line tool for querying a remote climate-data repository,
requesting server-side spatial cutouts, downloading the resulting NetCDF
grids, and rendering per-cell climatologies as filled contour-band maps.

EXAMPLES:
  # Search the catalog
  climap search --simulation-round ISIMIP3b --climate-scenario ssp585 -n tas

  # Request a server-side cutout of the matched paths
  climap cutout --bbox='-10:10:95:141' path/to/file1.nc path/to/file2.nc

  # Download an artifact into the data directory
  climap download https://example.org/cutouts/tas_cutout.nc --validate

  # Map a local grid to a climatology PNG
  climap map data/tas_cutout.nc tas_map.png -n tas --years 2041:2060

  # Run the whole pipeline from a job file
  climap run job.json

  # Inspect a downloaded file
  climap info data/tas_cutout.nc --detailed
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the remote catalog with a structured filter
    Search {
        /// Base URL of the catalog service
        #[arg(long, env = "CLIMAP_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
        catalog_url: String,

        /// Simulation round, e.g. ISIMIP3b
        #[arg(long, env = "CLIMAP_SIMULATION_ROUND")]
        simulation_round: Option<String>,

        /// Product type, e.g. InputData
        #[arg(long, env = "CLIMAP_PRODUCT")]
        product: Option<String>,

        /// Forcing model, e.g. gfdl-esm4
        #[arg(long, env = "CLIMAP_CLIMATE_FORCING")]
        climate_forcing: Option<String>,

        /// Scenario, e.g. ssp585
        #[arg(long, env = "CLIMAP_CLIMATE_SCENARIO")]
        climate_scenario: Option<String>,

        /// Variable name, e.g. tas
        #[arg(short = 'n', long, env = "CLIMAP_CLIMATE_VARIABLE")]
        climate_variable: Option<String>,
    },

    /// Request a server-side spatial crop of repository files
    Cutout {
        /// Base URL of the catalog service
        #[arg(long, env = "CLIMAP_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
        catalog_url: String,

        /// Bounding box as south:north:west:east in signed degrees
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Repository-relative paths of the files to crop
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Download an artifact into the local data directory
    Download {
        /// URL of the artifact
        url: String,

        /// Destination directory, created if missing
        #[arg(short, long, env = "CLIMAP_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Verify the download against its SHA-256 sidecar
        #[arg(long)]
        validate: bool,

        /// Unpack gzip or tar.gz containers after the download
        #[arg(long)]
        extract: bool,
    },

    /// Map a local NetCDF grid to a climatology PNG
    Map {
        /// Input NetCDF file
        input: PathBuf,

        /// Output PNG path
        output: String,

        /// NetCDF variable name to aggregate
        #[arg(short = 'n', long, env = "CLIMAP_VARIABLE")]
        variable: String,

        /// Inclusive year window as start:end
        #[arg(long, value_parser = parse_year_range)]
        years: YearRange,

        /// Contour band width in data units
        #[arg(long, default_value_t = 1.0)]
        interval: f64,

        /// Edge length of a rendered grid cell in pixels
        #[arg(long)]
        cell_size: Option<u32>,

        /// GeoJSON file with the coastline layer
        #[arg(long)]
        coastline: Option<String>,

        /// Also export the masked table to this Parquet file
        #[arg(long)]
        table: Option<String>,
    },

    /// Run the whole pipeline from a job configuration file
    Run {
        /// Job configuration file (JSON or YAML)
        #[arg(value_name = "CONFIG", env = "CLIMAP_CONFIG")]
        config: PathBuf,
    },

    /// Show information about a NetCDF file
    Info {
        /// NetCDF file path
        file: String,

        /// Show detailed variable information
        #[arg(long)]
        detailed: bool,

        /// Show only specific variable info
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (where applicable)
    Csv,
}

/// Parse a bounding box from the command line
/// Format: south:north:west:east
fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 4 {
        return Err("Bounding box must be in format 'south:north:west:east'".to_string());
    }

    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid bounding box value '{}'", part))?;
    }

    BoundingBox::new(values[0], values[1], values[2], values[3]).map_err(|e| e.to_string())
}

/// Parse an inclusive year window from the command line
/// Format: start:end
fn parse_year_range(s: &str) -> Result<YearRange, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Year range must be in format 'start:end'".to_string());
    }

    let start = parts[0]
        .trim()
        .parse::<i64>()
        .map_err(|_| "Invalid start year".to_string())?;
    let end = parts[1]
        .trim()
        .parse::<i64>()
        .map_err(|_| "Invalid end year".to_string())?;

    YearRange::new(start, end)
}

/// Executes the parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search {
            catalog_url,
            simulation_round,
            product,
            climate_forcing,
            climate_scenario,
            climate_variable,
        } => {
            let filter = CatalogFilter {
                simulation_round,
                product,
                climate_forcing,
                climate_scenario,
                climate_variable,
            };
            run_search(&catalog_url, &filter, cli.output_format).await
        }

        Commands::Cutout {
            catalog_url,
            bbox,
            paths,
        } => run_cutout(&catalog_url, &paths, &bbox, cli.output_format).await,

        Commands::Download {
            url,
            data_dir,
            validate,
            extract,
        } => {
            let opts = DownloadOptions { validate, extract };
            let artifact = download::fetch(&url, &data_dir, opts)
                .await
                .with_context(|| format!("Failed to download {}", url))?;
            println!("File saved to `{}`", artifact.display());
            Ok(())
        }

        Commands::Map {
            input,
            output,
            variable,
            years,
            interval,
            cell_size,
            coastline,
            table,
        } => {
            let mut style = MapStyle {
                band_interval: interval,
                coastline_key: coastline,
                ..Default::default()
            };
            if let Some(cell_size) = cell_size {
                style.cell_size = cell_size;
            }
            crate::map_netcdf_file(&input, &variable, years, &style, &output, table.as_deref())
                .map_err(|e| anyhow::anyhow!(e.to_string()))
                .with_context(|| format!("Failed to map {}", input.display()))?;
            println!("Map saved to `{}`", output);
            Ok(())
        }

        Commands::Run { config } => run_job(&config).await,

        Commands::Info {
            file,
            detailed,
            variable,
            format,
        } => {
            let info = info::get_netcdf_info(&file, variable.as_deref(), detailed)?;
            match format.unwrap_or(cli.output_format) {
                OutputFormat::Human => info::print_file_info_human(&info),
                OutputFormat::Json => info::print_file_info_json(&info)?,
                OutputFormat::Yaml => info::print_file_info_yaml(&info)?,
                OutputFormat::Csv => info::print_file_info_csv(&info)?,
            }
            Ok(())
        }

        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(shell, &mut command, "climap", &mut file);
                }
                None => {
                    clap_complete::generate(shell, &mut command, "climap", &mut std::io::stdout());
                }
            }
            Ok(())
        }
    }
}

async fn run_search(
    catalog_url: &str,
    filter: &CatalogFilter,
    output_format: OutputFormat,
) -> Result<()> {
    let catalog = HttpCatalog::new(catalog_url);
    let response = catalog
        .search(filter)
        .await
        .context("Catalog search failed")?;

    match output_format {
        OutputFormat::Human => {
            logging::show_search_summary(&response);
            for file_ref in response.file_refs() {
                println!("    {}", file_ref.path);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&response)?),
        OutputFormat::Csv => {
            println!("path,file_url");
            for file_ref in response.file_refs() {
                println!("{},{}", file_ref.path, file_ref.file_url);
            }
        }
    }
    Ok(())
}

async fn run_cutout(
    catalog_url: &str,
    paths: &[String],
    bbox: &BoundingBox,
    output_format: OutputFormat,
) -> Result<()> {
    let subsetter = SubsetClient::new(catalog_url);
    let cutout = subsetter
        .request_cutout(paths, bbox)
        .await
        .context("Cutout request failed")?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cutout.file_ref())?)
        }
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&cutout.file_ref())?),
        _ => {
            println!("Cutout ready: {}", cutout.file_url);
            if let Some(status) = &cutout.status {
                println!("  status: {}", status);
            }
        }
    }
    Ok(())
}

async fn run_job(config_path: &PathBuf) -> Result<()> {
    let start_time = Instant::now();

    logging::show_greeting(&config_path.display().to_string());

    let config = JobConfig::from_file(config_path)
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    logging::config_echo(&config);

    crate::run_pipeline_job(&config)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    logging::show_farewell_with_timing(start_time.elapsed());
    Ok(())
}
