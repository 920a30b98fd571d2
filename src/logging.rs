//! Logging setup and the interactive console surface.
//!
//! Structured messages go through the `log` macros and are initialized
//! here with `env_logger`; the greeting/echo helpers below print the
//! human-facing summary lines the CLI shows around a run.

use crate::catalog::SearchResponse;
use crate::input::JobConfig;
use env_logger::Env;
use std::time::Duration;

/// Initializes env_logger honoring `RUST_LOG`, with the default level
/// derived from the CLI verbosity flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init()
        .ok();
}

pub fn show_greeting(config_path: &str) {
    println!("=== climap pipeline ===");
    println!("Loading configuration from: {}", config_path);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Catalog: {}", config.catalog_url);
    println!("  Variable: {}", config.variable_name);
    println!("  Years: {}..={}", config.years.start, config.years.end);
    println!("  Data directory: {}", config.data_dir.display());
    println!("  Output map: {}", config.map_key);
    if let Some(table_key) = &config.table_key {
        println!("  Table export: {}", table_key);
    }
    if let Some(bbox) = &config.bbox {
        println!(
            "  Bounding box: south={} north={} west={} east={}",
            bbox.south, bbox.north, bbox.west, bbox.east
        );
    }
}

pub fn show_search_summary(response: &SearchResponse) {
    println!("\nCatalog results: {} datasets", response.count);
    for (i, dataset) in response.results.iter().enumerate() {
        let mut specifiers: Vec<String> = dataset
            .specifiers
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        specifiers.sort();
        println!(
            "  Dataset {}: {} files [{}]",
            i + 1,
            dataset.files.len(),
            specifiers.join(", ")
        );
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Pipeline completed in {:.2}s ===", elapsed.as_secs_f64());
}
