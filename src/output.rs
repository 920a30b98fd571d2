//! # Parquet Output Module
//!
//! Writes the masked tabular form to a Parquet file so downstream tools can
//! pick the table up without re-reading the netCDF grid.

use log::debug;
use polars::prelude::*;
use std::fs::File;

/// Writes a DataFrame to a Parquet file.
///
/// Logs the DataFrame shape and schema at debug level before writing.
///
/// # Errors
///
/// This function will return an error if:
/// - The output path is not writable
/// - The DataFrame contains unsupported data types for Parquet
pub fn write_dataframe_to_parquet(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Writing DataFrame to parquet file: {}", output_path);
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("DataFrame schema:\n{:?}", df.schema());
    debug!("First few rows:\n{}", df.head(Some(5)));

    let file = File::create(output_path)?;
    let writer = ParquetWriter::new(file);
    let mut df_clone = df.clone();
    writer.finish(&mut df_clone)?;

    debug!("Successfully wrote parquet file: {}", output_path);
    Ok(())
}
