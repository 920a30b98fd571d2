//! # Climatology Aggregation
//!
//! Temporal filtering and the per-cell temporal mean over the tabular form
//! produced by [`crate::extract`].
//!
//! The mean deliberately propagates missing values: a (lon, lat) group that
//! contains even one masked value yields a missing climatology for that
//! cell. Skipping nulls would silently average over a shorter record, so
//! the conservative policy of the source pipeline is reproduced exactly.

use polars::prelude::*;
use std::collections::HashMap;

/// Retains rows whose year lies in the inclusive window `[start, end]`.
///
/// Both bounds are kept: a row with year exactly `start` or `end` survives
/// the filter.
pub fn filter_years(df: DataFrame, start: i64, end: i64) -> PolarsResult<DataFrame> {
    df.lazy()
        .filter(
            col("year")
                .gt_eq(lit(start))
                .and(col("year").lt_eq(lit(end))),
        )
        .collect()
}

/// Groups by (lon, lat) and computes the arithmetic mean of `var_name`.
///
/// Any group containing at least one null yields a null mean. The result
/// has one row per cell, sorted by latitude then longitude.
pub fn climatology_mean(df: DataFrame, var_name: &str) -> PolarsResult<DataFrame> {
    df.lazy()
        .group_by([col("lon"), col("lat")])
        .agg([
            col(var_name).mean().alias("cell_mean"),
            col(var_name).null_count().alias("missing_count"),
        ])
        .with_columns([when(col("missing_count").gt(lit(0)))
            .then(lit(NULL))
            .otherwise(col("cell_mean"))
            .alias(var_name)])
        .select([col("lon"), col("lat"), col(var_name)])
        .sort(["lat", "lon"], SortMultipleOptions::default())
        .collect()
}

/// A climatology pivoted back onto its coordinate axes for rendering.
///
/// `cells` is row-major over `lats` then `lons`; a `None` cell is a missing
/// climatology.
#[derive(Debug, Clone)]
pub struct ClimatologyGrid {
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub cells: Vec<Option<f64>>,
}

impl ClimatologyGrid {
    /// Pivots an aggregated (lon, lat, value) frame onto sorted axes.
    ///
    /// Cell combinations absent from the frame stay missing.
    pub fn from_dataframe(df: &DataFrame, var_name: &str) -> PolarsResult<Self> {
        let lon_ca = df.column("lon")?.f64()?;
        let lat_ca = df.column("lat")?.f64()?;
        let val_ca = df.column(var_name)?.f64()?;

        let mut lons: Vec<f64> = lon_ca.into_iter().flatten().collect();
        let mut lats: Vec<f64> = lat_ca.into_iter().flatten().collect();
        lons.sort_by(|a, b| a.partial_cmp(b).unwrap());
        lons.dedup();
        lats.sort_by(|a, b| a.partial_cmp(b).unwrap());
        lats.dedup();

        let mut index: HashMap<(u64, u64), Option<f64>> = HashMap::new();
        for ((lon, lat), value) in lon_ca
            .into_iter()
            .flatten()
            .zip(lat_ca.into_iter().flatten())
            .zip(val_ca.into_iter())
        {
            index.insert((lon.to_bits(), lat.to_bits()), value);
        }

        let mut cells = vec![None; lons.len() * lats.len()];
        for (yi, lat) in lats.iter().enumerate() {
            for (xi, lon) in lons.iter().enumerate() {
                if let Some(value) = index.get(&(lon.to_bits(), lat.to_bits())) {
                    cells[yi * lons.len() + xi] = *value;
                }
            }
        }

        Ok(ClimatologyGrid { lons, lats, cells })
    }

    pub fn width(&self) -> usize {
        self.lons.len()
    }

    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// The climatology at column `xi`, row `yi` (rows follow `lats`).
    pub fn value_at(&self, xi: usize, yi: usize) -> Option<f64> {
        self.cells.get(yi * self.lons.len() + xi).copied().flatten()
    }

    /// Minimum and maximum of the non-missing cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for value in self.cells.iter().flatten() {
            range = Some(match range {
                Some((min, max)) => (min.min(*value), max.max(*value)),
                None => (*value, *value),
            });
        }
        range
    }

    /// Spatial extent as (west, east, south, north).
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let west = self.lons.first()?;
        let east = self.lons.last()?;
        let south = self.lats.first()?;
        let north = self.lats.last()?;
        Some((*west, *east, *south, *north))
    }
}
