//! # Grid Loading and Masking
//!
//! This module turns a gridded netCDF variable into the flat tabular form
//! the rest of the pipeline works on: one row per (longitude, latitude,
//! time) cell with columns `lon`, `lat`, `year` and the variable value.
//!
//! Masking is a total, order-preserving transform. Every cell whose raw
//! value is at or above the declared sentinel becomes an explicit null in
//! the value column; values strictly below pass through unchanged. Absent
//! cells are kept as rows, never dropped, so row counts stay consistent
//! with the grid.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use log::warn;
use polars::prelude::*;

/// Conventional no-data marker used when the variable declares none.
pub const DEFAULT_SENTINEL: f64 = 1e20;

/// Names of the variable's spatial and temporal dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    pub lon: String,
    pub lat: String,
    pub time: String,
}

/// Classifies the variable's three dimensions as longitude, latitude and
/// time by their conventional names.
pub fn detect_axes(var: &netcdf::Variable) -> Result<GridAxes, Box<dyn std::error::Error>> {
    let mut lon = None;
    let mut lat = None;
    let mut time = None;

    for dim in var.dimensions() {
        let name = dim.name().to_string();
        match name.to_ascii_lowercase().as_str() {
            "lon" | "longitude" | "x" => lon = Some(name),
            "lat" | "latitude" | "y" => lat = Some(name),
            "time" | "t" => time = Some(name),
            _ => {}
        }
    }

    match (lon, lat, time) {
        (Some(lon), Some(lat), Some(time)) => Ok(GridAxes { lon, lat, time }),
        _ => Err(format!(
            "Variable '{}' does not have recognizable (longitude, latitude, time) dimensions",
            var.name()
        )
        .into()),
    }
}

/// The variable's declared no-data value.
///
/// `_FillValue` wins over `missing_value`; both absent falls back to
/// [`DEFAULT_SENTINEL`].
pub fn sentinel_value(var: &netcdf::Variable) -> f64 {
    for attr_name in ["_FillValue", "missing_value"] {
        if let Some(attr) = var.attribute(attr_name) {
            if let Ok(value) = attr.value() {
                if let Some(sentinel) = attribute_as_f64(&value) {
                    return sentinel;
                }
            }
        }
    }
    DEFAULT_SENTINEL
}

/// Applies the sentinel rule to a single cell.
///
/// At or above the sentinel means absent; strictly below passes through.
pub fn mask_value(raw: f64, sentinel: f64) -> Option<f64> {
    if raw >= sentinel { None } else { Some(raw) }
}

fn attribute_as_f64(value: &netcdf::AttributeValue) -> Option<f64> {
    use netcdf::AttributeValue::*;
    match value {
        Uchar(v) => Some(*v as f64),
        Schar(v) => Some(*v as f64),
        Ushort(v) => Some(*v as f64),
        Short(v) => Some(*v as f64),
        Uint(v) => Some(*v as f64),
        Int(v) => Some(*v as f64),
        Ulonglong(v) => Some(*v as f64),
        Longlong(v) => Some(*v as f64),
        Float(v) => Some(*v as f64),
        Double(v) => Some(*v),
        Floats(v) => v.first().map(|f| *f as f64),
        Doubles(v) => v.first().copied(),
        _ => None,
    }
}

/// Parses a CF time unit declaration like `"days since 1861-01-01"`.
///
/// Returns the seconds-per-unit multiplier and the origin timestamp.
fn parse_time_units(units: &str) -> Option<(f64, NaiveDateTime)> {
    let mut parts = units.splitn(2, " since ");
    let unit = parts.next()?.trim().to_ascii_lowercase();
    let origin = parts.next()?.trim();

    let seconds_per_unit = match unit.as_str() {
        "seconds" | "second" | "secs" | "s" => 1.0,
        "minutes" | "minute" | "mins" => 60.0,
        "hours" | "hour" | "hrs" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        _ => return None,
    };

    let date_token = origin.split_whitespace().next()?;
    let date = NaiveDate::parse_from_str(date_token, "%Y-%m-%d").ok()?;
    Some((seconds_per_unit, date.and_hms_opt(0, 0, 0)?))
}

/// Decodes the time coordinate into calendar years.
///
/// When the coordinate variable carries no parseable CF `units` attribute
/// the raw time values are taken as years directly.
pub fn decode_years(
    file: &netcdf::File,
    time_name: &str,
    len: usize,
) -> Result<Vec<i64>, Box<dyn std::error::Error>> {
    let values = coordinate_values(file, time_name, len)?;

    let mut units: Option<String> = None;
    if let Some(var) = file.variable(time_name) {
        if let Some(attr) = var.attribute("units") {
            if let Ok(netcdf::AttributeValue::Str(s)) = attr.value() {
                units = Some(s);
            }
        }
    }

    if let Some(units) = units {
        if let Some((seconds_per_unit, origin)) = parse_time_units(&units) {
            return Ok(values
                .iter()
                .map(|v| {
                    let offset = Duration::seconds((v * seconds_per_unit) as i64);
                    (origin + offset).year() as i64
                })
                .collect());
        }
        warn!(
            "Unparseable time units '{}', treating time values as years",
            units
        );
    }

    Ok(values.iter().map(|v| *v as i64).collect())
}

/// Reads a coordinate variable, falling back to index positions when the
/// dimension has no matching variable.
pub fn coordinate_values(
    file: &netcdf::File,
    dim_name: &str,
    len: usize,
) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    if let Some(coord_var) = file.variable(dim_name) {
        let coords_array = coord_var.get::<f64, _>(..)?;
        return Ok(coords_array.iter().cloned().collect());
    }
    Ok((0..len).map(|idx| idx as f64).collect())
}

/// Flattens a gridded variable into the per-cell tabular form.
///
/// The output has one row per grid cell in the variable's native iteration
/// order, with columns `lon`, `lat`, `year` and `<var_name>`. Values at or
/// above the sentinel become nulls.
pub fn grid_to_dataframe(
    file: &netcdf::File,
    var_name: &str,
) -> Result<DataFrame, Box<dyn std::error::Error>> {
    let var = file
        .variable(var_name)
        .ok_or(format!("Variable '{}' not found in NetCDF file", var_name))?;

    let dim_names: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let dim_lens: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if dim_names.len() != 3 {
        return Err(format!(
            "Variable '{}' has {} dimensions, expected (longitude, latitude, time)",
            var_name,
            dim_names.len()
        )
        .into());
    }

    let axes = detect_axes(&var)?;
    let sentinel = sentinel_value(&var);

    let mut axis_values: Vec<Vec<f64>> = Vec::with_capacity(3);
    for (pos, name) in dim_names.iter().enumerate() {
        if *name == axes.time {
            let years = decode_years(file, name, dim_lens[pos])?;
            axis_values.push(years.iter().map(|y| *y as f64).collect());
        } else {
            axis_values.push(coordinate_values(file, name, dim_lens[pos])?);
        }
    }
    let lon_axis = dim_names.iter().position(|n| *n == axes.lon).expect("lon axis");
    let lat_axis = dim_names.iter().position(|n| *n == axes.lat).expect("lat axis");
    let year_axis = dim_names.iter().position(|n| *n == axes.time).expect("time axis");

    let values = var.get::<f64, _>(..)?;
    let cell_count = values.len();

    let mut lon_col: Vec<f64> = Vec::with_capacity(cell_count);
    let mut lat_col: Vec<f64> = Vec::with_capacity(cell_count);
    let mut year_col: Vec<i64> = Vec::with_capacity(cell_count);
    let mut value_col: Vec<Option<f64>> = Vec::with_capacity(cell_count);

    for (idx, raw) in values.indexed_iter() {
        lon_col.push(axis_values[lon_axis][idx[lon_axis]]);
        lat_col.push(axis_values[lat_axis][idx[lat_axis]]);
        year_col.push(axis_values[year_axis][idx[year_axis]] as i64);
        value_col.push(mask_value(*raw, sentinel));
    }

    let columns = vec![
        Series::new("lon".into(), lon_col).into(),
        Series::new("lat".into(), lat_col).into(),
        Series::new("year".into(), year_col).into(),
        Series::new(var_name.into(), value_col).into(),
    ];

    let df = DataFrame::new(columns)?;
    Ok(df)
}
