//! # Climatology Map Rendering
//!
//! Renders a [`ClimatologyGrid`](crate::climatology::ClimatologyGrid) as a
//! PNG. Values are binned into bands at a fixed interval whose edges are
//! multiples of the interval, each band colored from a sequential scale
//! interpolated between hex stops. Missing cells render transparent. An
//! optional coastline layer, read from a GeoJSON file, is drawn on top and
//! restricted to the grid's spatial extent.

use crate::climatology::ClimatologyGrid;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while rendering a map
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("climatology grid is empty")]
    EmptyGrid,

    #[error("band interval must be positive, got {0}")]
    InvalidInterval(f64),

    #[error("invalid hex color '{0}'")]
    InvalidColor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("coastline parse error: {0}")]
    Coastline(#[from] serde_json::Error),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering options for the climatology map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    /// Fixed width of each contour band, in data units
    #[serde(default = "default_band_interval")]
    pub band_interval: f64,
    /// Sequential color scale as hex stops, low to high
    #[serde(default = "default_color_stops")]
    pub color_stops: Vec<String>,
    /// Edge length of a rendered grid cell, in pixels
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
    /// Optional GeoJSON file with the coastline layer
    #[serde(default)]
    pub coastline_key: Option<String>,
}

fn default_band_interval() -> f64 {
    1.0
}

fn default_color_stops() -> Vec<String> {
    vec![
        "#ffffcc".to_string(),
        "#fd8d3c".to_string(),
        "#800026".to_string(),
    ]
}

fn default_cell_size() -> u32 {
    8
}

impl Default for MapStyle {
    fn default() -> Self {
        MapStyle {
            band_interval: default_band_interval(),
            color_stops: default_color_stops(),
            cell_size: default_cell_size(),
            coastline_key: None,
        }
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Band edges covering `[min, max]`, aligned to multiples of `interval`.
///
/// The first edge is the greatest multiple of `interval` at or below `min`;
/// the last edge is strictly above `max`.
pub fn band_edges(min: f64, max: f64, interval: f64) -> Vec<f64> {
    if interval <= 0.0 || max < min {
        return vec![];
    }

    let start = (min / interval).floor() * interval;
    let mut edges = vec![start];

    let mut edge = start;
    while edge <= max {
        edge += interval;
        edges.push(edge);
    }

    edges
}

/// Index of the band containing `value`, clamped to the edge list.
fn band_of(value: f64, edges: &[f64]) -> usize {
    if edges.len() < 2 {
        return 0;
    }
    for (i, window) in edges.windows(2).enumerate() {
        if value < window[1] {
            return i;
        }
    }
    edges.len() - 2
}

/// Samples the sequential scale at `t` in [0, 1].
fn gradient_color(stops: &[(u8, u8, u8)], t: f64) -> Rgba<u8> {
    if stops.is_empty() {
        return Rgba([0, 0, 0, 255]);
    }
    if stops.len() == 1 {
        let (r, g, b) = stops[0];
        return Rgba([r, g, b, 255]);
    }

    let t = t.clamp(0.0, 1.0);
    let scaled = t * (stops.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = stops[lower];
    let (r1, g1, b1) = stops[lower + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    Rgba([lerp(r0, r1), lerp(g0, g1), lerp(b0, b1), 255])
}

/// Renders the climatology as a filled contour-band PNG at `out_path`.
pub fn render_map(grid: &ClimatologyGrid, style: &MapStyle, out_path: &Path) -> RenderResult<()> {
    if grid.width() == 0 || grid.height() == 0 {
        return Err(RenderError::EmptyGrid);
    }
    if style.band_interval <= 0.0 {
        return Err(RenderError::InvalidInterval(style.band_interval));
    }

    let stops = style
        .color_stops
        .iter()
        .map(|hex| hex_to_rgb(hex).ok_or_else(|| RenderError::InvalidColor(hex.clone())))
        .collect::<RenderResult<Vec<_>>>()?;

    let cell = style.cell_size.max(1);
    let width_px = grid.width() as u32 * cell;
    let height_px = grid.height() as u32 * cell;
    let mut img = RgbaImage::from_pixel(width_px, height_px, Rgba([0, 0, 0, 0]));

    let edges = match grid.value_range() {
        Some((min, max)) => band_edges(min, max, style.band_interval),
        None => vec![],
    };
    let band_count = edges.len().saturating_sub(1).max(1);
    debug!(
        "Rendering {}x{} grid into {}x{} px with {} bands",
        grid.width(),
        grid.height(),
        width_px,
        height_px,
        band_count
    );

    for yi in 0..grid.height() {
        for xi in 0..grid.width() {
            let Some(value) = grid.value_at(xi, yi) else {
                continue;
            };
            let band = band_of(value, &edges);
            let t = (band as f64 + 0.5) / band_count as f64;
            let color = gradient_color(&stops, t);

            // Row 0 of the grid is the southernmost latitude; the image
            // grows downward from the north.
            let y0 = (grid.height() - 1 - yi) as u32 * cell;
            let x0 = xi as u32 * cell;
            for dy in 0..cell {
                for dx in 0..cell {
                    img.put_pixel(x0 + dx, y0 + dy, color);
                }
            }
        }
    }

    if let Some(coastline_key) = &style.coastline_key {
        draw_coastline(&mut img, grid, cell, coastline_key)?;
    }

    img.save(out_path)?;
    debug!("Wrote map to {}", out_path.display());
    Ok(())
}

// Minimal GeoJSON model, geometry types beyond line and polygon are
// accepted but not drawn.
#[derive(Deserialize)]
struct GeoJson {
    #[serde(default)]
    features: Vec<GeoFeature>,
}

#[derive(Deserialize)]
struct GeoFeature {
    geometry: Option<GeoGeometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

impl GeoGeometry {
    /// Every polyline in the geometry, polygon rings included.
    fn polylines(&self) -> Vec<&Vec<Vec<f64>>> {
        match self {
            GeoGeometry::LineString { coordinates } => vec![coordinates],
            GeoGeometry::MultiLineString { coordinates }
            | GeoGeometry::Polygon { coordinates } => coordinates.iter().collect(),
            GeoGeometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().collect()
            }
            GeoGeometry::Unsupported => vec![],
        }
    }
}

/// Draws the coastline layer, clipped to the grid's spatial extent.
fn draw_coastline(
    img: &mut RgbaImage,
    grid: &ClimatologyGrid,
    cell: u32,
    coastline_key: &str,
) -> RenderResult<()> {
    let content = fs::read_to_string(coastline_key)?;
    let geojson: GeoJson = serde_json::from_str(&content)?;

    let Some((west, east, south, north)) = grid.extent() else {
        return Ok(());
    };
    let width_px = (grid.width() as u32 * cell) as f32;
    let height_px = (grid.height() as u32 * cell) as f32;
    let lon_span = (east - west).max(f64::EPSILON);
    let lat_span = (north - south).max(f64::EPSILON);

    let project = |lon: f64, lat: f64| -> (f32, f32) {
        let x = ((lon - west) / lon_span) as f32 * (width_px - 1.0);
        let y = (1.0 - ((lat - south) / lat_span) as f32) * (height_px - 1.0);
        (x, y)
    };
    let line_color = Rgba([40u8, 40, 40, 255]);

    let mut segments = 0usize;
    for feature in &geojson.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };

        for polyline in geometry.polylines() {
            for pair in polyline.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.len() < 2 || b.len() < 2 {
                    continue;
                }
                // Restrict to the dataset's extent: segments fully outside
                // the grid are not drawn.
                let inside = |p: &Vec<f64>| {
                    p[0] >= west && p[0] <= east && p[1] >= south && p[1] <= north
                };
                if !inside(a) && !inside(b) {
                    continue;
                }
                let start = project(a[0], a[1]);
                let end = project(b[0], b[1]);
                draw_line_segment_mut(img, start, end, line_color);
                segments += 1;
            }
        }
    }

    debug!("Drew {} coastline segments from {}", segments, coastline_key);
    Ok(())
}
