use crate::catalog::*;
use crate::climatology::{self, ClimatologyGrid};
use crate::extract;
use crate::input::{JobConfig, YearRange};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Writes the 2x2x3 synthetic grid used across the aggregation tests.
///
/// Data is in (time, lat, lon) order with a declared sentinel of 1e20.
/// The time coordinate carries no CF units, so its values (1, 2, 3) read
/// back as years. Per cell the value sequences are:
///   (lon 100, lat 10): 1, 2, masked
///   (lon 110, lat 10): 2, 3, 1
///   (lon 100, lat 20): 3, 4, 2
///   (lon 110, lat 20): masked, 5, 3
fn write_scenario_grid(dir: &Path) -> PathBuf {
    let path = dir.join("scenario.nc");
    let mut file = netcdf::create(&path).expect("failed to create NetCDF file");

    file.add_dimension("time", 3).expect("add dim time");
    file.add_dimension("lat", 2).expect("add dim lat");
    file.add_dimension("lon", 2).expect("add dim lon");

    {
        let mut var = file
            .add_variable::<f64>("lon", &["lon"])
            .expect("add var lon");
        var.put_values(&[100.0, 110.0], ..).expect("put lon values");
    }
    {
        let mut var = file
            .add_variable::<f64>("lat", &["lat"])
            .expect("add var lat");
        var.put_values(&[10.0, 20.0], ..).expect("put lat values");
    }
    {
        let mut var = file
            .add_variable::<f64>("time", &["time"])
            .expect("add var time");
        var.put_values(&[1.0, 2.0, 3.0], ..).expect("put time values");
    }
    {
        let mut var = file
            .add_variable::<f64>("tas", &["time", "lat", "lon"])
            .expect("add var tas");
        var.put_attribute("_FillValue", 1e20).expect("add fill value");
        let data = [
            1.0, 2.0, 3.0, 1e20, // time step 1
            2.0, 3.0, 4.0, 5.0, // time step 2
            1e20, 1.0, 2.0, 3.0, // time step 3
        ];
        var.put_values(&data, ..).expect("put tas values");
    }

    path
}

#[cfg(test)]
mod extract_tests {
    use super::*;

    #[test]
    fn test_mask_value_totality() {
        let sentinel = 1e20;
        // Strictly below passes through unchanged
        assert_eq!(extract::mask_value(0.0, sentinel), Some(0.0));
        assert_eq!(extract::mask_value(-5.0, sentinel), Some(-5.0));
        assert_eq!(extract::mask_value(1e19, sentinel), Some(1e19));
        // At or above becomes missing
        assert_eq!(extract::mask_value(1e20, sentinel), None);
        assert_eq!(extract::mask_value(2e20, sentinel), None);
    }

    #[test]
    fn test_sentinel_from_fill_value_attribute() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());

        let file = netcdf::open(&path).unwrap();
        let var = file.variable("tas").unwrap();
        assert_eq!(extract::sentinel_value(&var), 1e20);
    }

    #[test]
    fn test_sentinel_default_when_undeclared() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("plain.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("x", 1).unwrap();
            let mut var = file.add_variable::<f64>("v", &["x"]).unwrap();
            var.put_values(&[1.0], ..).unwrap();
        }

        let file = netcdf::open(&path).unwrap();
        let var = file.variable("v").unwrap();
        assert_eq!(extract::sentinel_value(&var), extract::DEFAULT_SENTINEL);
    }

    #[test]
    fn test_grid_to_dataframe_is_total() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let file = netcdf::open(&path).unwrap();

        let df = extract::grid_to_dataframe(&file, "tas").unwrap();

        // One row per grid cell, masked cells included
        assert_eq!(df.height(), 12);
        let values = df.column("tas").unwrap().f64().unwrap();
        assert_eq!(values.null_count(), 2);

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["lon", "lat", "year", "tas"]);
    }

    #[test]
    fn test_grid_to_dataframe_missing_variable() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let file = netcdf::open(&path).unwrap();

        assert!(extract::grid_to_dataframe(&file, "nope").is_err());
    }

    #[test]
    fn test_grid_to_dataframe_rejects_non_3d() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("flat.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("lat", 2).unwrap();
            file.add_dimension("lon", 2).unwrap();
            let mut var = file.add_variable::<f64>("tas", &["lat", "lon"]).unwrap();
            var.put_values(&[1.0, 2.0, 3.0, 4.0], ..).unwrap();
        }
        let file = netcdf::open(&path).unwrap();

        assert!(extract::grid_to_dataframe(&file, "tas").is_err());
    }

    #[test]
    fn test_decode_years_with_cf_units() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cf_time.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", 3).unwrap();
            let mut var = file.add_variable::<f64>("time", &["time"]).unwrap();
            // 2000 is a leap year, so day 366 lands in 2001
            var.put_attribute("units", "days since 2000-01-01").unwrap();
            var.put_values(&[0.0, 366.0, 731.0], ..).unwrap();
        }

        let file = netcdf::open(&path).unwrap();
        let years = extract::decode_years(&file, "time", 3).unwrap();
        assert_eq!(years, vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_decode_years_without_units() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());

        let file = netcdf::open(&path).unwrap();
        let years = extract::decode_years(&file, "time", 3).unwrap();
        assert_eq!(years, vec![1, 2, 3]);
    }
}

#[cfg(test)]
mod climatology_tests {
    use super::*;
    use polars::prelude::*;

    fn masked_table() -> DataFrame {
        DataFrame::new(vec![
            Series::new("lon".into(), vec![0.0, 0.0, 1.0, 1.0]).into(),
            Series::new("lat".into(), vec![0.0, 0.0, 0.0, 0.0]).into(),
            Series::new("year".into(), vec![2000i64, 2001, 2000, 2001]).into(),
            Series::new("tas".into(), vec![Some(1.0), None, Some(2.0), Some(4.0)]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_filter_years_inclusive_bounds() {
        let df = DataFrame::new(vec![
            Series::new("lon".into(), vec![0.0; 5]).into(),
            Series::new("lat".into(), vec![0.0; 5]).into(),
            Series::new("year".into(), vec![1999i64, 2000, 2001, 2002, 2003]).into(),
            Series::new("tas".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let filtered = climatology::filter_years(df, 2000, 2002).unwrap();

        // Rows with year exactly 2000 or 2002 are retained
        let years: Vec<i64> = filtered
            .column("year")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(years, vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_climatology_mean_propagates_missing() {
        let agg = climatology::climatology_mean(masked_table(), "tas").unwrap();
        let grid = ClimatologyGrid::from_dataframe(&agg, "tas").unwrap();

        // Group with a null yields a null mean, never a partial average
        assert_eq!(grid.value_at(0, 0), None);
        assert_eq!(grid.value_at(1, 0), Some(3.0));
    }

    #[test]
    fn test_climatology_grid_pivot() {
        let agg = climatology::climatology_mean(masked_table(), "tas").unwrap();
        let grid = ClimatologyGrid::from_dataframe(&agg, "tas").unwrap();

        assert_eq!(grid.lons, vec![0.0, 1.0]);
        assert_eq!(grid.lats, vec![0.0]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 1);
        assert_eq!(grid.value_range(), Some((3.0, 3.0)));
        assert_eq!(grid.extent(), Some((0.0, 1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_end_to_end_scenario_grid() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let file = netcdf::open(&path).unwrap();

        let df = extract::grid_to_dataframe(&file, "tas").unwrap();
        let filtered = climatology::filter_years(df, 1, 3).unwrap();
        assert_eq!(filtered.height(), 12);

        let agg = climatology::climatology_mean(filtered, "tas").unwrap();
        let grid = ClimatologyGrid::from_dataframe(&agg, "tas").unwrap();

        assert_eq!(grid.lons, vec![100.0, 110.0]);
        assert_eq!(grid.lats, vec![10.0, 20.0]);

        // (lon 110, lat 10): values 2, 3, 1 across the window
        assert_eq!(grid.value_at(1, 0), Some(2.0));
        // (lon 110, lat 20): one masked value nulls the whole cell
        assert_eq!(grid.value_at(1, 1), None);
        // (lon 100, lat 20): values 3, 4, 2
        assert_eq!(grid.value_at(0, 1), Some(3.0));
        // (lon 100, lat 10): masked at the last step
        assert_eq!(grid.value_at(0, 0), None);
    }

    #[test]
    fn test_time_window_excludes_masked_step() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let file = netcdf::open(&path).unwrap();

        // Restricting the window to years 1..=2 drops the masked third step
        // of (lon 100, lat 10), so its mean becomes defined again.
        let df = extract::grid_to_dataframe(&file, "tas").unwrap();
        let filtered = climatology::filter_years(df, 1, 2).unwrap();
        assert_eq!(filtered.height(), 8);

        let agg = climatology::climatology_mean(filtered, "tas").unwrap();
        let grid = ClimatologyGrid::from_dataframe(&agg, "tas").unwrap();

        assert_eq!(grid.value_at(0, 0), Some(1.5));
        // (lon 110, lat 20) is masked at step 1, still missing
        assert_eq!(grid.value_at(1, 1), None);
    }
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    #[test]
    fn test_filter_to_query_skips_unset_fields() {
        let filter = CatalogFilter {
            simulation_round: Some("ISIMIP3b".to_string()),
            climate_variable: Some("tas".to_string()),
            ..Default::default()
        };

        let params = filter.to_query();
        assert_eq!(
            params,
            vec![
                ("simulation_round", "ISIMIP3b".to_string()),
                ("climate_variable", "tas".to_string()),
            ]
        );
        assert!(!filter.is_empty());
        assert!(CatalogFilter::default().is_empty());
    }

    #[test]
    fn test_search_response_from_json() {
        let json = r#"
        {
            "count": 2,
            "results": [
                {
                    "specifiers": { "climate_variable": "tas", "climate_scenario": "ssp585" },
                    "files": [
                        {
                            "file_url": "https://files.example.org/a.nc",
                            "path": "ISIMIP3b/InputData/a.nc"
                        }
                    ]
                },
                { "files": [] }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.count, 2);
        assert_eq!(response.results.len(), 2);
        assert!(response.results[1].specifiers.is_empty());

        let refs = response.file_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].file_url, "https://files.example.org/a.nc");
        assert_eq!(response.paths(), vec!["ISIMIP3b/InputData/a.nc"]);
    }

    #[test]
    fn test_empty_search_response() {
        // A missing results list deserializes as empty, matching count 0
        let response: SearchResponse = serde_json::from_str(r#"{ "count": 0 }"#).unwrap();
        assert!(response.is_empty());
        assert!(response.file_refs().is_empty());
        assert!(response.paths().is_empty());
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    struct EmptyCatalog;

    #[async_trait::async_trait]
    impl CatalogClient for EmptyCatalog {
        async fn search(&self, _filter: &CatalogFilter) -> CatalogResult<SearchResponse> {
            Ok(SearchResponse {
                count: 0,
                results: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_empty_search_never_invokes_retriever() {
        let temp = tempdir().unwrap();
        let data_dir = temp.path().join("data");
        let config = JobConfig {
            catalog_url: "http://catalog.invalid/api/v1".to_string(),
            filter: CatalogFilter::default(),
            bbox: None,
            variable_name: "tas".to_string(),
            years: YearRange::new(2000, 2010).unwrap(),
            data_dir: data_dir.clone(),
            map_key: temp.path().join("map.png").display().to_string(),
            table_key: None,
            style: Default::default(),
            download: Default::default(),
        };

        crate::run_pipeline_with_catalog(&EmptyCatalog, &config)
            .await
            .unwrap();

        // The retriever was never reached: it would have created data_dir
        assert!(!data_dir.exists());
    }
}

#[cfg(test)]
mod subset_tests {
    use crate::subset::{BoundingBox, CutoutResponse};

    #[test]
    fn test_bounding_box_validation() {
        assert!(BoundingBox::new(-10.0, 10.0, 95.0, 141.0).is_ok());
        // south above north
        assert!(BoundingBox::new(10.0, -10.0, 95.0, 141.0).is_err());
        // west beyond east
        assert!(BoundingBox::new(-10.0, 10.0, 141.0, 95.0).is_err());
        // out-of-range degrees
        assert!(BoundingBox::new(-91.0, 10.0, 95.0, 141.0).is_err());
        assert!(BoundingBox::new(-10.0, 10.0, -181.0, 141.0).is_err());
        assert!(BoundingBox::new(-10.0, 10.0, 95.0, 181.0).is_err());
    }

    #[test]
    fn test_bounding_box_wire_order() {
        let bbox = BoundingBox::new(-10.0, 10.0, 95.0, 141.0).unwrap();
        assert_eq!(bbox.to_array(), [-10.0, 10.0, 95.0, 141.0]);
    }

    #[test]
    fn test_bounding_box_contains_is_inclusive() {
        let bbox = BoundingBox::new(-10.0, 10.0, 95.0, 141.0).unwrap();
        assert!(bbox.contains(95.0, -10.0));
        assert!(bbox.contains(141.0, 10.0));
        assert!(bbox.contains(120.0, 0.0));
        assert!(!bbox.contains(94.9, 0.0));
        assert!(!bbox.contains(120.0, 10.1));
    }

    #[test]
    fn test_cutout_response_from_json() {
        let json = r#"
        {
            "id": "0123abcd",
            "file_url": "https://files.example.org/cutouts/tas_cutout.nc",
            "status": "finished"
        }"#;

        let response: CutoutResponse = serde_json::from_str(json).unwrap();
        let file_ref = response.file_ref();
        assert_eq!(
            file_ref.file_url,
            "https://files.example.org/cutouts/tas_cutout.nc"
        );
        assert_eq!(file_ref.path, "tas_cutout.nc");
    }
}

#[cfg(test)]
mod download_tests {
    use super::*;
    use crate::download;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs::{self, File};
    use std::io::Write;

    #[test]
    fn test_ensure_data_dir_is_idempotent() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("data").join("nested");

        download::ensure_data_dir(&dir).unwrap();
        assert!(dir.is_dir());

        // A pre-existing directory is not an error
        download::ensure_data_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            download::file_name_from_url("https://files.example.org/a/b/tas.nc").unwrap(),
            "tas.nc"
        );
        assert_eq!(
            download::file_name_from_url("https://files.example.org/tas.nc?token=x").unwrap(),
            "tas.nc"
        );
        assert!(download::file_name_from_url("https://files.example.org/").is_err());
    }

    #[test]
    fn test_extract_archive_gzip() {
        let temp = tempdir().unwrap();
        let archive_path = temp.path().join("grid.nc.gz");
        {
            let mut encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
            encoder.write_all(b"netcdf bytes").unwrap();
            encoder.finish().unwrap();
        }

        let extracted = download::extract_archive(&archive_path, temp.path()).unwrap();
        assert_eq!(extracted, temp.path().join("grid.nc"));
        assert_eq!(fs::read(extracted).unwrap(), b"netcdf bytes");
    }

    #[test]
    fn test_extract_archive_tarball() {
        let temp = tempdir().unwrap();
        let payload = temp.path().join("inner.nc");
        fs::write(&payload, b"payload").unwrap();

        let archive_path = temp.path().join("bundle.tar.gz");
        {
            let encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder
                .append_path_with_name(&payload, "inner.nc")
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let out_dir = temp.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();
        let extracted = download::extract_archive(&archive_path, &out_dir).unwrap();
        assert_eq!(extracted, out_dir);
        assert_eq!(fs::read(out_dir.join("inner.nc")).unwrap(), b"payload");
    }

    #[test]
    fn test_extract_archive_passthrough() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("plain.nc");
        fs::write(&path, b"not an archive").unwrap();

        let result = download::extract_archive(&path, temp.path()).unwrap();
        assert_eq!(result, path);
    }

    #[test]
    fn test_sha256_hex() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            download::sha256_hex(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

#[cfg(test)]
mod render_tests {
    use super::*;
    use crate::render::{self, MapStyle};
    use std::fs;

    fn scenario_climatology(temp: &Path) -> ClimatologyGrid {
        let path = write_scenario_grid(temp);
        let file = netcdf::open(&path).unwrap();
        let df = extract::grid_to_dataframe(&file, "tas").unwrap();
        let filtered = climatology::filter_years(df, 1, 3).unwrap();
        let agg = climatology::climatology_mean(filtered, "tas").unwrap();
        ClimatologyGrid::from_dataframe(&agg, "tas").unwrap()
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(render::hex_to_rgb("#ff0000"), Some((255, 0, 0)));
        assert_eq!(render::hex_to_rgb("00ff80"), Some((0, 255, 128)));
        assert_eq!(render::hex_to_rgb("#fff"), None);
        assert_eq!(render::hex_to_rgb("#gggggg"), None);
    }

    #[test]
    fn test_band_edges_align_to_interval_multiples() {
        let edges = render::band_edges(1.2, 4.0, 1.0);
        assert_eq!(edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let edges = render::band_edges(-3.5, -1.0, 2.0);
        assert_eq!(edges, vec![-4.0, -2.0, 0.0]);

        assert!(render::band_edges(0.0, 1.0, 0.0).is_empty());
        assert!(render::band_edges(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_render_map_writes_png() {
        let temp = tempdir().unwrap();
        let grid = scenario_climatology(temp.path());
        let out = temp.path().join("map.png");

        let style = MapStyle {
            band_interval: 0.5,
            cell_size: 4,
            ..Default::default()
        };
        render::render_map(&grid, &style, &out).unwrap();

        let img = image::open(&out).unwrap().to_rgba8();
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 8);

        // Top-right block is the missing (lon 110, lat 20) cell
        assert_eq!(img.get_pixel(6, 1).0[3], 0);
        // Bottom-right block is the defined (lon 110, lat 10) cell
        assert_eq!(img.get_pixel(6, 6).0[3], 255);
    }

    #[test]
    fn test_render_map_with_coastline_overlay() {
        let temp = tempdir().unwrap();
        let grid = scenario_climatology(temp.path());

        let coastline_path = temp.path().join("coast.json");
        fs::write(
            &coastline_path,
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[100.0, 10.0], [110.0, 20.0], [150.0, 40.0]]
                        }
                    },
                    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 0] } }
                ]
            }"#,
        )
        .unwrap();

        let out = temp.path().join("map.png");
        let style = MapStyle {
            band_interval: 0.5,
            cell_size: 8,
            coastline_key: Some(coastline_path.display().to_string()),
            ..Default::default()
        };
        render::render_map(&grid, &style, &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_render_map_rejects_bad_inputs() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("map.png");

        let empty = ClimatologyGrid {
            lons: vec![],
            lats: vec![],
            cells: vec![],
        };
        assert!(render::render_map(&empty, &MapStyle::default(), &out).is_err());

        let grid = scenario_climatology(temp.path());
        let style = MapStyle {
            band_interval: 0.0,
            ..Default::default()
        };
        assert!(render::render_map(&grid, &style, &out).is_err());

        let style = MapStyle {
            color_stops: vec!["#nothex".to_string()],
            ..Default::default()
        };
        assert!(render::render_map(&grid, &style, &out).is_err());
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;

    #[test]
    fn test_job_config_from_json() {
        let json = r#"
        {
            "catalog_url": "https://data.isimip.org/api/v1",
            "filter": {
                "simulation_round": "ISIMIP3b",
                "climate_scenario": "ssp585",
                "climate_variable": "tas"
            },
            "bbox": { "south": -10.0, "north": 10.0, "west": 95.0, "east": 141.0 },
            "variable_name": "tas",
            "years": { "start": 2041, "end": 2060 },
            "map_key": "tas_climatology.png"
        }"#;

        let config = JobConfig::from_json(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.catalog_url, "https://data.isimip.org/api/v1");
        assert_eq!(config.filter.climate_variable.as_deref(), Some("tas"));
        assert_eq!(config.years, YearRange { start: 2041, end: 2060 });
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.table_key.is_none());
        assert!(!config.download.validate);
        assert_eq!(config.style.band_interval, 1.0);
    }

    #[test]
    fn test_job_config_from_yaml() {
        let yaml = r#"
catalog_url: https://data.isimip.org/api/v1
filter:
  climate_variable: pr
variable_name: pr
years:
  start: 1991
  end: 2020
map_key: pr_climatology.png
download:
  validate: true
  extract: true
"#;

        let config = JobConfig::from_yaml(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.variable_name, "pr");
        assert!(config.download.validate);
        assert!(config.download.extract);
    }

    #[test]
    fn test_job_config_validation_errors() {
        let base = r#"
        {
            "catalog_url": "https://data.isimip.org/api/v1",
            "variable_name": "tas",
            "years": { "start": 2060, "end": 2041 },
            "map_key": "map.png"
        }"#;
        let config = JobConfig::from_json(base).unwrap();
        assert!(config.validate().is_err());

        let bad_bbox = r#"
        {
            "catalog_url": "https://data.isimip.org/api/v1",
            "variable_name": "tas",
            "years": { "start": 2041, "end": 2060 },
            "map_key": "map.png",
            "bbox": { "south": 10.0, "north": -10.0, "west": 95.0, "east": 141.0 }
        }"#;
        let config = JobConfig::from_json(bad_bbox).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_year_range_contains() {
        let years = YearRange::new(2000, 2002).unwrap();
        assert!(years.contains(2000));
        assert!(years.contains(2002));
        assert!(!years.contains(1999));
        assert!(!years.contains(2003));

        assert!(YearRange::new(2002, 2000).is_err());
    }
}

#[cfg(test)]
mod info_tests {
    use super::*;
    use crate::info;

    #[test]
    fn test_get_netcdf_info() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());

        let info = info::get_netcdf_info(&path.display().to_string(), None, true).unwrap();
        assert_eq!(info.total_dimensions, 3);
        assert_eq!(info.total_variables, 4);

        let tas = info.variables.iter().find(|v| v.name == "tas").unwrap();
        assert_eq!(tas.dimensions, vec!["time", "lat", "lon"]);
        assert_eq!(tas.shape, vec![3, 2, 2]);
        assert!(tas.attributes.contains_key("_FillValue"));
    }

    #[test]
    fn test_get_netcdf_info_single_variable() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());

        let info =
            info::get_netcdf_info(&path.display().to_string(), Some("tas"), false).unwrap();
        assert_eq!(info.variables.len(), 1);
        assert_eq!(info.variables[0].name, "tas");
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;
    use crate::output;

    #[test]
    fn test_write_dataframe_to_parquet() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let file = netcdf::open(&path).unwrap();
        let df = extract::grid_to_dataframe(&file, "tas").unwrap();

        let parquet_path = temp.path().join("table.parquet");
        output::write_dataframe_to_parquet(&df, &parquet_path.display().to_string()).unwrap();

        let metadata = std::fs::metadata(&parquet_path).unwrap();
        assert!(metadata.len() > 0);
    }
}

#[cfg(test)]
mod map_file_tests {
    use super::*;

    #[test]
    fn test_map_netcdf_file_end_to_end() {
        let temp = tempdir().unwrap();
        let path = write_scenario_grid(temp.path());
        let map_path = temp.path().join("map.png");
        let table_path = temp.path().join("table.parquet");

        crate::map_netcdf_file(
            &path,
            "tas",
            YearRange::new(1, 3).unwrap(),
            &Default::default(),
            &map_path.display().to_string(),
            Some(&table_path.display().to_string()),
        )
        .unwrap();

        assert!(map_path.exists());
        assert!(table_path.exists());
    }
}
