//! Common test fixtures for forecast directories.
//!
//! A [`ForecastTree`] is a throw-away data directory laid out the way the
//! pipeline expects: one `<slug>/` directory per forecast holding the raw
//! GRIB file, its grib2json conversion and the derived artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use rainbow_common::GridSpec;
use tempfile::TempDir;

/// A tiny global grid (20° cells) that keeps analysis tests fast.
pub fn coarse_global_grid() -> GridSpec {
    GridSpec::new(18, 10, 20.0, -20.0, 0.0, 90.0)
}

/// Render a grid as grib2json output (`grib2json -d -n`).
///
/// `dy` is written unsigned, as grib2json does; the scan direction is
/// implied by `la1` and `la2`.
pub fn grib2json_document(spec: &GridSpec, data: &[f32]) -> String {
    let lo2 = spec.first_x + (spec.nx.saturating_sub(1)) as f64 * spec.dx;
    let la2 = spec.first_y + (spec.ny.saturating_sub(1)) as f64 * spec.dy;
    serde_json::json!([{
        "header": {
            "discipline": 0,
            "parameterCategory": 1,
            "parameterNumber": 3,
            "parameterNumberName": "Precipitable_water",
            "parameterUnit": "kg.m-2",
            "lo1": spec.first_x,
            "la1": spec.first_y,
            "lo2": lo2,
            "la2": la2,
            "dx": spec.dx.abs(),
            "dy": spec.dy.abs(),
            "nx": spec.nx,
            "ny": spec.ny,
        },
        "data": data,
    }])
    .to_string()
}

/// Temporary forecast data directory.
pub struct ForecastTree {
    dir: TempDir,
}

impl ForecastTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The data directory containing the slug directories.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create (if needed) and return the directory for `slug`.
    pub fn slug_dir(&self, slug: &str) -> PathBuf {
        let path = self.root().join(slug);
        fs::create_dir_all(&path).expect("create slug dir");
        path
    }

    pub fn raw_grib_path(&self, slug: &str) -> PathBuf {
        self.root()
            .join(slug)
            .join(format!("GFS_half_degree.{}.pwat.grib", slug))
    }

    pub fn raster_json_path(&self, slug: &str) -> PathBuf {
        self.root()
            .join(slug)
            .join(format!("GFS_half_degree.{}.pwat.json", slug))
    }

    pub fn final_mask_path(&self, slug: &str) -> PathBuf {
        self.root()
            .join(slug)
            .join(format!("GFS_half_degree.{}.pwat.png", slug))
    }

    pub fn marker_path(&self, slug: &str) -> PathBuf {
        self.root().join(slug).join(format!("{}.processed", slug))
    }

    pub fn result_path(&self, slug: &str) -> PathBuf {
        self.root()
            .join(slug)
            .join(format!("{}.rainbow_cities.json", slug))
    }

    /// Write a placeholder raw GRIB file; its content is never parsed.
    pub fn add_raw_grib(&self, slug: &str) -> PathBuf {
        self.slug_dir(slug);
        let path = self.raw_grib_path(slug);
        fs::write(&path, b"GRIB").expect("write grib");
        path
    }

    /// Write grib2json output for `slug`.
    pub fn add_raster_json(&self, slug: &str, spec: &GridSpec, data: &[f32]) -> PathBuf {
        self.slug_dir(slug);
        let path = self.raster_json_path(slug);
        fs::write(&path, grib2json_document(spec, data)).expect("write grib2json");
        path
    }

    /// Raw GRIB plus its conversion, i.e. a forecast ready for analysis.
    pub fn add_forecast(&self, slug: &str, spec: &GridSpec, data: &[f32]) {
        self.add_raw_grib(slug);
        self.add_raster_json(slug, spec, data);
    }

    pub fn add_marker(&self, slug: &str) -> PathBuf {
        self.slug_dir(slug);
        let path = self.marker_path(slug);
        fs::write(&path, b"").expect("write marker");
        path
    }

    pub fn has_marker(&self, slug: &str) -> bool {
        self.marker_path(slug).exists()
    }

    /// Names of all files in a slug directory, sorted.
    pub fn files_in(&self, slug: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root().join(slug))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for ForecastTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grib2json_document_shape() {
        let spec = coarse_global_grid();
        let doc = grib2json_document(&spec, &vec![1.0; spec.len()]);
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();

        let header = &value[0]["header"];
        assert_eq!(header["nx"], 18);
        assert_eq!(header["la1"], 90.0);
        assert_eq!(header["la2"], -90.0);
        assert_eq!(header["dy"], 20.0);
        assert_eq!(value[0]["data"].as_array().unwrap().len(), 180);
    }

    #[test]
    fn test_forecast_tree_layout() {
        let tree = ForecastTree::new();
        tree.add_raw_grib("2016092812");
        tree.add_marker("2016092812");

        assert!(tree.has_marker("2016092812"));
        assert_eq!(
            tree.files_in("2016092812"),
            vec![
                "2016092812.processed".to_string(),
                "GFS_half_degree.2016092812.pwat.grib".to_string(),
            ]
        );
    }
}
