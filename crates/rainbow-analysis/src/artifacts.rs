//! File layout of a forecast slug directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rainbow_common::ForecastSlug;

const PRODUCT: &str = "GFS_half_degree";
const VARIABLE: &str = "pwat";

/// Paths of every artifact belonging to one forecast slug.
#[derive(Debug, Clone)]
pub struct SlugArtifacts {
    dir: PathBuf,
    slug: ForecastSlug,
}

impl SlugArtifacts {
    /// Artifacts for `slug` under `data_dir/<slug>/`.
    pub fn new(data_dir: &Path, slug: ForecastSlug) -> Self {
        Self {
            dir: data_dir.join(slug.to_string()),
            slug,
        }
    }

    pub fn slug(&self) -> ForecastSlug {
        self.slug
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn product(&self, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}.{}", PRODUCT, self.slug, VARIABLE, ext))
    }

    fn stage(&self, stage: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}.{}.png", PRODUCT, stage, self.slug, VARIABLE))
    }

    /// Raw moisture raster as downloaded.
    pub fn raw_grib(&self) -> PathBuf {
        self.product("grib")
    }

    /// grib2json output for the raw raster.
    pub fn raster_json(&self) -> PathBuf {
        self.product("json")
    }

    /// Final rainbow mask. Black cells are favourable.
    pub fn final_mask(&self) -> PathBuf {
        self.product("png")
    }

    pub fn clouds_greyscale(&self) -> PathBuf {
        self.stage("clouds_greyscale")
    }

    pub fn clouds_alpha(&self) -> PathBuf {
        self.stage("clouds_alpha")
    }

    pub fn clouds_greymasked(&self) -> PathBuf {
        self.stage("clouds_greymasked")
    }

    pub fn sun_mask(&self) -> PathBuf {
        self.stage("sun_mask")
    }

    /// Thresholded cloud mask before centring on the sun.
    pub fn cloud_mask_not_inverted(&self) -> PathBuf {
        self.stage("cloud_mask.not-inverted")
    }

    /// Centred, inverted cloud mask fed to the barrel distortion.
    pub fn cloud_mask(&self) -> PathBuf {
        self.stage("cloud_mask")
    }

    /// Output of the barrel distortion.
    pub fn cloud_mask_extruded(&self) -> PathBuf {
        self.stage("cloud_mask.extruded")
    }

    /// Matched cities for this slug.
    pub fn rainbow_cities(&self) -> PathBuf {
        self.dir.join(format!("{}.rainbow_cities.json", self.slug))
    }

    /// Marker whose presence means the slug is fully processed.
    pub fn processed_marker(&self) -> PathBuf {
        self.dir.join(format!("{}.processed", self.slug))
    }
}

/// Write `bytes` to `path` through a temporary sibling and a rename, so a
/// reader never observes a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
