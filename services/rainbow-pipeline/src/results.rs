//! Rainbow city result files.

use std::path::{Path, PathBuf};

use gazetteer::City;
use rainbow_analysis::{write_atomic, SlugArtifacts};
use rainbow_common::ForecastSlug;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::PipelineResult;

/// File name of the latest-result alias inside the latest directory.
pub const LATEST_FILE: &str = "rainbow_cities.json";

/// One matched city as published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEntry {
    pub id: String,
    pub country: String,
    pub name: String,
    pub name_en: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&City> for CityEntry {
    fn from(city: &City) -> Self {
        Self {
            id: city.id.clone(),
            country: city.country.clone(),
            name: city.name.clone(),
            name_en: city.name_en.clone(),
            latitude: city.latitude,
            longitude: city.longitude,
        }
    }
}

/// Write `<slug>.rainbow_cities.json` and refresh the latest alias.
///
/// Returns the slug result path.
pub fn write_results(
    data_dir: &Path,
    latest_dir: &Path,
    slug: ForecastSlug,
    cities: &[City],
) -> PipelineResult<PathBuf> {
    let entries: Vec<CityEntry> = cities.iter().map(CityEntry::from).collect();
    let json = serde_json::to_vec_pretty(&entries)?;

    let path = SlugArtifacts::new(data_dir, slug).rainbow_cities();
    write_atomic(&path, &json)?;

    std::fs::create_dir_all(latest_dir)?;
    let latest = latest_dir.join(LATEST_FILE);
    write_atomic(&latest, &json)?;

    debug!(slug = %slug, path = %path.display(), cities = entries.len(), "Wrote rainbow cities");
    Ok(path)
}

pub fn read_results(path: &Path) -> PipelineResult<Vec<CityEntry>> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
