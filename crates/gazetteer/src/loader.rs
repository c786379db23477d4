//! Reference-data importers.
//!
//! Two sources feed the gazetteer: a world-cities CSV with populations,
//! and a per-country JSON list carrying native and English names.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use projection::ForecastGridProjection;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::city::City;
use crate::GazetteerResult;

/// Places smaller than this are left out of the world import.
pub const DEFAULT_MIN_POPULATION: u64 = 50_000;

/// Number of columns in a world-cities row:
/// `country, ascii name, name, region code, population, lat, lon`.
const WORLD_COLUMNS: usize = 7;

/// Read a headerless world-cities CSV.
///
/// Rows with an empty or unparseable population count as unpopulated.
/// Rows with the wrong shape or bad coordinates are skipped with a warning.
pub fn read_world_csv<R: Read>(
    reader: R,
    min_population: u64,
    projection: &ForecastGridProjection,
) -> GazetteerResult<Vec<City>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut cities = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in csv.byte_records().enumerate() {
        let record = record?;
        if record.len() != WORLD_COLUMNS {
            warn!(line = line + 1, columns = record.len(), "Skipping malformed city row");
            skipped += 1;
            continue;
        }
        let field = |i: usize| String::from_utf8_lossy(&record[i]).trim().to_string();

        let population = field(4).parse::<u64>().unwrap_or(0);
        if population < min_population {
            continue;
        }

        let (lat, lon) = match (field(5).parse::<f64>(), field(6).parse::<f64>()) {
            (Ok(lat), Ok(lon)) => (lat, lon),
            _ => {
                warn!(line = line + 1, "Skipping city row with bad coordinates");
                skipped += 1;
                continue;
            }
        };

        let name = field(2);
        cities.push(City::new(field(0), name.clone(), name, lat, lon, projection));
    }

    debug!(cities = cities.len(), skipped = skipped, "Read world cities CSV");
    Ok(cities)
}

pub fn load_world_csv(
    path: &Path,
    min_population: u64,
    projection: &ForecastGridProjection,
) -> GazetteerResult<Vec<City>> {
    let file = File::open(path)?;
    read_world_csv(BufReader::new(file), min_population, projection)
}

#[derive(Debug, Deserialize)]
struct NamedCity {
    lat: f64,
    lon: f64,
    name_ru: String,
    name_en: String,
}

/// Read a JSON list of `{lat, lon, name_ru, name_en}` for one country.
pub fn read_city_json<R: Read>(
    reader: R,
    country: &str,
    projection: &ForecastGridProjection,
) -> GazetteerResult<Vec<City>> {
    let entries: Vec<NamedCity> = serde_json::from_reader(reader)?;
    Ok(entries
        .into_iter()
        .map(|c| City::new(country, c.name_ru, c.name_en, c.lat, c.lon, projection))
        .collect())
}

pub fn load_city_json(
    path: &Path,
    country: &str,
    projection: &ForecastGridProjection,
) -> GazetteerResult<Vec<City>> {
    let file = File::open(path)?;
    read_city_json(BufReader::new(file), country, projection)
}
