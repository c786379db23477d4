//! City records.

use projection::{ForecastGridProjection, QuantizedKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Content id of a city: hex SHA-256 of `"<lat>:<lon>"`.
///
/// Coordinates are formatted with `{:?}` so whole degrees keep their
/// trailing `.0` and the id is stable across importers.
pub fn city_id(latitude: f64, longitude: f64) -> String {
    let digest = Sha256::digest(format!("{:?}:{:?}", latitude, longitude).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A populated place in the gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub country: String,
    pub name: String,
    pub name_en: String,
    pub latitude: f64,
    pub longitude: f64,
    pub key: QuantizedKey,
}

impl City {
    /// Build a city, deriving its id and grid key.
    pub fn new(
        country: impl Into<String>,
        name: impl Into<String>,
        name_en: impl Into<String>,
        latitude: f64,
        longitude: f64,
        projection: &ForecastGridProjection,
    ) -> Self {
        Self {
            id: city_id(latitude, longitude),
            country: country.into().to_lowercase(),
            name: name.into(),
            name_en: name_en.into(),
            latitude,
            longitude,
            key: projection.key_for_position(longitude, latitude),
        }
    }

    /// Great-circle distance to a point, in kilometres.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_km(self.latitude, self.longitude, latitude, longitude)
    }
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_id_is_stable_hex() {
        let id = city_id(55.75, 37.62);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, city_id(55.75, 37.62));
        assert_ne!(id, city_id(37.62, 55.75));
    }

    #[test]
    fn test_whole_degrees_keep_fraction() {
        // sha256("50.0:30.0")
        assert_eq!(
            city_id(50.0, 30.0),
            "a96686226da8376fa30b9056c62c69239de1d0b2df7d6c3fb23d424f1b842713"
        );
    }

    #[test]
    fn test_new_derives_key() {
        let proj = ForecastGridProjection::gfs_half_degree();
        let city = City::new("RU", "Москва", "Moscow", 55.75, 37.62, &proj);
        assert_eq!(city.country, "ru");
        assert_eq!(city.key.to_string(), "75x69");
        assert_eq!(city.id, city_id(55.75, 37.62));
    }

    #[test]
    fn test_negative_west_longitude_wraps() {
        let proj = ForecastGridProjection::gfs_half_degree();
        let city = City::new("us", "New York", "New York", 40.71, -74.01, &proj);
        // 285.99°E -> column 572, 49.29° south of the pole -> row 99
        assert_eq!(city.key.to_string(), "572x99");
    }

    #[test]
    fn test_haversine() {
        // One degree of latitude is about 111 km.
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.1, "got {}", d);
        assert_eq!(haversine_km(10.0, 20.0, 10.0, 20.0), 0.0);
    }
}
