//! Final mask to gazetteer cities.

use std::collections::{BTreeSet, HashSet};

use gazetteer::{City, Gazetteer};
use projection::{ForecastGridProjection, QuantizedKey};
use rainbow_analysis::AnalysisError;
use rainbow_common::PixelMask;
use tracing::debug;

use crate::PipelineResult;

/// Grid keys of every favourable cell.
pub fn mask_keys(mask: &PixelMask, projection: &ForecastGridProjection) -> Vec<QuantizedKey> {
    mask.iter_set()
        .map(|(col, row)| projection.key_for_cell(col, row))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct CityMatcher<'a> {
    gazetteer: &'a Gazetteer,
    projection: ForecastGridProjection,
}

impl<'a> CityMatcher<'a> {
    pub fn new(gazetteer: &'a Gazetteer) -> Self {
        Self::with_projection(gazetteer, ForecastGridProjection::default())
    }

    /// Use a projection other than the GFS half-degree grid. Cities must
    /// have been keyed with the same projection.
    pub fn with_projection(gazetteer: &'a Gazetteer, projection: ForecastGridProjection) -> Self {
        Self {
            gazetteer,
            projection,
        }
    }

    /// Cities inside favourable cells, in gazetteer order, one per id.
    pub async fn match_mask(&self, mask: &PixelMask) -> PipelineResult<Vec<City>> {
        let expected = (self.projection.width() as usize, self.projection.height() as usize);
        if (mask.width(), mask.height()) != expected {
            return Err(AnalysisError::DataIntegrity(format!(
                "mask is {}x{}, grid projection expects {}x{}",
                mask.width(),
                mask.height(),
                expected.0,
                expected.1
            ))
            .into());
        }

        if mask.is_empty() {
            return Ok(Vec::new());
        }

        let keys = mask_keys(mask, &self.projection);
        let found = self.gazetteer.find_by_keys(&keys).await?;

        let mut seen = HashSet::new();
        let cities: Vec<City> = found
            .into_iter()
            .filter(|city| seen.insert(city.id.clone()))
            .collect();

        debug!(cells = keys.len(), cities = cities.len(), "Matched mask against gazetteer");
        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineError;

    const W: usize = 720;
    const H: usize = 361;

    async fn gazetteer_with(cities: &[City]) -> Gazetteer {
        let gazetteer = Gazetteer::open_memory().await.unwrap();
        gazetteer.insert_many(cities).await.unwrap();
        gazetteer
    }

    fn city(name: &str, lat: f64, lon: f64) -> City {
        City::new("ru", name, name, lat, lon, &ForecastGridProjection::default())
    }

    fn mask_with(cells: &[(usize, usize)]) -> PixelMask {
        let mut mask = PixelMask::new(W, H, false);
        for &(x, y) in cells {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn test_mask_keys_are_unique() {
        let proj = ForecastGridProjection::default();
        let keys = mask_keys(&mask_with(&[(75, 69), (0, 0), (75, 69)]), &proj);
        let names: Vec<_> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["0x0", "75x69"]);
    }

    #[tokio::test]
    async fn test_match_is_sound_and_complete() {
        let moscow = city("Moscow", 55.75, 37.62);
        let kazan = city("Kazan", 55.79, 49.12);
        let gazetteer = gazetteer_with(&[moscow.clone(), kazan.clone()]).await;

        let p = moscow.key.point();
        let mask = mask_with(&[(p.x as usize, p.y as usize), (10, 10)]);
        let matched = CityMatcher::new(&gazetteer).match_mask(&mask).await.unwrap();

        assert_eq!(matched, vec![moscow]);
        for c in &matched {
            let p = c.key.point();
            assert!(mask.get(p.x as usize, p.y as usize));
        }
    }

    #[tokio::test]
    async fn test_cities_sharing_a_cell_both_match() {
        let moscow = city("Moscow", 55.75, 37.62);
        let neighbour = city("Neighbour", 55.70, 37.70);
        assert_eq!(moscow.key, neighbour.key);
        let gazetteer = gazetteer_with(&[moscow.clone(), neighbour.clone()]).await;

        let p = moscow.key.point();
        let matched = CityMatcher::new(&gazetteer)
            .match_mask(&mask_with(&[(p.x as usize, p.y as usize)]))
            .await
            .unwrap();
        assert_eq!(matched, vec![moscow, neighbour]);
    }

    #[tokio::test]
    async fn test_empty_gazetteer_never_matches() {
        let gazetteer = Gazetteer::open_memory().await.unwrap();
        let full = PixelMask::new(W, H, true);

        let matched = CityMatcher::new(&gazetteer).match_mask(&full).await.unwrap();
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_empty_mask_matches_nothing() {
        let gazetteer = gazetteer_with(&[city("Moscow", 55.75, 37.62)]).await;
        let matched = CityMatcher::new(&gazetteer)
            .match_mask(&PixelMask::new(W, H, false))
            .await
            .unwrap();
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_mask_size_is_rejected() {
        let gazetteer = Gazetteer::open_memory().await.unwrap();
        let err = CityMatcher::new(&gazetteer)
            .match_mask(&PixelMask::new(18, 10, true))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Analysis(AnalysisError::DataIntegrity(_))
        ));
    }
}
