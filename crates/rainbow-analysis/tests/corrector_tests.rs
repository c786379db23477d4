//! Geometry corrector tests on the full half-degree grid.
//!
//! The solar field is injected so the subsolar point is known exactly and
//! every cell is eligible (altitude between 0° and 42°).

use std::collections::BTreeSet;

use rainbow_analysis::corrector::GeometryCorrector;
use rainbow_analysis::distortion::BarrelParams;
use rainbow_analysis::solar::SolarField;
use rainbow_analysis::tools::NativeBarrel;
use rainbow_analysis::SlugArtifacts;
use rainbow_common::{ForecastSlug, PixelMask};
use test_utils::altitudes_with_peak;

const W: usize = 720;
const H: usize = 361;

fn artifacts(dir: &tempfile::TempDir) -> SlugArtifacts {
    let slug = ForecastSlug::parse("2016092812").unwrap();
    let artifacts = SlugArtifacts::new(dir.path(), slug);
    std::fs::create_dir_all(artifacts.dir()).unwrap();
    artifacts
}

/// Cells whose distortion source is the (centred) cloud cell, excluding the
/// cloud cell itself, rolled back into grid coordinates.
fn expected_cells(cloud: (usize, usize), sun: (usize, usize)) -> BTreeSet<(usize, usize)> {
    let translate = (W / 2) as isize - sun.0 as isize;
    let centred_x = (cloud.0 as isize + translate).rem_euclid(W as isize) as usize;
    let centred = (centred_x, cloud.1);
    let params = BarrelParams::rainbow((W / 2) as f64, sun.1 as f64);

    let mut cells = BTreeSet::new();
    for y in 0..H {
        for x in 0..W {
            if (x, y) != centred && params.source_pixel(x, y, W, H) == Some(centred) {
                let gx = (x as isize - translate).rem_euclid(W as isize) as usize;
                cells.insert((gx, y));
            }
        }
    }
    cells
}

#[test]
fn test_single_cloud_cell_yields_antisolar_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = artifacts(&dir);

    let sun = (100, 180);
    let cloud = (160, 180);
    let mut clouds = PixelMask::new(W, H, false);
    clouds.set(cloud.0, cloud.1, true);
    let solar =
        SolarField::from_altitudes(W, H, altitudes_with_peak(W, H, sun, 19.0, 20.0)).unwrap();

    let result = GeometryCorrector::new(&NativeBarrel, 0)
        .correct(&clouds, &solar, &artifacts)
        .unwrap();

    assert_eq!(result.subsolar, sun);
    assert_eq!(result.translate_x, 260);
    assert_eq!(result.sun_mask.count(), W * H);

    let got: BTreeSet<_> = result.favourable.iter_set().collect();
    let expected = expected_cells(cloud, sun);
    assert!(!expected.is_empty());
    assert!(expected.contains(&(161, 180)));
    assert_eq!(got, expected);
    // The cloud cell itself is never favourable.
    assert!(!result.favourable.get(cloud.0, cloud.1));
}

#[test]
fn test_cloud_across_the_date_line() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = artifacts(&dir);

    // Centring wraps the cloud from the east edge onto the west half.
    let sun = (600, 150);
    let cloud = (5, 150);
    let mut clouds = PixelMask::new(W, H, false);
    clouds.set(cloud.0, cloud.1, true);
    let solar =
        SolarField::from_altitudes(W, H, altitudes_with_peak(W, H, sun, 19.0, 20.0)).unwrap();

    let result = GeometryCorrector::new(&NativeBarrel, 0)
        .correct(&clouds, &solar, &artifacts)
        .unwrap();

    let got: BTreeSet<_> = result.favourable.iter_set().collect();
    assert_eq!(got, expected_cells(cloud, sun));
}

#[test]
fn test_solar_offset_moves_eligibility_and_sun_together() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = artifacts(&dir);

    let clouds = PixelMask::new(W, H, false);
    let mut alts = vec![-1.0; W * H];
    alts[180 * W + 10] = 30.0;
    let solar = SolarField::from_altitudes(W, H, alts).unwrap();

    let result = GeometryCorrector::new(&NativeBarrel, 360)
        .correct(&clouds, &solar, &artifacts)
        .unwrap();

    assert_eq!(result.subsolar, (370, 180));
    assert_eq!(result.sun_mask.iter_set().collect::<Vec<_>>(), vec![(370, 180)]);
}
