//! Spherical Mercator (Web Mercator) tile-pixel projection.
//!
//! Used only for display tiles. Grid matching never goes through here.

use std::f64::consts::PI;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Default zoom level of the display map.
pub const DEFAULT_ZOOM: u8 = 4;

/// Absolute pixel position in the world image at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePixel {
    pub x: i64,
    pub y: i64,
}

/// A geographic position produced by the tile projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Project (lat, lon) in degrees to a world pixel at `zoom`.
pub fn deg2px(lat: f64, lon: f64, zoom: u8) -> TilePixel {
    let lat_rad = lat.to_radians();
    let n = 2f64.powi(zoom as i32) * TILE_SIZE as f64;
    let x = ((lon + 180.0) / 360.0 * n).floor() as i64;
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor() as i64;
    TilePixel { x, y }
}

/// Fractional tile coordinates to the position of their north-west corner.
pub fn num2deg(xtile: f64, ytile: f64, zoom: u8) -> LatLon {
    let n = 2f64.powi(zoom as i32);
    let lon = xtile / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * ytile / n)).sinh().atan().to_degrees();
    LatLon { lat, lon }
}

/// World pixel to the position of that pixel's centre.
pub fn px2deg(px: TilePixel, zoom: u8) -> LatLon {
    let size = TILE_SIZE as f64;
    let xtile = px.x as f64 / size + 0.5 / size;
    let ytile = px.y as f64 / size + 0.5 / size;
    num2deg(xtile, ytile, zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForecastGridProjection;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_origin_maps_to_world_centre() {
        let px = deg2px(0.0, 0.0, DEFAULT_ZOOM);
        let half = (TILE_SIZE as i64) * 16 / 2;
        assert_eq!(px, TilePixel { x: half, y: half });
    }

    #[test]
    fn test_num2deg_corners() {
        let nw = num2deg(0.0, 0.0, 0);
        assert_approx_eq!(nw.lon, -180.0, 1e-9);
        assert_approx_eq!(nw.lat, 85.0511, 1e-3);

        let centre = num2deg(0.5, 0.5, 0);
        assert_approx_eq!(centre.lon, 0.0, 1e-9);
        assert_approx_eq!(centre.lat, 0.0, 1e-9);
    }

    #[test]
    fn test_px2deg_inverts_deg2px_within_a_pixel() {
        for &(lat, lon) in &[(55.75, 37.62), (-33.87, 151.21), (40.67, -73.94)] {
            let px = deg2px(lat, lon, DEFAULT_ZOOM);
            let back = px2deg(px, DEFAULT_ZOOM);
            // One pixel at zoom 4 spans 360 / 4096 degrees of longitude.
            assert_approx_eq!(back.lon, lon, 360.0 / 4096.0);
            assert_approx_eq!(back.lat, lat, 0.1);
            assert_eq!(deg2px(back.lat, back.lon, DEFAULT_ZOOM), px);
        }
    }

    #[test]
    fn test_projections_disagree_on_same_position() {
        let grid = ForecastGridProjection::gfs_half_degree();
        let point = grid.position_to_point(37.62, 55.75);
        let px = deg2px(55.75, 37.62, DEFAULT_ZOOM);
        assert_ne!((point.x as i64, point.y as i64), (px.x, px.y));
    }
}
