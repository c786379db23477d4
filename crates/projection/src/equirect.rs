//! Forecast-grid projection.
//!
//! Maps geographic positions onto the cells of the GFS half-degree grid,
//! whose origin is (0°E, 90°N) with columns running east and rows running
//! south. The mapping is quantized: the inverse lands back in the same cell,
//! not on the original coordinate.

use std::fmt;
use std::str::FromStr;

use rainbow_common::CommonError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Integer cell coordinates on the forecast grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Lookup key for one grid cell, serialized as `"{x}x{y}"`.
///
/// Keys stored in the gazetteer and keys derived from a forecast mask must
/// come from the same [`ForecastGridProjection`], otherwise nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedKey(GridPoint);

impl QuantizedKey {
    pub fn point(&self) -> GridPoint {
        self.0
    }
}

impl From<GridPoint> for QuantizedKey {
    fn from(point: GridPoint) -> Self {
        Self(point)
    }
}

impl fmt::Display for QuantizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0.x, self.0.y)
    }
}

impl FromStr for QuantizedKey {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CommonError::InvalidKey(s.to_string());
        let (x, y) = s.split_once('x').ok_or_else(invalid)?;
        let x = x.parse::<u32>().map_err(|_| invalid())?;
        let y = y.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self(GridPoint { x, y }))
    }
}

impl Serialize for QuantizedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuantizedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Equirectangular projection onto a global grid with square cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastGridProjection {
    /// Cells per degree
    cells_per_degree: f64,
    /// Number of columns covering 360°
    width: u32,
    /// Number of rows from pole to pole inclusive
    height: u32,
}

impl Default for ForecastGridProjection {
    fn default() -> Self {
        Self::gfs_half_degree()
    }
}

impl ForecastGridProjection {
    /// The GFS 0.5° grid: 720 columns, 361 rows.
    pub fn gfs_half_degree() -> Self {
        Self::with_resolution(2.0)
    }

    /// A global grid with `cells_per_degree` cells along each degree.
    pub fn with_resolution(cells_per_degree: f64) -> Self {
        let width = (360.0 * cells_per_degree).round() as u32;
        let height = (180.0 * cells_per_degree).round() as u32 + 1;
        Self {
            cells_per_degree,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Map (lon, lat) in degrees to a grid cell.
    ///
    /// Longitude wraps into [0, 360), so negative-west values land on the
    /// right side of the grid. Latitude is clamped to the poles.
    pub fn position_to_point(&self, lon: f64, lat: f64) -> GridPoint {
        let lon = lon.rem_euclid(360.0);
        let x = (lon * self.cells_per_degree).round() as u32 % self.width.max(1);

        let lat = lat.clamp(-90.0, 90.0);
        let y = ((lat - 90.0) * -self.cells_per_degree).round() as u32;
        GridPoint {
            x,
            y: y.min(self.height.saturating_sub(1)),
        }
    }

    /// Map a grid cell back to (lon, lat) in degrees.
    pub fn point_to_position(&self, point: GridPoint) -> (f64, f64) {
        let lon = point.x as f64 / self.cells_per_degree;
        let lat = 90.0 - point.y as f64 / self.cells_per_degree;
        (lon, lat)
    }

    pub fn key_for_position(&self, lon: f64, lat: f64) -> QuantizedKey {
        QuantizedKey(self.position_to_point(lon, lat))
    }

    /// Key of a mask cell, taken through the same projection used for cities.
    pub fn key_for_cell(&self, col: usize, row: usize) -> QuantizedKey {
        let (lon, lat) = self.point_to_position(GridPoint::new(col as u32, row as u32));
        self.key_for_position(lon, lat)
    }
}
