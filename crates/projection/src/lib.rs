//! Coordinate mappings.
//!
//! Two independent projections live here and are never mixed:
//! - [`equirect`]: the forecast grid (0.5° equirectangular, origin 0°E 90°N).
//!   City matching and gazetteer keys always go through this one.
//! - [`mercator`]: spherical Mercator tile pixels for display.
//!
//! Each projection has its own output types, and there are no conversions
//! between them.

pub mod equirect;
pub mod mercator;

pub use equirect::{ForecastGridProjection, GridPoint, QuantizedKey};
pub use mercator::{LatLon, TilePixel, TILE_SIZE};
