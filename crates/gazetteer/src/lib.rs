//! Gazetteer of cities keyed by forecast grid cell.
//!
//! Each city carries the [`projection::QuantizedKey`] of the cell it falls in,
//! computed with the same forecast-grid projection that is used to read keys
//! off a rainbow mask. Lookups are set-membership queries on that key.

pub mod city;
pub mod error;
pub mod loader;
pub mod store;

pub use city::{city_id, City};
pub use error::{GazetteerError, GazetteerResult};
pub use loader::{load_city_json, load_world_csv, DEFAULT_MIN_POPULATION};
pub use store::Gazetteer;
