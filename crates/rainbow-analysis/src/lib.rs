//! Rainbow analysis of GFS precipitable-water forecasts.
//!
//! For one forecast slug this crate turns the raw moisture raster into a
//! binary "rainbow favourable" mask:
//!
//! 1. [`raster`]: grib2json output to a [`rainbow_common::RasterGrid`]
//! 2. [`classifier`]: greyscale, contrast boost and threshold to cloud cores
//! 3. [`solar`]: solar altitude per cell and the 0°..42° eligibility mask
//! 4. [`corrector`]: centring on the sun, barrel distortion and compositing
//!
//! [`analyze::analyze_slug`] runs all of it and writes the artifacts named
//! in [`artifacts`].

pub mod analyze;
pub mod artifacts;
pub mod classifier;
pub mod corrector;
pub mod distortion;
pub mod error;
pub mod raster;
pub mod solar;
pub mod tools;

pub use analyze::{analyze_slug, load_final_mask, AnalysisOptions, AnalysisReport};
pub use artifacts::{write_atomic, SlugArtifacts};
pub use error::{AnalysisError, AnalysisResult};
pub use tools::{RasterTool, Toolset, Transform};
