//! Common types shared across the rainbow forecast crates.

pub mod error;
pub mod grid;
pub mod image;
pub mod mask;
pub mod time;

pub use error::{CommonError, CommonResult};
pub use grid::{GridCell, GridSpec, RasterGrid};
pub use image::GreyImage;
pub use mask::PixelMask;
pub use time::ForecastSlug;
