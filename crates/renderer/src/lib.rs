//! Raster artifact encoding.
//!
//! Every stage of the rainbow analysis persists its output as a PNG the same
//! size as the forecast grid. Encoding is done in-house (see [`png`]); decoding
//! goes through the `image` crate so that files produced by external tools
//! can be read back too.

pub mod decode;
pub mod error;
pub mod png;

use std::path::Path;

use rainbow_common::GreyImage;

pub use decode::decode_grey;
pub use error::{RenderError, RenderResult};

/// Encode and write a greyscale image.
pub fn save_grey(path: &Path, image: &GreyImage) -> RenderResult<()> {
    let bytes = png::create_png_grey(image.pixels(), image.width(), image.height())?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "Wrote greyscale PNG");
    Ok(())
}

/// Encode and write a grey+alpha image built from two equal-sized planes.
pub fn save_grey_alpha(path: &Path, luma: &GreyImage, alpha: &GreyImage) -> RenderResult<()> {
    if luma.width() != alpha.width() || luma.height() != alpha.height() {
        return Err(RenderError::InvalidDimensions {
            width: alpha.width(),
            height: alpha.height(),
            len: luma.pixels().len(),
        });
    }
    let interleaved: Vec<u8> = luma
        .pixels()
        .iter()
        .zip(alpha.pixels())
        .flat_map(|(&l, &a)| [l, a])
        .collect();
    let bytes = png::create_png_grey_alpha(&interleaved, luma.width(), luma.height())?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "Wrote grey+alpha PNG");
    Ok(())
}

/// Read a PNG from disk as greyscale.
pub fn load_grey(path: &Path) -> RenderResult<GreyImage> {
    let bytes = std::fs::read(path)?;
    decode_grey(&bytes)
}
