//! PNG decoding into [`GreyImage`].

use rainbow_common::GreyImage;

use crate::RenderResult;

/// Decode any image format the `image` crate understands into 8-bit luma.
///
/// Colour inputs are converted to luminance and any alpha channel is dropped.
pub fn decode_grey(bytes: &[u8]) -> RenderResult<GreyImage> {
    let decoded = image::load_from_memory(bytes)?;
    let luma = decoded.to_luma8();
    let (width, height) = luma.dimensions();
    Ok(GreyImage::from_pixels(
        width as usize,
        height as usize,
        luma.into_raw(),
    )?)
}
