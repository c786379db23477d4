//! PNG encoding for single-channel rasters.
//!
//! Supports two encoding modes:
//! - **Greyscale (color type 0)**: masks and the greyscale cloud field.
//! - **Grey + alpha (color type 4)**: the alpha cloud overlay.
//!
//! Both use 8-bit samples, no filtering and zlib compression.

use std::io::Write;

use crate::{RenderError, RenderResult};

/// PNG file signature
const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const COLOR_TYPE_GREY: u8 = 0;
const COLOR_TYPE_GREY_ALPHA: u8 = 4;

/// Create a greyscale PNG (color type 0), one byte per pixel.
pub fn create_png_grey(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    create_png_with_channels(pixels, width, height, COLOR_TYPE_GREY, 1)
}

/// Create a grey+alpha PNG (color type 4) from interleaved (L, A) bytes.
pub fn create_png_grey_alpha(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    create_png_with_channels(pixels, width, height, COLOR_TYPE_GREY_ALPHA, 2)
}

fn create_png_with_channels(
    pixels: &[u8],
    width: usize,
    height: usize,
    color_type: u8,
    channels: usize,
) -> RenderResult<Vec<u8>> {
    if pixels.len() != width * height * channels {
        return Err(RenderError::InvalidDimensions {
            width,
            height,
            len: pixels.len(),
        });
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&PNG_SIGNATURE);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color_type);
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat(pixels, width * channels, height)
        .map_err(|e| RenderError::Compression(e.to_string()))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let crc_data = [chunk_type.as_slice(), data].concat();
    let crc = crc32_checksum(&crc_data);
    png.extend_from_slice(&crc.to_be_bytes());
}

/// Deflate scanlines for the IDAT chunk.
fn deflate_idat(data: &[u8], row_bytes: usize, height: usize) -> std::io::Result<Vec<u8>> {
    // Add filter byte (0 = no filter) to each scanline
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

/// Simple CRC32 checksum (PNG-style)
fn crc32_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ihdr_fields() {
        let png = create_png_grey(&[0, 255, 255, 0, 0, 255], 3, 2).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        // length(4) + "IHDR"(4) then width, height, depth, color type
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 3);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 2);
        assert_eq!(png[24], 8);
        assert_eq!(png[25], COLOR_TYPE_GREY);
    }

    #[test]
    fn test_grey_alpha_color_type() {
        let png = create_png_grey_alpha(&[255, 0, 255, 128], 2, 1).unwrap();
        assert_eq!(png[25], COLOR_TYPE_GREY_ALPHA);
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert!(matches!(
            create_png_grey(&[0; 5], 3, 2),
            Err(RenderError::InvalidDimensions { len: 5, .. })
        ));
        assert!(create_png_grey_alpha(&[0; 3], 2, 1).is_err());
    }

    #[test]
    fn test_chunk_crc() {
        let mut png = Vec::new();
        write_chunk(&mut png, b"IEND", &[]);
        // Well-known CRC of an empty IEND chunk
        assert_eq!(&png[8..12], &[0xAE, 0x42, 0x60, 0x82]);
    }
}
