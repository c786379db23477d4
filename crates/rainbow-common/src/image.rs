//! Single-channel 8-bit rasters.
//!
//! Every stage artifact of the analysis is written as a greyscale image with
//! the same dimensions as the forecast grid, so pixel (x, y) is grid cell
//! (column, row).

use crate::{CommonError, CommonResult};

/// A greyscale image, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreyImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GreyImage {
    /// Create an image with every pixel set to `value`.
    pub fn new(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    /// Wrap existing pixel data.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u8>) -> CommonResult<Self> {
        if pixels.len() != width * height {
            return Err(CommonError::size_mismatch(width * height, pixels.len()));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    /// Apply a function to every pixel.
    pub fn map(&self, f: impl Fn(u8) -> u8) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|&p| f(p)).collect(),
        }
    }

    /// Photographic negative.
    pub fn invert(&self) -> Self {
        self.map(|p| 255 - p)
    }

    /// Mean intensity rounded to the nearest integer.
    pub fn mean(&self) -> u8 {
        if self.pixels.is_empty() {
            return 0;
        }
        let sum: u64 = self.pixels.iter().map(|&p| p as u64).sum();
        (sum as f64 / self.pixels.len() as f64 + 0.5) as u8
    }

    /// Paste `src` over this image using `mask` as a per-pixel opacity.
    ///
    /// A mask value of 255 copies the source pixel, 0 keeps the destination,
    /// anything in between blends linearly.
    pub fn paste_masked(&mut self, src: &GreyImage, mask: &GreyImage) -> CommonResult<()> {
        self.check_same_size(src)?;
        self.check_same_size(mask)?;

        for ((dst, &s), &m) in self
            .pixels
            .iter_mut()
            .zip(src.pixels.iter())
            .zip(mask.pixels.iter())
        {
            *dst = match m {
                0 => *dst,
                255 => s,
                m => {
                    let blended = (s as u32 * m as u32 + *dst as u32 * (255 - m as u32) + 127) / 255;
                    blended as u8
                }
            };
        }
        Ok(())
    }

    fn check_same_size(&self, other: &GreyImage) -> CommonResult<()> {
        if self.width != other.width || self.height != other.height {
            return Err(CommonError::InvalidGrid(format!(
                "image size {}x{} does not match {}x{}",
                other.width, other.height, self.width, self.height
            )));
        }
        Ok(())
    }
}
