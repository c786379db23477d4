//! Boolean rasters produced by the analysis stages.

use crate::{CommonError, CommonResult, GreyImage};

/// A two-valued field aligned with a forecast grid.
///
/// Each stage yields a new mask; masks are never shared mutably between
/// stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl PixelMask {
    /// Create a mask with every cell set to `value`.
    pub fn new(width: usize, height: usize, value: bool) -> Self {
        Self {
            width,
            height,
            bits: vec![value; width * height],
        }
    }

    pub fn from_bits(width: usize, height: usize, bits: Vec<bool>) -> CommonResult<Self> {
        if bits.len() != width * height {
            return Err(CommonError::size_mismatch(width * height, bits.len()));
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Cells equal to `foreground` become set.
    pub fn from_image(image: &GreyImage, foreground: u8) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            bits: image.pixels().iter().map(|&p| p == foreground).collect(),
        }
    }

    /// Render the mask, painting set cells with `set` and the rest with `unset`.
    pub fn to_image(&self, set: u8, unset: u8) -> GreyImage {
        let mut image = GreyImage::new(self.width, self.height, unset);
        for (x, y) in self.iter_set() {
            image.set(x, y, set);
        }
        image
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = value;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Iterate (x, y) of every set cell, row by row.
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(move |(i, _)| (i % width, i / width))
    }

    pub fn not(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().map(|&b| !b).collect(),
        }
    }

    /// Cell-wise AND of two masks of the same size.
    pub fn and(&self, other: &PixelMask) -> CommonResult<Self> {
        if self.width != other.width || self.height != other.height {
            return Err(CommonError::InvalidGrid(format!(
                "mask size {}x{} does not match {}x{}",
                other.width, other.height, self.width, self.height
            )));
        }
        Ok(Self {
            width: self.width,
            height: self.height,
            bits: self
                .bits
                .iter()
                .zip(other.bits.iter())
                .map(|(&a, &b)| a && b)
                .collect(),
        })
    }

    /// Shift every row `dx` cells to the right, wrapping around the globe.
    pub fn offset_x(&self, dx: isize) -> Self {
        if self.width == 0 {
            return self.clone();
        }
        let w = self.width as isize;
        let shift = dx.rem_euclid(w) as usize;
        let mut bits = vec![false; self.bits.len()];
        for y in 0..self.height {
            let row = &self.bits[y * self.width..(y + 1) * self.width];
            for (x, &b) in row.iter().enumerate() {
                bits[y * self.width + (x + shift) % self.width] = b;
            }
        }
        Self {
            width: self.width,
            height: self.height,
            bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_wraps_around() {
        let mut mask = PixelMask::new(4, 1, false);
        mask.set(3, 0, true);

        let shifted = mask.offset_x(2);
        assert!(shifted.get(1, 0));
        assert_eq!(shifted.count(), 1);

        let back = shifted.offset_x(-2);
        assert_eq!(back, mask);
    }

    #[test]
    fn test_and_requires_same_size() {
        let a = PixelMask::new(2, 2, true);
        let b = PixelMask::new(3, 2, true);
        assert!(a.and(&b).is_err());

        let mut c = PixelMask::new(2, 2, false);
        c.set(1, 1, true);
        let both = a.and(&c).unwrap();
        assert_eq!(both.iter_set().collect::<Vec<_>>(), vec![(1, 1)]);
    }

    #[test]
    fn test_image_conversion() {
        let img = GreyImage::from_pixels(3, 1, vec![0, 255, 0]).unwrap();
        let mask = PixelMask::from_image(&img, 0);
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.to_image(0, 255), img);
    }

    #[test]
    fn test_to_image_keeps_dimensions_and_cells() {
        let mut mask = PixelMask::new(4, 3, false);
        mask.set(3, 0, true);
        mask.set(0, 2, true);

        let img = mask.to_image(7, 200);
        assert_eq!((img.width(), img.height()), (4, 3));
        assert_eq!(img.get(3, 0), Some(7));
        assert_eq!(img.get(0, 2), Some(7));
        assert_eq!(img.pixels().iter().filter(|&&p| p == 200).count(), 10);
        assert_eq!(PixelMask::from_image(&img, 7), mask);
    }
}
