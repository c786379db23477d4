//! Cloud/moisture classification.
//!
//! Precipitable water is mapped to a greyscale field (wetter is darker), the
//! contrast is pushed hard and the result is thresholded so that only the
//! densest moisture cores remain as candidate rain clouds.

use rainbow_common::{CommonResult, GreyImage, PixelMask, RasterGrid};

/// Grey level drop per unit of precipitable water.
pub const GREYSCALE_SLOPE: f32 = 3.0;

/// Alpha gain per unit of precipitable water in the overlay image.
pub const ALPHA_SLOPE: f32 = 6.0;

/// Contrast enhancement factor applied before thresholding.
pub const CONTRAST_FACTOR: f32 = 80.0;

/// Enhanced grey levels above this are clear sky.
pub const CLEAR_THRESHOLD: u8 = 191;

/// Grey value of a cloud cell in the thresholded image.
pub const CLOUD: u8 = 0;
/// Grey value of a clear cell in the thresholded image.
pub const CLEAR: u8 = 255;

/// Tunable classifier parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudClassifier {
    pub greyscale_slope: f32,
    pub alpha_slope: f32,
    pub contrast: f32,
    pub threshold: u8,
}

impl Default for CloudClassifier {
    fn default() -> Self {
        Self {
            greyscale_slope: GREYSCALE_SLOPE,
            alpha_slope: ALPHA_SLOPE,
            contrast: CONTRAST_FACTOR,
            threshold: CLEAR_THRESHOLD,
        }
    }
}

/// Everything the classifier produces for one raster.
#[derive(Debug, Clone)]
pub struct Classification {
    /// `255 - k * value`, clamped
    pub greyscale: GreyImage,
    /// Overlay opacity, `k * value` clamped
    pub alpha: GreyImage,
    /// Two-valued image: [`CLOUD`] or [`CLEAR`]
    pub thresholded: GreyImage,
    /// Set where a cloud core was found
    pub clouds: PixelMask,
}

impl Classification {
    /// The greyscale field with clear-sky cells painted white.
    pub fn greymasked(&self) -> CommonResult<GreyImage> {
        let mut out = self.greyscale.clone();
        // The thresholded image is its own paste mask: 255 copies white.
        out.paste_masked(&self.thresholded, &self.thresholded)?;
        Ok(out)
    }
}

impl CloudClassifier {
    pub fn greyscale_value(&self, value: f32) -> u8 {
        clamp_u8((255.0 - value * self.greyscale_slope).trunc())
    }

    pub fn alpha_value(&self, value: f32) -> u8 {
        clamp_u8((value * self.alpha_slope).trunc())
    }

    /// Run the classifier over a raster.
    pub fn classify(&self, grid: &RasterGrid) -> CommonResult<Classification> {
        let (w, h) = (grid.width(), grid.height());

        let greyscale = GreyImage::from_pixels(
            w,
            h,
            grid.data().iter().map(|&v| self.greyscale_value(v)).collect(),
        )?;
        let alpha = GreyImage::from_pixels(
            w,
            h,
            grid.data().iter().map(|&v| self.alpha_value(v)).collect(),
        )?;

        let enhanced = enhance_contrast(&greyscale, self.contrast);
        let threshold = self.threshold;
        let thresholded = enhanced.map(|p| if p > threshold { CLEAR } else { CLOUD });
        let clouds = PixelMask::from_image(&thresholded, CLOUD);

        tracing::debug!(
            cloud_cells = clouds.count(),
            total = w * h,
            "Classified moisture raster"
        );

        Ok(Classification {
            greyscale,
            alpha,
            thresholded,
            clouds,
        })
    }
}

/// Scale each pixel's distance from the image mean by `factor`.
///
/// The mean is rounded to an integer first and results are truncated then
/// clamped to 0..=255.
pub fn enhance_contrast(image: &GreyImage, factor: f32) -> GreyImage {
    let mean = image.mean() as f32;
    image.map(|p| clamp_u8((mean + factor * (p as f32 - mean)).trunc()))
}

fn clamp_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainbow_common::GridSpec;

    fn grid(values: Vec<f32>, nx: usize, ny: usize) -> RasterGrid {
        RasterGrid::new(GridSpec::new(nx, ny, 0.5, -0.5, 0.0, 90.0), values).unwrap()
    }

    #[test]
    fn test_greyscale_is_decreasing_and_clamped() {
        let c = CloudClassifier::default();
        assert_eq!(c.greyscale_value(0.0), 255);
        assert_eq!(c.greyscale_value(10.0), 225);
        assert_eq!(c.greyscale_value(10.4), 223);
        assert_eq!(c.greyscale_value(100.0), 0);
        assert_eq!(c.greyscale_value(-5.0), 255);
    }

    #[test]
    fn test_alpha_value() {
        let c = CloudClassifier::default();
        assert_eq!(c.alpha_value(0.0), 0);
        assert_eq!(c.alpha_value(10.0), 60);
        assert_eq!(c.alpha_value(60.0), 255);
    }

    #[test]
    fn test_contrast_pushes_away_from_mean() {
        let img = GreyImage::from_pixels(3, 1, vec![100, 110, 120]).unwrap();
        let out = enhance_contrast(&img, 80.0);
        assert_eq!(out.pixels(), &[0, 110, 255]);
    }

    #[test]
    fn test_uniform_raster_has_no_clouds() {
        let c = CloudClassifier::default();
        let result = c.classify(&grid(vec![30.0; 12], 4, 3)).unwrap();
        // Every pixel equals the mean, so contrast leaves it at 165 < 191.
        // A featureless field is therefore all cloud.
        assert_eq!(result.clouds.count(), 12);

        let result = c.classify(&grid(vec![0.0; 12], 4, 3)).unwrap();
        assert!(result.clouds.is_empty());
    }

    #[test]
    fn test_single_wet_cell_is_the_only_cloud() {
        let mut values = vec![5.0; 20];
        values[7] = 60.0;
        let result = CloudClassifier::default().classify(&grid(values, 5, 4)).unwrap();

        assert_eq!(result.clouds.count(), 1);
        assert!(result.clouds.get(2, 1));
        assert_eq!(result.thresholded.get(2, 1), Some(CLOUD));
        assert_eq!(result.thresholded.get(0, 0), Some(CLEAR));
    }

    #[test]
    fn test_greymasked_whitens_clear_sky() {
        let mut values = vec![5.0; 20];
        values[7] = 60.0;
        let result = CloudClassifier::default().classify(&grid(values, 5, 4)).unwrap();
        let masked = result.greymasked().unwrap();

        assert_eq!(masked.get(0, 0), Some(255));
        assert_eq!(masked.get(2, 1), result.greyscale.get(2, 1));
    }

    #[test]
    fn test_greymasked_rejects_mismatched_threshold() {
        let mut values = vec![5.0; 20];
        values[7] = 60.0;
        let mut result = CloudClassifier::default().classify(&grid(values, 5, 4)).unwrap();
        result.thresholded = GreyImage::new(4, 4, CLEAR);

        assert!(result.greymasked().is_err());
    }
}
