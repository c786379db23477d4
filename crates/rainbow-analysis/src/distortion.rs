//! Barrel (radial) distortion.
//!
//! Same model as ImageMagick's `-distort Barrel "A B C D X Y"`: for every
//! destination pixel at radius `r` from the centre, the source is sampled at
//! radius `r * (A r³ + B r² + C r + D)`. Radii are normalized to half the
//! smaller image dimension. Sampling is nearest-neighbour and anything outside
//! the source image reads as black.

use std::fmt;

use rainbow_common::GreyImage;

/// Coefficients approximating the angular falloff to the 42° rainbow ring
/// around the antisolar point.
pub const RAINBOW_COEFFICIENTS: [f64; 4] = [0.0, 0.0, 0.025, 0.975];

/// Parameters of a barrel distortion centred at (`center_x`, `center_y`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrelParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl BarrelParams {
    /// The rainbow coefficients centred on a given pixel.
    pub fn rainbow(center_x: f64, center_y: f64) -> Self {
        let [a, b, c, d] = RAINBOW_COEFFICIENTS;
        Self {
            a,
            b,
            c,
            d,
            center_x,
            center_y,
        }
    }

    /// Scale factor for a normalized radius.
    pub fn factor(&self, r: f64) -> f64 {
        ((self.a * r + self.b) * r + self.c) * r + self.d
    }

    /// Source pixel sampled by destination pixel (x, y) of a `width` x
    /// `height` image, or `None` when the sample falls outside.
    pub fn source_pixel(&self, x: usize, y: usize, width: usize, height: usize) -> Option<(usize, usize)> {
        let half = width.min(height) as f64 / 2.0;
        if half <= 0.0 {
            return None;
        }

        let dx = x as f64 + 0.5 - self.center_x;
        let dy = y as f64 + 0.5 - self.center_y;
        let r = (dx * dx + dy * dy).sqrt() / half;
        let f = self.factor(r);

        let sx = (self.center_x + dx * f).floor();
        let sy = (self.center_y + dy * f).floor();
        if sx < 0.0 || sy < 0.0 || sx >= width as f64 || sy >= height as f64 {
            return None;
        }
        Some((sx as usize, sy as usize))
    }
}

/// Formats as the ImageMagick argument string `"A B C D X Y"`.
impl fmt::Display for BarrelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} {:?} {:?} {} {}",
            self.a, self.b, self.c, self.d, self.center_x, self.center_y
        )
    }
}

/// Apply the distortion with a black virtual-pixel background.
pub fn barrel_distort(input: &GreyImage, params: &BarrelParams) -> GreyImage {
    let (w, h) = (input.width(), input.height());
    let mut out = GreyImage::new(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            if let Some((sx, sy)) = params.source_pixel(x, y, w, h) {
                out.set(x, y, input.get(sx, sy).unwrap_or(0));
            }
        }
    }
    out
}
