//! Synthetic data generators.
//!
//! These create predictable moisture and solar fields so that the expected
//! classifier and corrector output can be worked out by hand.

/// Moisture typical of clear sky: classifies as no cloud anywhere.
pub const DRY: f32 = 5.0;

/// Moisture well above the cloud threshold against a [`DRY`] background.
pub const SATURATED: f32 = 60.0;

/// A grid with the same moisture everywhere.
///
/// # Example
///
/// ```
/// use test_utils::uniform_moisture;
///
/// let data = uniform_moisture(4, 3, 2.5);
/// assert_eq!(data.len(), 12);
/// assert!(data.iter().all(|&v| v == 2.5));
/// ```
pub fn uniform_moisture(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// A [`DRY`] grid with [`SATURATED`] moisture at the given (column, row) cells.
///
/// Cells outside the grid are ignored.
///
/// # Example
///
/// ```
/// use test_utils::{moisture_with_clouds, SATURATED};
///
/// let data = moisture_with_clouds(4, 3, &[(1, 2)]);
/// assert_eq!(data[2 * 4 + 1], SATURATED);
/// ```
pub fn moisture_with_clouds(width: usize, height: usize, cells: &[(usize, usize)]) -> Vec<f32> {
    let mut data = uniform_moisture(width, height, DRY);
    for &(col, row) in cells {
        if col < width && row < height {
            data[row * width + col] = SATURATED;
        }
    }
    data
}

/// A solar altitude field with `base` everywhere except `peak` at the
/// subsolar cell.
pub fn altitudes_with_peak(
    width: usize,
    height: usize,
    subsolar: (usize, usize),
    base: f64,
    peak: f64,
) -> Vec<f64> {
    let mut alts = vec![base; width * height];
    let (col, row) = subsolar;
    if col < width && row < height {
        alts[row * width + col] = peak;
    }
    alts
}
