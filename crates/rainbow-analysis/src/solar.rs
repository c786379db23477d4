//! Solar altitude field and rainbow eligibility mask.
//!
//! Solar position follows the NOAA low-precision formulas (declination and
//! equation of time from the Julian century). All cells share one instant,
//! so the ephemeris is computed once per field.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};
use rainbow_common::{CommonError, CommonResult, GridSpec, PixelMask};
use rayon::prelude::*;

const DEG: f64 = PI / 180.0;

/// A rainbow is only visible while the sun is below this altitude (degrees).
pub const RAINBOW_MAX_SUN_ALTITUDE: f64 = 42.0;

/// Sun-dependent quantities that are the same for every cell at one instant.
#[derive(Debug, Clone, Copy)]
pub struct Ephemeris {
    /// Solar declination in degrees
    pub declination: f64,
    /// Equation of time in minutes
    pub equation_of_time: f64,
    /// Minutes past 00:00 UTC
    pub utc_minutes: f64,
}

impl Ephemeris {
    pub fn at(when: DateTime<Utc>) -> Self {
        let t = julian_century(julian_date(when));
        let utc_minutes =
            when.hour() as f64 * 60.0 + when.minute() as f64 + when.second() as f64 / 60.0;
        Self {
            declination: solar_declination(t),
            equation_of_time: equation_of_time(t),
            utc_minutes,
        }
    }

    /// Solar altitude in degrees above the horizon at (lat, lon).
    pub fn altitude(&self, lat: f64, lon: f64) -> f64 {
        let solar_time = self.utc_minutes + self.equation_of_time + 4.0 * lon;
        let hour_angle = solar_time / 4.0 - 180.0;

        let lat_r = lat * DEG;
        let decl_r = self.declination * DEG;
        let sin_alt =
            lat_r.sin() * decl_r.sin() + lat_r.cos() * decl_r.cos() * (hour_angle * DEG).cos();
        sin_alt.clamp(-1.0, 1.0).asin() / DEG
    }
}

/// Solar altitude in degrees for one position and instant.
pub fn solar_altitude(when: DateTime<Utc>, lat: f64, lon: f64) -> f64 {
    Ephemeris::at(when).altitude(lat, lon)
}

fn julian_date(dt: DateTime<Utc>) -> f64 {
    let y = dt.year() as f64;
    let m = dt.month() as f64;
    let d = dt.day() as f64;
    let h = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;

    let (y2, m2) = if m <= 2.0 { (y - 1.0, m + 12.0) } else { (y, m) };

    let a = (y2 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y2 + 4716.0)).floor() + (30.6001 * (m2 + 1.0)).floor() + d + h / 24.0 + b - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

fn sun_mean_longitude(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0)
}

fn sun_mean_anomaly(t: f64) -> f64 {
    (357.52911 + t * (35999.05029 - t * 0.0001537)).rem_euclid(360.0)
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    let center = m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289;
    let omega = 125.04 - 1934.136 * t;
    sun_mean_longitude(t) + center - 0.00569 - 0.00478 * (omega * DEG).sin()
}

fn obliquity_corrected(t: f64) -> f64 {
    let mean = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let omega = 125.04 - 1934.136 * t;
    mean + 0.00256 * (omega * DEG).cos()
}

fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let lambda = sun_apparent_longitude(t) * DEG;
    (e.sin() * lambda.sin()).asin() / DEG
}

fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let l0 = sun_mean_longitude(t) * DEG;
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t) * DEG;
    let y = (e / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq / DEG
}

/// One solar altitude per grid cell, row-major like the raster it shadows.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarField {
    width: usize,
    height: usize,
    altitudes: Vec<f64>,
}

impl SolarField {
    /// Compute the field for every cell of `spec` at `when`.
    pub fn compute(spec: &GridSpec, when: DateTime<Utc>) -> Self {
        let ephemeris = Ephemeris::at(when);
        let altitudes = (0..spec.len())
            .into_par_iter()
            .map(|idx| {
                let (i, j) = spec.cell_of(idx);
                let lon = spec.first_x + i as f64 * spec.dx;
                let lat = spec.first_y + j as f64 * spec.dy;
                ephemeris.altitude(lat, lon)
            })
            .collect();

        Self {
            width: spec.nx,
            height: spec.ny,
            altitudes,
        }
    }

    /// Wrap precomputed altitudes.
    pub fn from_altitudes(width: usize, height: usize, altitudes: Vec<f64>) -> CommonResult<Self> {
        if width == 0 || height == 0 {
            return Err(CommonError::InvalidGrid("empty solar field".into()));
        }
        if altitudes.len() != width * height {
            return Err(CommonError::size_mismatch(width * height, altitudes.len()));
        }
        Ok(Self {
            width,
            height,
            altitudes,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn altitudes(&self) -> &[f64] {
        &self.altitudes
    }

    /// Cells where `0 < altitude < 42`, shifted right by `column_offset`.
    pub fn eligibility(&self, column_offset: isize) -> PixelMask {
        let bits = self
            .altitudes
            .iter()
            .map(|&alt| alt > 0.0 && alt < RAINBOW_MAX_SUN_ALTITUDE)
            .collect();
        PixelMask::from_bits(self.width, self.height, bits)
            .map(|mask| mask.offset_x(column_offset))
            .unwrap_or_else(|_| PixelMask::new(self.width, self.height, false))
    }

    /// Cell directly under the sun as (column, row), using the first
    /// maximum in row-major order. The column gets the same shift as
    /// [`eligibility`](Self::eligibility).
    pub fn subsolar(&self, column_offset: isize) -> (usize, usize) {
        let mut best = 0;
        for (idx, &alt) in self.altitudes.iter().enumerate() {
            if alt > self.altitudes[best] {
                best = idx;
            }
        }
        let col = (best % self.width) as isize;
        let row = best / self.width;
        let x = (col + column_offset).rem_euclid(self.width as isize) as usize;
        (x, row)
    }
}
