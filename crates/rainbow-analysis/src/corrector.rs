//! Antisolar geometry correction.
//!
//! A rainbow shows up opposite the sun, about 42° from the antisolar point.
//! To approximate that in raster space the cloud mask is rolled so the
//! subsolar column sits in the middle of the image, barrel-distorted about
//! the subsolar point, and composited with the undistorted mask. What is left
//! is clear sky with cloud at the right angular distance. The result is then
//! rolled back and limited to cells where the sun is low enough.

use rainbow_common::PixelMask;

use crate::artifacts::SlugArtifacts;
use crate::distortion::BarrelParams;
use crate::solar::SolarField;
use crate::tools::{RasterTool, Transform};
use crate::{AnalysisError, AnalysisResult};

/// Extruded pixels darker than this hold distorted cloud.
const EXTRUDED_CLOUD_BELOW: u8 = 128;

/// Outcome of the geometry correction for one forecast.
#[derive(Debug, Clone)]
pub struct Correction {
    /// Subsolar cell as (column, row) after the solar column offset
    pub subsolar: (usize, usize),
    /// Columns the cloud mask was rolled right to centre the sun
    pub translate_x: isize,
    /// Cells where the sun is between the horizon and 42°
    pub sun_mask: PixelMask,
    /// Rainbow-favourable cells in grid coordinates
    pub favourable: PixelMask,
}

pub struct GeometryCorrector<'a> {
    distorter: &'a dyn RasterTool,
    column_offset: isize,
}

impl<'a> GeometryCorrector<'a> {
    pub fn new(distorter: &'a dyn RasterTool, column_offset: isize) -> Self {
        Self {
            distorter,
            column_offset,
        }
    }

    /// Run the correction.
    ///
    /// Writes the centred cloud mask and has the distorter produce the
    /// extruded mask inside the slug directory, then reads it back.
    pub fn correct(
        &self,
        clouds: &PixelMask,
        solar: &SolarField,
        artifacts: &SlugArtifacts,
    ) -> AnalysisResult<Correction> {
        let (w, h) = (clouds.width(), clouds.height());
        if solar.width() != w || solar.height() != h {
            return Err(AnalysisError::DataIntegrity(format!(
                "solar field {}x{} does not match cloud mask {}x{}",
                solar.width(),
                solar.height(),
                w,
                h
            )));
        }

        let sun_mask = solar.eligibility(self.column_offset);
        let (sun_x, sun_y) = solar.subsolar(self.column_offset);
        let middle = w / 2;
        let translate_x = middle as isize - sun_x as isize;
        tracing::debug!(sun_x, sun_y, translate_x, "Centring cloud mask on the subsolar point");

        // Cloud is white in the distortion input.
        let centred = clouds.offset_x(translate_x);
        renderer::save_grey(&artifacts.cloud_mask(), &centred.to_image(255, 0))?;

        let params = BarrelParams::rainbow(middle as f64, sun_y as f64);
        self.distorter.transform(
            &artifacts.cloud_mask(),
            &artifacts.cloud_mask_extruded(),
            &Transform::Barrel(params),
        )?;

        let extruded = renderer::load_grey(&artifacts.cloud_mask_extruded())?;
        if extruded.width() != w || extruded.height() != h {
            return Err(AnalysisError::DataIntegrity(format!(
                "extruded mask is {}x{}, expected {}x{}",
                extruded.width(),
                extruded.height(),
                w,
                h
            )));
        }
        let distorted_cloud = PixelMask::from_bits(
            w,
            h,
            extruded
                .pixels()
                .iter()
                .map(|&p| p < EXTRUDED_CLOUD_BELOW)
                .collect(),
        )?;

        // Clear here, cloud at the antisolar distance.
        let centred_favourable = centred.not().and(&distorted_cloud)?;
        let favourable = centred_favourable
            .offset_x(-translate_x)
            .and(&sun_mask)?;

        Ok(Correction {
            subsolar: (sun_x, sun_y),
            translate_x,
            sun_mask,
            favourable,
        })
    }
}
