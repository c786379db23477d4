//! End-to-end analysis of one forecast slug.

use std::path::{Path, PathBuf};

use rainbow_common::{ForecastSlug, PixelMask};

use crate::artifacts::{write_atomic, SlugArtifacts};
use crate::classifier::CloudClassifier;
use crate::corrector::GeometryCorrector;
use crate::raster::load_grib2json;
use crate::solar::SolarField;
use crate::tools::{Toolset, Transform};
use crate::{AnalysisError, AnalysisResult};

/// Grey value of a rainbow-favourable cell in the final mask.
pub const FAVOURABLE: u8 = 0;
/// Grey value of every other cell in the final mask.
pub const UNFAVOURABLE: u8 = 255;

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Columns the solar mask and subsolar column are shifted right by
    pub solar_column_offset: isize,
    pub classifier: CloudClassifier,
}

/// Summary of a completed analysis.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub slug: ForecastSlug,
    pub subsolar: (usize, usize),
    pub cloud_cells: usize,
    pub eligible_cells: usize,
    pub favourable_cells: usize,
    pub final_mask: PathBuf,
}

/// Produce every artifact for `slug` and the final rainbow mask.
///
/// Returns [`AnalysisError::NotReady`] when the raw raster has not arrived.
/// The final mask is written last and atomically, so its presence means the
/// analysis completed.
pub fn analyze_slug(
    data_dir: &Path,
    slug: ForecastSlug,
    tools: &Toolset,
    options: &AnalysisOptions,
) -> AnalysisResult<AnalysisReport> {
    let artifacts = SlugArtifacts::new(data_dir, slug);

    let grib = artifacts.raw_grib();
    if !grib.exists() {
        return Err(AnalysisError::NotReady(grib));
    }

    // A leftover mask from an earlier run must not outlive a failed rerun.
    let final_mask = artifacts.final_mask();
    if final_mask.exists() {
        std::fs::remove_file(&final_mask)?;
    }

    let json = artifacts.raster_json();
    if json.exists() {
        tracing::debug!(slug = %slug, "grib2json output found, skipping conversion");
    } else {
        tracing::debug!(slug = %slug, tool = tools.converter.name(), "Converting GRIB to JSON");
        tools
            .converter
            .transform(&grib, &json, &Transform::GribToJson)?;
        if !json.exists() {
            return Err(AnalysisError::external_tool(
                tools.converter.name(),
                format!("reported success but wrote no {}", json.display()),
            ));
        }
    }

    let grid = load_grib2json(&json)?;

    // Classifier
    let classification = options.classifier.classify(&grid)?;
    renderer::save_grey(&artifacts.clouds_greyscale(), &classification.greyscale)?;
    let opaque = rainbow_common::GreyImage::new(grid.width(), grid.height(), 255);
    renderer::save_grey_alpha(&artifacts.clouds_alpha(), &opaque, &classification.alpha)?;
    renderer::save_grey(
        &artifacts.cloud_mask_not_inverted(),
        &classification.thresholded,
    )?;

    // Solar mask
    tracing::debug!(slug = %slug, at = %slug.datetime(), "Computing solar altitudes");
    let solar = SolarField::compute(grid.spec(), slug.datetime());

    // Geometry correction
    let corrector = GeometryCorrector::new(tools.distorter.as_ref(), options.solar_column_offset);
    let correction = corrector.correct(&classification.clouds, &solar, &artifacts)?;
    renderer::save_grey(&artifacts.sun_mask(), &correction.sun_mask.to_image(255, 0))?;

    let greymasked = whiten_ineligible(classification.greymasked()?, &correction.sun_mask)?;
    renderer::save_grey(&artifacts.clouds_greymasked(), &greymasked)?;

    let image = correction.favourable.to_image(FAVOURABLE, UNFAVOURABLE);
    let bytes = renderer::png::create_png_grey(image.pixels(), image.width(), image.height())?;
    write_atomic(&final_mask, &bytes)?;

    let report = AnalysisReport {
        slug,
        subsolar: correction.subsolar,
        cloud_cells: classification.clouds.count(),
        eligible_cells: correction.sun_mask.count(),
        favourable_cells: correction.favourable.count(),
        final_mask,
    };
    tracing::info!(
        slug = %slug,
        cloud_cells = report.cloud_cells,
        eligible_cells = report.eligible_cells,
        favourable_cells = report.favourable_cells,
        "Analysis complete"
    );
    Ok(report)
}

fn whiten_ineligible(
    mut image: rainbow_common::GreyImage,
    sun_mask: &PixelMask,
) -> AnalysisResult<rainbow_common::GreyImage> {
    let ineligible = sun_mask.not().to_image(255, 0);
    image.paste_masked(&ineligible, &ineligible)?;
    Ok(image)
}

/// Read a final mask back as the set of favourable cells.
pub fn load_final_mask(path: &Path) -> AnalysisResult<PixelMask> {
    let image = renderer::load_grey(path).map_err(|e| match e {
        renderer::RenderError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            AnalysisError::NotReady(path.to_path_buf())
        }
        other => AnalysisError::DataIntegrity(format!(
            "unreadable mask {}: {}",
            path.display(),
            other
        )),
    })?;
    Ok(PixelMask::from_image(&image, FAVOURABLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_grib_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let slug = ForecastSlug::parse("2016092812").unwrap();
        std::fs::create_dir_all(dir.path().join("2016092812")).unwrap();

        let err = analyze_slug(
            dir.path(),
            slug,
            &Toolset::native("grib2json"),
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::NotReady(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_load_final_mask_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.png");
        assert!(matches!(
            load_final_mask(&missing),
            Err(AnalysisError::NotReady(_))
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(
            load_final_mask(&garbage),
            Err(AnalysisError::DataIntegrity(_))
        ));
    }
}
