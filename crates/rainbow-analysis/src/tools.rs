//! External raster helpers behind one capability interface.
//!
//! Two jobs go through here: converting the raw GRIB file to grib2json, and
//! barrel-distorting the centred cloud mask. Both default to command-line
//! tools (`grib2json`, ImageMagick `convert`); the distortion also has a
//! native implementation.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::distortion::{barrel_distort, BarrelParams};
use crate::{AnalysisError, AnalysisResult};

/// A file-to-file raster operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// GRIB2 message to grib2json output
    GribToJson,
    /// Barrel distortion followed by negation, black virtual pixels
    Barrel(BarrelParams),
}

/// Something that can carry out a [`Transform`] from `input` to `output`.
pub trait RasterTool: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, input: &Path, output: &Path, op: &Transform) -> AnalysisResult<()>;
}

fn unsupported(tool: &dyn RasterTool, op: &Transform) -> AnalysisError {
    AnalysisError::external_tool(tool.name(), format!("unsupported operation {:?}", op))
}

fn run(tool: &str, command: &mut Command) -> AnalysisResult<()> {
    tracing::debug!(tool, command = ?command, "Running external tool");
    let output = command
        .output()
        .map_err(|e| AnalysisError::external_tool(tool, format!("failed to start: {}", e)))?;

    if !output.status.success() {
        return Err(AnalysisError::external_tool(
            tool,
            format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(())
}

/// The `grib2json` command-line converter.
#[derive(Debug, Clone)]
pub struct Grib2Json {
    binary: PathBuf,
}

impl Grib2Json {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RasterTool for Grib2Json {
    fn name(&self) -> &str {
        "grib2json"
    }

    fn transform(&self, input: &Path, output: &Path, op: &Transform) -> AnalysisResult<()> {
        match op {
            Transform::GribToJson => run(
                self.name(),
                Command::new(&self.binary)
                    .arg("-d")
                    .arg("-n")
                    .arg("-o")
                    .arg(output)
                    .arg(input),
            ),
            other => Err(unsupported(self, other)),
        }
    }
}

/// ImageMagick `convert`.
#[derive(Debug, Clone)]
pub struct ImageMagickBarrel {
    binary: PathBuf,
}

impl ImageMagickBarrel {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RasterTool for ImageMagickBarrel {
    fn name(&self) -> &str {
        "convert"
    }

    fn transform(&self, input: &Path, output: &Path, op: &Transform) -> AnalysisResult<()> {
        match op {
            Transform::Barrel(params) => run(
                self.name(),
                Command::new(&self.binary)
                    .arg(input)
                    .args(["-virtual-pixel", "black"])
                    .args(["-filter", "point"])
                    .args(["-interpolate", "NearestNeighbor"])
                    .args(["-distort", "Barrel"])
                    .arg(params.to_string())
                    .arg("+antialias")
                    .arg("-negate")
                    .arg(output),
            ),
            other => Err(unsupported(self, other)),
        }
    }
}

/// In-process barrel distortion.
#[derive(Debug, Clone, Default)]
pub struct NativeBarrel;

impl RasterTool for NativeBarrel {
    fn name(&self) -> &str {
        "native-barrel"
    }

    fn transform(&self, input: &Path, output: &Path, op: &Transform) -> AnalysisResult<()> {
        match op {
            Transform::Barrel(params) => {
                let image = renderer::load_grey(input)?;
                let distorted = barrel_distort(&image, params).invert();
                renderer::save_grey(output, &distorted)?;
                Ok(())
            }
            other => Err(unsupported(self, other)),
        }
    }
}

/// The helpers used by one analysis run.
#[derive(Clone)]
pub struct Toolset {
    pub converter: Arc<dyn RasterTool>,
    pub distorter: Arc<dyn RasterTool>,
}

impl Toolset {
    pub fn new(converter: Arc<dyn RasterTool>, distorter: Arc<dyn RasterTool>) -> Self {
        Self {
            converter,
            distorter,
        }
    }

    /// grib2json plus ImageMagick.
    pub fn external(grib2json: impl Into<PathBuf>, convert: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(Grib2Json::new(grib2json)),
            Arc::new(ImageMagickBarrel::new(convert)),
        )
    }

    /// grib2json plus the in-process distortion.
    pub fn native(grib2json: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(Grib2Json::new(grib2json)), Arc::new(NativeBarrel))
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset")
            .field("converter", &self.converter.name())
            .field("distorter", &self.distorter.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainbow_common::GreyImage;

    #[test]
    fn test_missing_binary_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Grib2Json::new(dir.path().join("no-such-grib2json"));
        let err = tool
            .transform(
                &dir.path().join("in.grib"),
                &dir.path().join("out.json"),
                &Transform::GribToJson,
            )
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ExternalTool { ref tool, .. } if tool == "grib2json"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unsupported_operation() {
        let dir = tempfile::tempdir().unwrap();
        let err = NativeBarrel
            .transform(dir.path(), dir.path(), &Transform::GribToJson)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ExternalTool { .. }));
    }

    #[test]
    fn test_native_barrel_negates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");

        let mut img = GreyImage::new(8, 4, 0);
        img.set(2, 1, 255);
        renderer::save_grey(&input, &img).unwrap();

        let identity = BarrelParams {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            center_x: 4.0,
            center_y: 2.0,
        };
        NativeBarrel
            .transform(&input, &output, &Transform::Barrel(identity))
            .unwrap();

        let out = renderer::load_grey(&output).unwrap();
        assert_eq!(out, img.invert());
    }
}
