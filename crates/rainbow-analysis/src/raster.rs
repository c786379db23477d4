//! Reading grib2json output into a [`RasterGrid`].
//!
//! grib2json emits a JSON array with one record per GRIB message. Only the
//! first record is used: its `header` describes the grid and `data` holds the
//! values row-major from the first grid point.

use std::path::Path;

use rainbow_common::{GridSpec, RasterGrid};
use serde::Deserialize;

use crate::{AnalysisError, AnalysisResult};

#[derive(Debug, Deserialize)]
struct Record {
    header: Header,
    data: Vec<Option<f32>>,
}

#[derive(Debug, Deserialize)]
struct Header {
    lo1: f64,
    la1: f64,
    la2: Option<f64>,
    dx: f64,
    dy: f64,
    nx: usize,
    ny: usize,
}

/// Parse grib2json output.
///
/// Missing values (`null`) are read as zero moisture.
pub fn parse_grib2json(bytes: &[u8]) -> AnalysisResult<RasterGrid> {
    let records: Vec<Record> = serde_json::from_slice(bytes)?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::DataIntegrity("grib2json output has no records".into()))?;

    let h = record.header;
    // Rows run north to south whenever the first latitude is the larger one.
    let dy = match h.la2 {
        Some(la2) if h.la1 > la2 => -h.dy.abs(),
        Some(_) => h.dy.abs(),
        None => h.dy,
    };
    let spec = GridSpec::new(h.nx, h.ny, h.dx, dy, h.lo1, h.la1);
    let data = record.data.into_iter().map(|v| v.unwrap_or(0.0)).collect();

    Ok(RasterGrid::new(spec, data)?)
}

/// Read and parse a grib2json file.
pub fn load_grib2json(path: &Path) -> AnalysisResult<RasterGrid> {
    let bytes = std::fs::read(path)?;
    let grid = parse_grib2json(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        nx = grid.width(),
        ny = grid.height(),
        "Loaded moisture raster"
    );
    Ok(grid)
}
