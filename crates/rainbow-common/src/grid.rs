//! Grid specifications for forecast rasters.

use crate::{CommonError, CommonResult};
use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon grid.
///
/// Values are stored row-major starting at the first grid point. A negative
/// `dy` means rows run from north to south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X (longitude) direction
    pub nx: usize,
    /// Number of points in Y (latitude) direction
    pub ny: usize,
    /// Column spacing in degrees longitude
    pub dx: f64,
    /// Row spacing in degrees latitude (signed)
    pub dy: f64,
    /// First grid point longitude
    pub first_x: f64,
    /// First grid point latitude
    pub first_y: f64,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, first_x: f64, first_y: f64) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_x,
            first_y,
        }
    }

    /// Convert a grid index to coordinates.
    pub fn index_to_coord(&self, i: usize, j: usize) -> Option<GridCell> {
        if i >= self.nx || j >= self.ny {
            return None;
        }

        Some(GridCell {
            col: i,
            row: j,
            lon: self.first_x + i as f64 * self.dx,
            lat: self.first_y + j as f64 * self.dy,
        })
    }

    /// Get the 1D array index for a 2D grid position.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// Split a flat index back into (column, row).
    pub fn cell_of(&self, index: usize) -> (usize, usize) {
        (index % self.nx, index / self.nx)
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// A cell on the grid with both indices and coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub col: usize,
    pub row: usize,
    pub lon: f64,
    pub lat: f64,
}

/// Moisture raster: a grid header plus one value per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    spec: GridSpec,
    data: Vec<f32>,
}

impl RasterGrid {
    /// Create a raster, checking that the data covers the grid exactly.
    pub fn new(spec: GridSpec, data: Vec<f32>) -> CommonResult<Self> {
        if spec.is_empty() {
            return Err(CommonError::InvalidGrid(format!(
                "grid has no cells ({}x{})",
                spec.nx, spec.ny
            )));
        }
        if data.len() != spec.len() {
            return Err(CommonError::size_mismatch(spec.len(), data.len()));
        }
        Ok(Self { spec, data })
    }

    /// Create a raster with the same value in every cell.
    pub fn filled(spec: GridSpec, value: f32) -> CommonResult<Self> {
        Self::new(spec, vec![value; spec.len()])
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.spec.nx
    }

    pub fn height(&self) -> usize {
        self.spec.ny
    }

    /// Value at (column, row).
    pub fn value(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.spec.nx || j >= self.spec.ny {
            return None;
        }
        self.data.get(self.spec.flat_index(i, j)).copied()
    }
}

/// Common grid definitions.
pub mod grids {
    use super::*;

    /// GFS 0.5° global grid: origin 0°E 90°N, rows north to south.
    pub fn gfs_0p50() -> GridSpec {
        GridSpec::new(720, 361, 0.5, -0.5, 0.0, 90.0)
    }
}
