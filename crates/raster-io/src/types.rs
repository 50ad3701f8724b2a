//! Core raster payload types.

use crate::error::{RasterError, Result};
use access_common::Grid;

/// A single-band raster bound to a grid.
///
/// Data is stored row-major, `rows * cols` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    grid: Grid,
    data: Vec<T>,
    /// Nodata sentinel read from or to be written to the file boundary.
    nodata: Option<f64>,
}

/// Boolean raster, `true` marks selected pixels.
pub type Mask = Raster<bool>;

impl<T: Copy> Raster<T> {
    /// Wrap an existing buffer. Fails when its length does not match the grid.
    pub fn new(grid: Grid, data: Vec<T>) -> Result<Self> {
        if data.len() != grid.len() {
            return Err(RasterError::ShapeMismatch {
                expected: grid.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            grid,
            data,
            nodata: None,
        })
    }

    /// Raster with every pixel set to `value`.
    pub fn filled(grid: &Grid, value: T) -> Self {
        Self {
            data: vec![value; grid.len()],
            grid: grid.clone(),
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        Some(self.data[self.grid.index(row, col)])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = self.grid.index(row, col);
        self.data[idx] = value;
    }

    /// Apply `f` to every pixel, keeping the grid.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster {
            grid: self.grid.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
            nodata: self.nodata,
        }
    }

    /// Combine two rasters pixel by pixel. Both must share the same grid.
    pub fn zip_map<U: Copy, V: Copy>(
        &self,
        other: &Raster<U>,
        f: impl Fn(T, U) -> V,
    ) -> Result<Raster<V>> {
        self.ensure_aligned(other.grid())?;
        Ok(Raster {
            grid: self.grid.clone(),
            data: self
                .data
                .iter()
                .zip(other.data())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            nodata: self.nodata,
        })
    }

    /// Fail with `NotAligned` unless `grid` matches this raster's grid.
    pub fn ensure_aligned(&self, grid: &Grid) -> Result<()> {
        if self.grid.is_aligned_with(grid) {
            Ok(())
        } else {
            Err(RasterError::NotAligned(format!(
                "{}x{} {} vs {}x{} {}",
                self.height(),
                self.width(),
                self.grid.crs(),
                grid.height(),
                grid.width(),
                grid.crs()
            )))
        }
    }
}

impl Raster<f64> {
    /// Count of pixels that are not `NaN`.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Minimum and maximum over non-`NaN` pixels.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl Mask {
    /// Number of `true` pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}
