//! Analysis grid: affine geo-referencing plus raster shape.

use crate::{AccessError, AccessResult, BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

/// Affine pixel-to-world transform.
///
/// Coefficients follow the usual row-major layout:
/// `x = a * col + b * row + c` and `y = d * col + e * row + f`,
/// with `(col, row)` measured from the top-left corner of the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform anchored at the top-left corner `(west, north)`.
    pub fn from_origin(west: f64, north: f64, xsize: f64, ysize: f64) -> Self {
        Self::new(xsize, 0.0, west, 0.0, -ysize, north)
    }

    /// Build from GDAL geotransform order `(c, a, b, f, d, e)`.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// GDAL geotransform order `(c, a, b, f, d, e)`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Map fractional pixel coordinates to world coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Map world coordinates to fractional pixel coordinates `(col, row)`.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.a * self.e - self.b * self.d;
        let dx = x - self.c;
        let dy = y - self.f;
        (
            (self.e * dx - self.b * dy) / det,
            (self.a * dy - self.d * dx) / det,
        )
    }

    /// True when the transform has no rotation or shear terms.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }
}

/// A uniform analysis grid.
///
/// Built once per session and immutable afterwards; every raster consumed or
/// produced during a run shares one `Grid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    transform: Affine,
    rows: usize,
    cols: usize,
    crs: CrsCode,
}

impl Grid {
    /// Create a grid, rejecting empty shapes and degenerate pixel sizes.
    pub fn new(transform: Affine, rows: usize, cols: usize, crs: CrsCode) -> AccessResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(AccessError::configuration(format!(
                "grid shape must be non-empty, got {}x{}",
                rows, cols
            )));
        }
        let coefficients = [
            transform.a,
            transform.b,
            transform.c,
            transform.d,
            transform.e,
            transform.f,
        ];
        if coefficients.iter().any(|v| !v.is_finite()) {
            return Err(AccessError::configuration("grid transform is not finite"));
        }
        if !(transform.a.abs() > 0.0 && transform.e.abs() > 0.0) || !transform.is_rectilinear() {
            return Err(AccessError::configuration(format!(
                "grid pixel size must be strictly positive and axis aligned, got {:?}",
                transform
            )));
        }
        Ok(Self {
            transform,
            rows,
            cols,
            crs,
        })
    }

    pub fn transform(&self) -> &Affine {
        &self.transform
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    /// Raster shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn width(&self) -> usize {
        self.cols
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear pixel dimension along X in CRS units.
    pub fn pixel_size(&self) -> f64 {
        self.transform.a.abs()
    }

    /// Pixel dimensions `(x, y)` in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        (self.transform.a.abs(), self.transform.e.abs())
    }

    /// Outer extent of the grid.
    pub fn bounds(&self) -> BoundingBox {
        let (x0, y0) = self.transform.apply(0.0, 0.0);
        let (x1, y1) = self
            .transform
            .apply(self.cols as f64, self.rows as f64);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// World coordinates of the center of pixel `(row, col)`.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Pixel containing the world coordinate, if it falls on the grid.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.invert(x, y);
        if !(col.is_finite() && row.is_finite()) {
            return None;
        }
        let (col, row) = (col.floor(), row.floor());
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Row-major flat index.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Same shape, CRS and transform (within a relative tolerance).
    pub fn is_aligned_with(&self, other: &Grid) -> bool {
        let close = |p: f64, q: f64| (p - q).abs() <= 1e-9 * p.abs().max(q.abs()).max(1.0);
        let (t, o) = (&self.transform, &other.transform);
        self.shape() == other.shape()
            && self.crs == other.crs
            && close(t.a, o.a)
            && close(t.b, o.b)
            && close(t.c, o.c)
            && close(t.d, o.d)
            && close(t.e, o.e)
            && close(t.f, o.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(
            Affine::from_origin(1000.0, 5000.0, 100.0, 100.0),
            20,
            30,
            CrsCode::Epsg3857,
        )
        .unwrap()
    }

    #[test]
    fn test_gdal_order() {
        let t = Affine::from_origin(10.0, 20.0, 0.5, 0.25);
        assert_eq!(t.to_gdal(), [10.0, 0.5, 0.0, 20.0, 0.0, -0.25]);
        assert_eq!(Affine::from_gdal(t.to_gdal()), t);
    }

    #[test]
    fn test_apply_and_invert() {
        let t = Affine::from_origin(1000.0, 5000.0, 100.0, 50.0);
        assert_eq!(t.apply(2.0, 3.0), (1200.0, 4850.0));
        assert_eq!(t.invert(1200.0, 4850.0), (2.0, 3.0));
    }

    #[test]
    fn test_bounds_and_centers() {
        let g = grid();
        assert_eq!(g.bounds(), BoundingBox::new(1000.0, 3000.0, 4000.0, 5000.0));
        assert_eq!(g.pixel_center(0, 0), (1050.0, 4950.0));
        assert_eq!(g.pixel_at(1050.0, 4950.0), Some((0, 0)));
        assert_eq!(g.pixel_at(3999.0, 3001.0), Some((19, 29)));
        assert_eq!(g.pixel_at(4000.0, 4000.0), None);
        assert_eq!(g.pixel_size(), 100.0);
        assert_eq!(g.len(), 600);
    }

    #[test]
    fn test_rejects_degenerate_grids() {
        let t = Affine::from_origin(0.0, 0.0, 0.0, 100.0);
        assert!(matches!(
            Grid::new(t, 10, 10, CrsCode::Epsg3857),
            Err(AccessError::Configuration(_))
        ));
        let t = Affine::from_origin(0.0, 0.0, 100.0, 100.0);
        assert!(Grid::new(t, 0, 10, CrsCode::Epsg3857).is_err());
    }

    #[test]
    fn test_alignment() {
        let g = grid();
        assert!(g.is_aligned_with(&g.clone()));
        let shifted = Grid::new(
            Affine::from_origin(1100.0, 5000.0, 100.0, 100.0),
            20,
            30,
            CrsCode::Epsg3857,
        )
        .unwrap();
        assert!(!g.is_aligned_with(&shifted));
    }
}
