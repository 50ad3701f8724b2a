//! Common test fixtures for accessibility modeling tests.

use access_common::{Affine, CrsCode, Grid};

/// Resolution of the fixture grids in meters.
pub const FIXTURE_RESOLUTION: f64 = 100.0;

/// Common AOI extents `(min_lon, min_lat, max_lon, max_lat)` in EPSG:4326.
pub mod aoi {
    /// Small square straddling the equator and the prime meridian.
    pub const EQUATOR: (f64, f64, f64, f64) = (-0.05, -0.05, 0.05, 0.05);

    /// Roughly the extent of Dakar, Senegal.
    pub const DAKAR: (f64, f64, f64, f64) = (-17.55, 14.65, -17.35, 14.80);

    /// Degenerate extent (a single point).
    pub const POINT: (f64, f64, f64, f64) = (1.0, 1.0, 1.0, 1.0);
}

/// A `rows x cols` EPSG:3857 grid of 100 m pixels whose top-left corner is
/// at `(0, rows * 100)`.
pub fn unit_grid(rows: usize, cols: usize) -> Grid {
    grid_at(0.0, rows as f64 * FIXTURE_RESOLUTION, FIXTURE_RESOLUTION, rows, cols, CrsCode::Epsg3857)
}

/// Grid anchored at `(west, north)` with square pixels.
pub fn grid_at(west: f64, north: f64, res: f64, rows: usize, cols: usize, crs: CrsCode) -> Grid {
    Grid::new(Affine::from_origin(west, north, res, res), rows, cols, crs)
        .expect("fixture grid must be valid")
}

/// Axis-aligned polygon from an extent tuple.
pub fn extent_polygon(extent: (f64, f64, f64, f64)) -> geo::Geometry<f64> {
    let (x0, y0, x1, y1) = extent;
    geo::Geometry::Polygon(geo::Polygon::new(
        geo::LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    ))
}
