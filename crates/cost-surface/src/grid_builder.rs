//! Analysis grid derived from an area of interest.

use access_common::{AccessError, AccessResult, Affine, BoundingBox, CrsCode, Grid};
use geo::BoundingRect;
use projection::Transformer;
use raster_io::{Mask, RasterizeOptions};
use tracing::{debug, info};

/// Upper bound on the number of pixels of an analysis grid.
pub const MAX_GRID_PIXELS: usize = 400_000_000;

/// Points sampled along each edge when reprojecting the AOI bounds.
const BOUNDS_DENSIFY: usize = 21;

/// Build the analysis grid covering `aoi` (EPSG:4326) in `crs`.
///
/// The grid is anchored at the top-left corner of the reprojected AOI
/// bounds. Width and height are rounded up to whole pixels so the AOI is
/// always fully covered.
pub fn build_grid(aoi: &geo::Geometry<f64>, crs: CrsCode, resolution: f64) -> AccessResult<Grid> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(AccessError::configuration(format!(
            "resolution must be a positive number, got {}",
            resolution
        )));
    }

    let rect = aoi
        .bounding_rect()
        .ok_or_else(|| AccessError::bad_data("area of interest", "geometry is empty"))?;
    let geographic = BoundingBox::from(rect);
    if !geographic.is_valid() || geographic.width() == 0.0 || geographic.height() == 0.0 {
        return Err(AccessError::bad_data(
            "area of interest",
            format!("degenerate extent {:?}", geographic),
        ));
    }

    let bounds = Transformer::new(CrsCode::Epsg4326, crs).transform_bounds(&geographic, BOUNDS_DENSIFY);
    let width = (bounds.width() / resolution).ceil();
    let height = (bounds.height() / resolution).ceil();
    if !(width * height <= MAX_GRID_PIXELS as f64) {
        return Err(AccessError::configuration(format!(
            "a {}x{} grid at resolution {} exceeds {} pixels",
            height, width, resolution, MAX_GRID_PIXELS
        )));
    }

    let transform = Affine::from_origin(bounds.min_x, bounds.max_y, resolution, resolution);
    let grid = Grid::new(transform, height as usize, width as usize, crs)?;
    info!(
        crs = %crs,
        resolution,
        rows = grid.height(),
        cols = grid.width(),
        "Built analysis grid"
    );
    Ok(grid)
}

/// Rasterize the AOI onto `grid`. Every pixel touched by the AOI counts as
/// inside.
pub fn rasterize_mask(aoi: &geo::Geometry<f64>, grid: &Grid) -> Mask {
    let projected = Transformer::new(CrsCode::Epsg4326, grid.crs()).transform_geometry(aoi);
    let mask = raster_io::rasterize_mask([&projected], grid, RasterizeOptions::all_touched());
    debug!(inside = mask.count(), total = grid.len(), "Rasterized AOI mask");
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{aoi, extent_polygon};

    #[test]
    fn test_grid_covers_aoi() {
        let geom = extent_polygon(aoi::EQUATOR);
        let grid = build_grid(&geom, CrsCode::Epsg3857, 100.0).unwrap();

        // 0.1 degree at the equator is about 11.13 km
        assert_eq!(grid.shape(), (112, 112));
        assert_eq!(grid.pixel_size(), 100.0);
        let bounds = grid.bounds();
        assert!(bounds.min_x < -5565.0 && bounds.max_x > 5565.0);
        assert!(bounds.min_y < -5565.0 && bounds.max_y > 5565.0);
    }

    #[test]
    fn test_grid_is_deterministic() {
        let geom = extent_polygon(aoi::DAKAR);
        let crs = CrsCode::utm_for(-17.45, 14.7);
        let a = build_grid(&geom, crs, 250.0).unwrap();
        let b = build_grid(&geom, crs, 250.0).unwrap();
        assert_eq!(a.transform().to_gdal(), b.transform().to_gdal());
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn test_invalid_resolution() {
        let geom = extent_polygon(aoi::EQUATOR);
        for res in [0.0, -100.0, f64::NAN] {
            assert!(matches!(
                build_grid(&geom, CrsCode::Epsg3857, res),
                Err(AccessError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_pixel_ceiling() {
        let geom = extent_polygon((-60.0, -40.0, 60.0, 40.0));
        assert!(matches!(
            build_grid(&geom, CrsCode::Epsg3857, 1.0),
            Err(AccessError::Configuration(_))
        ));
    }

    #[test]
    fn test_degenerate_aoi() {
        let geom = extent_polygon(aoi::POINT);
        assert!(matches!(
            build_grid(&geom, CrsCode::Epsg3857, 100.0),
            Err(AccessError::BadData { .. })
        ));
    }

    #[test]
    fn test_mask_touches_edge_pixels() {
        let geom = extent_polygon(aoi::EQUATOR);
        let grid = build_grid(&geom, CrsCode::Epsg3857, 100.0).unwrap();
        let mask = rasterize_mask(&geom, &grid);
        // The last row and column are only partly covered
        assert_eq!(mask.get(111, 111), Some(true));
        assert_eq!(mask.count(), grid.len());
    }
}
