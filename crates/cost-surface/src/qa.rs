//! Quality checks on modeling inputs.

use access_common::{AccessError, AccessResult, Grid};
use raster_io::{read_geotiff, Mask, Raster};
use std::path::Path;
use tracing::{debug, warn};

/// Largest share of undefined pixels tolerated within the AOI.
pub const MAX_NAN_RATIO: f64 = 0.1;

/// Fail with `BadData` unless every layer shares shape, transform and CRS.
/// Transforms are compared within the grid alignment tolerance.
pub fn check_alignment<'a, I>(layers: I) -> AccessResult<()>
where
    I: IntoIterator<Item = (&'a str, &'a Grid)>,
{
    let mut layers = layers.into_iter();
    let Some((first_name, reference)) = layers.next() else {
        return Ok(());
    };
    for (name, grid) in layers {
        let reason = if grid.shape() != reference.shape() {
            "shapes differ"
        } else if grid.crs() != reference.crs() {
            "CRS differ"
        } else if !grid.is_aligned_with(reference) {
            "transforms differ"
        } else {
            continue;
        };
        return Err(AccessError::bad_data(
            name,
            format!("not aligned with {} ({})", first_name, reason),
        ));
    }
    Ok(())
}

/// Check that every GeoTIFF in `dir` sits on the same grid.
pub fn check_directory_alignment(dir: &Path) -> AccessResult<()> {
    let mut grids = Vec::new();
    for entry in walkdir::WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| AccessError::Io(e.into()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("tif") {
            continue;
        }
        let raster = read_geotiff(path).map_err(|e| e.into_access("input raster"))?;
        grids.push((path.display().to_string(), raster.grid().clone()));
    }
    debug!(dir = %dir.display(), rasters = grids.len(), "Checking raster alignment");
    check_alignment(grids.iter().map(|(name, grid)| (name.as_str(), grid)))
}

/// Share of `NaN` pixels among the pixels inside `aoi`.
pub fn nan_ratio(raster: &Raster<f64>, aoi: &Mask) -> AccessResult<f64> {
    raster
        .ensure_aligned(aoi.grid())
        .map_err(|e| e.into_access("aoi mask"))?;
    let (inside, nan) = raster
        .data()
        .iter()
        .zip(aoi.data())
        .filter(|(_, m)| **m)
        .fold((0usize, 0usize), |(n, k), (v, _)| (n + 1, k + v.is_nan() as usize));
    if inside == 0 {
        return Ok(0.0);
    }
    Ok(nan as f64 / inside as f64)
}

/// Fail with `BadData` when more than [`MAX_NAN_RATIO`] of the AOI is undefined.
pub fn check_nan_ratio(layer: &str, raster: &Raster<f64>, aoi: &Mask) -> AccessResult<()> {
    let ratio = nan_ratio(raster, aoi)?;
    if ratio > MAX_NAN_RATIO {
        warn!(layer, ratio, "Too many undefined pixels in area of interest");
        return Err(AccessError::bad_data(
            layer,
            format!("{:.1}% of the area of interest is nodata", ratio * 100.0),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{grid_at, unit_grid, uniform_raster, write_raster};
    use access_common::CrsCode;

    #[test]
    fn test_alignment() {
        let a = unit_grid(3, 3);
        let b = unit_grid(3, 3);
        let shifted = grid_at(50.0, 300.0, 100.0, 3, 3, CrsCode::Epsg3857);
        let other_crs = grid_at(0.0, 300.0, 100.0, 3, 3, CrsCode::Epsg4326);

        assert!(check_alignment([("a", &a), ("b", &b)]).is_ok());
        let drifted = grid_at(5e-10, 300.0, 100.0, 3, 3, CrsCode::Epsg3857);
        assert!(check_alignment([("a", &a), ("drifted", &drifted)]).is_ok());
        let err = check_alignment([("a", &a), ("shifted", &shifted)]).unwrap_err();
        assert!(err.to_string().contains("transforms differ"));
        let err = check_alignment([("a", &a), ("geo", &other_crs)]).unwrap_err();
        assert!(err.to_string().contains("CRS differ"));
        let err = check_alignment([("a", &a), ("small", &unit_grid(2, 3))]).unwrap_err();
        assert!(matches!(err, AccessError::BadData { .. }));
    }

    #[test]
    fn test_directory_alignment() {
        let dir = tempfile::tempdir().unwrap();
        write_raster(dir.path(), "slope.tif", &uniform_raster(&unit_grid(3, 3), 1.0), None);
        write_raster(dir.path(), "elevation.tif", &uniform_raster(&unit_grid(3, 3), 1.0), None);
        assert!(check_directory_alignment(dir.path()).is_ok());

        write_raster(dir.path(), "water_gsw.tif", &uniform_raster(&unit_grid(4, 3), 1.0), None);
        assert!(check_directory_alignment(dir.path()).is_err());
    }

    #[test]
    fn test_nan_ratio_counts_inside_aoi_only() {
        let grid = unit_grid(2, 5);
        let mut raster = uniform_raster(&grid, 1.0);
        let mut aoi = Mask::filled(&grid, true);
        // Outside the AOI, ignored
        raster.set(0, 0, f64::NAN);
        aoi.set(0, 0, false);
        raster.set(1, 4, f64::NAN);

        let ratio = nan_ratio(&raster, &aoi).unwrap();
        assert!((ratio - 1.0 / 9.0).abs() < 1e-12);
        assert!(check_nan_ratio("elevation", &raster, &aoi).is_err());

        raster.set(1, 4, 1.0);
        assert!(check_nan_ratio("elevation", &raster, &aoi).is_ok());
    }
}
