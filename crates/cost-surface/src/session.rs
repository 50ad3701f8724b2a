//! Modeling session: the analysis grid and AOI mask of one country run.
//!
//! A session is persisted as `meta.json` in the input directory so that a
//! later run can restore the exact same grid without recomputing it.

use crate::grid_builder::{build_grid, rasterize_mask};
use access_common::{AccessError, AccessResult, Affine, CrsCode, Geometry, Grid};
use chrono::{DateTime, Utc};
use raster_io::Mask;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the persisted session metadata.
pub const META_FILE: &str = "meta.json";

/// On-disk session metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionMeta {
    country: String,
    /// GDAL geotransform order.
    transform: [f64; 6],
    crs: CrsCode,
    /// `(rows, cols)`
    shape: [usize; 2],
    /// `(xmin, ymin, xmax, ymax)`
    bounds: [f64; 4],
    resolution: f64,
    area: Geometry,
    created_at: DateTime<Utc>,
}

/// Grid, AOI and AOI mask shared by every step of a run.
#[derive(Debug, Clone)]
pub struct Session {
    country: String,
    aoi: geo::Geometry<f64>,
    grid: Grid,
    mask: Mask,
    resolution: f64,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Build a new session from an AOI in EPSG:4326.
    pub fn create(
        country: impl Into<String>,
        aoi: geo::Geometry<f64>,
        crs: CrsCode,
        resolution: f64,
    ) -> AccessResult<Self> {
        let grid = build_grid(&aoi, crs, resolution)?;
        let mask = rasterize_mask(&aoi, &grid);
        Ok(Self {
            country: country.into(),
            aoi,
            grid,
            mask,
            resolution,
            created_at: Utc::now(),
        })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn aoi(&self) -> &geo::Geometry<f64> {
        &self.aoi
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Write `meta.json` into `dir` and return its path.
    pub fn dump(&self, dir: &Path) -> AccessResult<PathBuf> {
        let b = self.grid.bounds();
        let (rows, cols) = self.grid.shape();
        let meta = SessionMeta {
            country: self.country.clone(),
            transform: self.grid.transform().to_gdal(),
            crs: self.grid.crs(),
            shape: [rows, cols],
            bounds: [b.min_x, b.min_y, b.max_x, b.max_y],
            resolution: self.resolution,
            area: Geometry::from_geo(&self.aoi),
            created_at: self.created_at,
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(META_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&meta)?)?;
        info!(path = %path.display(), country = %self.country, "Saved session metadata");
        Ok(path)
    }

    /// Rebuild a session from the `meta.json` found in `dir`.
    pub fn restore(dir: &Path) -> AccessResult<Self> {
        let path = dir.join(META_FILE);
        if !path.is_file() {
            return Err(AccessError::missing_data("session metadata", &path));
        }
        let meta: SessionMeta = serde_json::from_str(&std::fs::read_to_string(&path)?)
            .map_err(|e| AccessError::bad_data("session metadata", e.to_string()))?;

        let grid = Grid::new(
            Affine::from_gdal(meta.transform),
            meta.shape[0],
            meta.shape[1],
            meta.crs,
        )?;
        let aoi = meta.area.to_geo()?;
        let mask = rasterize_mask(&aoi, &grid);

        info!(
            path = %path.display(),
            country = %meta.country,
            rows = grid.height(),
            cols = grid.width(),
            "Restored session"
        );
        Ok(Self {
            country: meta.country,
            aoi,
            grid,
            mask,
            resolution: meta.resolution,
            created_at: meta.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{aoi, extent_polygon};

    #[test]
    fn test_restore_rebuilds_identical_grid() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::create("SEN", extent_polygon(aoi::DAKAR), CrsCode::utm_for(-17.45, 14.7), 100.0)
            .unwrap();
        let path = session.dump(dir.path()).unwrap();
        assert!(path.ends_with(META_FILE));

        let restored = Session::restore(dir.path()).unwrap();
        assert_eq!(restored.country(), "SEN");
        assert_eq!(restored.grid(), session.grid());
        assert_eq!(restored.mask(), session.mask());
        assert_eq!(restored.created_at(), session.created_at());
    }

    #[test]
    fn test_restore_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Session::restore(dir.path()),
            Err(AccessError::MissingData { .. })
        ));
    }

    #[test]
    fn test_restore_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(META_FILE), "{\"country\": 1}").unwrap();
        assert!(matches!(
            Session::restore(dir.path()),
            Err(AccessError::BadData { .. })
        ));
    }
}
