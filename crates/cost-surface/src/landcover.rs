//! Off-road speed from fractional land cover.

use crate::layers::read_raster_layer;
use crate::speeds::{LandCoverClass, TravelSpeeds};
use access_common::{AccessError, AccessResult, Grid};
use raster_io::{InterpolationMethod, Raster};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the coverage layer of one class.
pub fn layer_file_name(class: LandCoverClass) -> String {
    format!("landcover_{}.tif", class)
}

/// Coverage fraction (0-100) of each land-cover class, aligned to one grid.
#[derive(Debug, Clone, Default)]
pub struct LandCover {
    layers: BTreeMap<LandCoverClass, Raster<f64>>,
}

impl LandCover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: LandCoverClass, coverage: Raster<f64>) {
        self.layers.insert(class, coverage);
    }

    pub fn classes(&self) -> impl Iterator<Item = LandCoverClass> + '_ {
        self.layers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Load every `landcover_<class>.tif` found in `dir`.
    ///
    /// Files whose suffix is not a known class are skipped with a warning.
    pub fn load(dir: &Path, grid: &Grid) -> AccessResult<Self> {
        let mut land_cover = Self::new();
        for (class, path) in find_layers(dir)? {
            let coverage = read_raster_layer("land cover", &path, grid, InterpolationMethod::Bilinear)?;
            land_cover.insert(class, coverage);
        }
        if land_cover.is_empty() {
            return Err(AccessError::missing_data("land cover", dir.join("landcover_*.tif")));
        }
        info!(dir = %dir.display(), classes = land_cover.len(), "Loaded land cover");
        Ok(land_cover)
    }

    /// `speed = sum(coverage / 100 * base_speed)` per pixel, km/h.
    ///
    /// Undefined coverage leaves the pixel undefined. Negative sums are
    /// numerical artifacts and become `NaN`.
    pub fn off_road_speed(&self, speeds: &TravelSpeeds, grid: &Grid) -> AccessResult<Raster<f64>> {
        if self.layers.is_empty() {
            return Err(AccessError::missing_data("land cover", PathBuf::from("landcover_*.tif")));
        }

        let mut speed = Raster::filled(grid, 0.0);
        for (class, coverage) in &self.layers {
            let base = speeds.land_cover_speed(*class).ok_or_else(|| {
                AccessError::configuration(format!("no travel speed for land-cover class '{}'", class))
            })?;
            coverage
                .ensure_aligned(grid)
                .map_err(|e| e.into_access("land cover"))?;
            for (s, c) in speed.data_mut().iter_mut().zip(coverage.data()) {
                *s += c / 100.0 * base;
            }
        }

        for s in speed.data_mut().iter_mut().filter(|s| **s < 0.0) {
            *s = f64::NAN;
        }
        debug!(classes = self.layers.len(), "Computed off-road speed");
        Ok(speed)
    }
}

fn find_layers(dir: &Path) -> AccessResult<Vec<(LandCoverClass, PathBuf)>> {
    if !dir.is_dir() {
        return Err(AccessError::missing_data("land cover", dir));
    }

    let mut layers = Vec::new();
    for entry in walkdir::WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| AccessError::Io(e.into()))?;
        let name = entry.file_name().to_string_lossy();
        let Some(label) = name
            .strip_prefix("landcover_")
            .and_then(|rest| rest.strip_suffix(".tif"))
        else {
            continue;
        };
        match label.parse::<LandCoverClass>() {
            Ok(class) => layers.push((class, entry.path().to_path_buf())),
            Err(_) => warn!(file = %name, "Skipping unknown land-cover layer"),
        }
    }
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, unit_grid, uniform_raster, write_raster};

    fn speeds() -> TravelSpeeds {
        TravelSpeeds::from_json(
            r#"{
                "land-cover": {"tree": 4, "urban": 5, "grass": 2},
                "transport": {"highway": {}, "route": {"ferry": 10}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_weighted_sum() {
        let grid = unit_grid(3, 3);
        let mut lc = LandCover::new();
        lc.insert(LandCoverClass::Tree, uniform_raster(&grid, 50.0));
        lc.insert(LandCoverClass::Urban, uniform_raster(&grid, 50.0));

        let speed = lc.off_road_speed(&speeds(), &grid).unwrap();
        for v in speed.data() {
            assert_approx_eq!(*v, 4.5, 1e-12);
        }
    }

    #[test]
    fn test_nodata_and_negative_become_nan() {
        let grid = unit_grid(1, 3);
        let mut coverage = uniform_raster(&grid, 100.0);
        coverage.set(0, 0, f64::NAN);
        coverage.set(0, 1, -10.0);
        let mut lc = LandCover::new();
        lc.insert(LandCoverClass::Grass, coverage);

        let speed = lc.off_road_speed(&speeds(), &grid).unwrap();
        assert!(speed.get(0, 0).unwrap().is_nan());
        assert!(speed.get(0, 1).unwrap().is_nan());
        assert_eq!(speed.get(0, 2), Some(2.0));
    }

    #[test]
    fn test_class_without_speed() {
        let grid = unit_grid(2, 2);
        let mut lc = LandCover::new();
        lc.insert(LandCoverClass::Snow, uniform_raster(&grid, 100.0));
        assert!(matches!(
            lc.off_road_speed(&speeds(), &grid),
            Err(AccessError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let grid = unit_grid(4, 4);
        let tree = uniform_raster(&grid, 100.0);
        write_raster(dir.path(), &layer_file_name(LandCoverClass::Tree), &tree, Some(-1.0));
        write_raster(dir.path(), "landcover_lava.tif", &tree, None);
        std::fs::write(dir.path().join("readme.txt"), "not a layer").unwrap();

        let lc = LandCover::load(dir.path(), &grid).unwrap();
        assert_eq!(lc.classes().collect::<Vec<_>>(), vec![LandCoverClass::Tree]);
    }

    #[test]
    fn test_empty_directory_is_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = LandCover::load(dir.path(), &unit_grid(2, 2)).unwrap_err();
        assert!(matches!(err, AccessError::MissingData { .. }));

        let err = LandCover::new().off_road_speed(&speeds(), &unit_grid(2, 2)).unwrap_err();
        assert!(matches!(err, AccessError::MissingData { .. }));
    }
}
