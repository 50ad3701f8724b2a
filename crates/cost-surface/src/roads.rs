//! On-road speed from the road and ferry network.

use crate::layers::read_vector_layer;
use crate::speeds::TravelSpeeds;
use access_common::{AccessError, AccessResult, Feature, Grid};
use raster_io::{rasterize, Raster, RasterizeOptions};
use std::path::Path;
use tracing::{debug, info};

/// One rasterizable network segment.
#[derive(Debug, Clone)]
pub struct Segment {
    pub geometry: geo::Geometry<f64>,
    /// km/h
    pub speed: f64,
}

/// Road network features in the grid CRS.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    roads: Vec<(Feature, geo::Geometry<f64>)>,
    ferries: Vec<geo::Geometry<f64>>,
}

impl RoadNetwork {
    /// Load the road layer and, when the file exists, the ferry layer.
    ///
    /// Only linear geometries are kept. A missing road layer is
    /// `MissingData`; a missing ferry layer just means no ferries.
    pub fn load(roads: &Path, ferries: Option<&Path>, grid: &Grid) -> AccessResult<Self> {
        if !roads.is_file() {
            return Err(AccessError::missing_data("roads", roads));
        }
        let mut network = Self::from_features(read_vector_layer("roads", roads, grid)?);

        if let Some(path) = ferries.filter(|p| p.is_file()) {
            let extra = read_vector_layer("ferries", path, grid)?;
            network
                .ferries
                .extend(extra.into_iter().map(|(_, g)| g).filter(is_linear));
        }

        info!(
            roads = network.roads.len(),
            ferries = network.ferries.len(),
            "Loaded road network"
        );
        Ok(network)
    }

    /// Split projected features into roads and `route=ferry` crossings.
    pub fn from_features(features: Vec<(Feature, geo::Geometry<f64>)>) -> Self {
        let mut network = Self::default();
        let total = features.len();
        for (feature, geometry) in features.into_iter().filter(|(_, g)| is_linear(g)) {
            if feature.property_str("route").as_deref() == Some("ferry") {
                network.ferries.push(geometry);
            } else {
                network.roads.push((feature, geometry));
            }
        }
        let kept = network.roads.len() + network.ferries.len();
        if kept < total {
            debug!(skipped = total - kept, "Skipped non-linear network features");
        }
        network
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    pub fn ferry_count(&self) -> usize {
        self.ferries.len()
    }

    /// Segments with their speed, slowest first.
    ///
    /// Overlapping segments are resolved by the rasterizer's last write, so
    /// the fastest segment crossing a pixel sets its speed. The sort is
    /// stable: ties keep input order.
    pub fn segments(&self, speeds: &TravelSpeeds) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .roads
            .iter()
            .filter_map(|(feature, geometry)| {
                let speed = speeds.segment_speed(
                    feature.property_str("highway").as_deref(),
                    feature.property_str("tracktype").as_deref(),
                    feature.property_str("smoothness").as_deref(),
                    feature.property_str("surface").as_deref(),
                )?;
                Some(Segment {
                    geometry: geometry.clone(),
                    speed,
                })
            })
            .chain(self.ferries.iter().map(|geometry| Segment {
                geometry: geometry.clone(),
                speed: speeds.ferry_speed(),
            }))
            .filter(|s| s.speed > 0.0)
            .collect();
        segments.sort_by(|a, b| a.speed.total_cmp(&b.speed));
        segments
    }

    /// Rasterize the network, km/h. Pixels without a segment are `0`.
    pub fn on_road_speed(&self, speeds: &TravelSpeeds, grid: &Grid) -> Raster<f64> {
        let segments = self.segments(speeds);
        let raster = rasterize(
            segments.iter().map(|s| (&s.geometry, s.speed)),
            grid,
            0.0,
            RasterizeOptions::all_touched(),
        );
        debug!(
            segments = segments.len(),
            excluded = self.roads.len() + self.ferries.len() - segments.len(),
            "Computed on-road speed"
        );
        raster
    }
}

fn is_linear(geometry: &geo::Geometry<f64>) -> bool {
    matches!(
        geometry,
        geo::Geometry::LineString(_) | geo::Geometry::MultiLineString(_) | geo::Geometry::Line(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_common::{CrsCode, FeatureCollection};
    use test_utils::{line_feature, point_feature, unit_grid, write_features};

    const TABLE: &str = r#"{
        "land-cover": {},
        "transport": {
            "highway": {"residential": 50, "primary": 80},
            "surface": {"unpaved": 0.5},
            "route": {"ferry": 10}
        }
    }"#;

    fn network(features: Vec<Feature>, grid: &Grid) -> RoadNetwork {
        let projected = crate::layers::project_features(
            "roads",
            FeatureCollection::new(features).with_crs(CrsCode::Epsg3857),
            grid,
        )
        .unwrap();
        RoadNetwork::from_features(projected)
    }

    #[test]
    fn test_unpaved_residential_row() {
        let grid = unit_grid(5, 5);
        let speeds = TravelSpeeds::from_json(TABLE).unwrap();
        // Row 2 spans y = 200..300
        let roads = network(
            vec![line_feature(
                &[(10.0, 250.0), (490.0, 250.0)],
                &[("highway", "residential"), ("surface", "unpaved")],
            )],
            &grid,
        );

        let speed = roads.on_road_speed(&speeds, &grid);
        for col in 0..5 {
            assert_eq!(speed.get(2, col), Some(25.0));
            assert_eq!(speed.get(1, col), Some(0.0));
        }
    }

    #[test]
    fn test_fastest_segment_wins_overlap() {
        let grid = unit_grid(3, 3);
        let speeds = TravelSpeeds::from_json(TABLE).unwrap();
        let line = [(10.0, 150.0), (290.0, 150.0)];
        // Input order puts the slow segment last
        let roads = network(
            vec![
                line_feature(&line, &[("highway", "primary")]),
                line_feature(&line, &[("highway", "residential")]),
            ],
            &grid,
        );
        let speed = roads.on_road_speed(&speeds, &grid);
        assert_eq!(speed.get(1, 1), Some(80.0));
    }

    #[test]
    fn test_ferries_and_exclusions() {
        let grid = unit_grid(3, 3);
        let speeds = TravelSpeeds::from_json(TABLE).unwrap();
        let roads = network(
            vec![
                line_feature(&[(10.0, 50.0), (290.0, 50.0)], &[("route", "ferry")]),
                line_feature(&[(10.0, 250.0), (290.0, 250.0)], &[("highway", "construction")]),
                point_feature(150.0, 150.0, &[("highway", "primary")]),
            ],
            &grid,
        );
        assert_eq!(roads.road_count(), 1);
        assert_eq!(roads.ferry_count(), 1);

        let speed = roads.on_road_speed(&speeds, &grid);
        assert_eq!(speed.get(2, 1), Some(10.0));
        assert_eq!(speed.get(0, 1), Some(0.0));
        assert_eq!(speed.get(1, 1), Some(0.0));
    }

    #[test]
    fn test_missing_roads_and_optional_ferries() {
        let dir = tempfile::tempdir().unwrap();
        let grid = unit_grid(3, 3);
        let err = RoadNetwork::load(&dir.path().join("roads.geojson"), None, &grid).unwrap_err();
        assert!(matches!(err, AccessError::MissingData { .. }));

        let roads = write_features(
            dir.path(),
            "roads.geojson",
            vec![line_feature(&[(10.0, 150.0), (290.0, 150.0)], &[("highway", "primary")])],
            CrsCode::Epsg3857,
        );
        let network =
            RoadNetwork::load(&roads, Some(&dir.path().join("ferry.geojson")), &grid).unwrap();
        assert_eq!(network.road_count(), 1);
        assert_eq!(network.ferry_count(), 0);
    }
}
