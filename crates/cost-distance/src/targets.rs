//! Destination points (health facilities).

use access_common::{AccessError, AccessResult, CrsCode, Feature, FeatureCollection, Geometry};
use geo::Centroid;
use projection::Transformer;
use std::path::Path;
use tracing::debug;

/// Target points and their CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    points: Vec<geo::Point<f64>>,
    crs: CrsCode,
}

impl Targets {
    pub fn new(points: Vec<geo::Point<f64>>, crs: CrsCode) -> AccessResult<Self> {
        if points.is_empty() {
            return Err(AccessError::bad_data("targets", "no target points"));
        }
        Ok(Self { points, crs })
    }

    /// Points of a feature collection. Areal features are reduced to their
    /// centroid; features without a usable point are skipped.
    pub fn from_collection(collection: &FeatureCollection) -> AccessResult<Self> {
        let crs = collection.crs_code()?;
        let mut points = Vec::new();
        for geometry in collection.geometries()? {
            collect_points(&geometry, &mut points);
        }
        debug!(features = collection.len(), points = points.len(), crs = %crs, "Loaded targets");
        Self::new(points, crs)
    }

    pub fn load(path: &Path) -> AccessResult<Self> {
        Self::from_collection(&FeatureCollection::read("targets", path)?)
    }

    pub fn points(&self) -> &[geo::Point<f64>] {
        &self.points
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reproject every point into `crs`.
    pub fn to_crs(&self, crs: CrsCode) -> Self {
        let transformer = Transformer::new(self.crs, crs);
        Self {
            points: self
                .points
                .iter()
                .map(|p| {
                    let (x, y) = transformer.transform(p.x(), p.y());
                    geo::Point::new(x, y)
                })
                .collect(),
            crs,
        }
    }

    /// Feature collection with a 1-based `id` per point and a named CRS.
    pub fn to_collection(&self) -> FeatureCollection {
        let features = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Feature::new(Geometry::Point {
                    coordinates: p.0.into(),
                })
                .with_property("id", (i + 1) as u64)
            })
            .collect();
        FeatureCollection::new(features).with_crs(self.crs)
    }
}

fn collect_points(geometry: &geo::Geometry<f64>, out: &mut Vec<geo::Point<f64>>) {
    match geometry {
        geo::Geometry::Point(p) => out.push(*p),
        geo::Geometry::MultiPoint(mp) => out.extend(mp.iter().copied()),
        geo::Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                collect_points(g, out);
            }
        }
        other => out.extend(other.centroid()),
    }
}
