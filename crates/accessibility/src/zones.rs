//! Administrative zones.

use access_common::{AccessError, AccessResult, CrsCode, FeatureCollection};
use projection::Transformer;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// One area with a unique identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub geometry: geo::MultiPolygon<f64>,
}

/// Zones sharing one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Zones {
    zones: Vec<Zone>,
    crs: CrsCode,
}

impl Zones {
    /// Fails with `BadData` on an empty set or duplicate ids.
    pub fn new(zones: Vec<Zone>, crs: CrsCode) -> AccessResult<Self> {
        if zones.is_empty() {
            return Err(AccessError::bad_data("zones", "no areal features"));
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = zones.iter().find(|z| !seen.insert(z.id.as_str())) {
            return Err(AccessError::bad_data("zones", format!("duplicate zone id '{}'", dup.id)));
        }
        Ok(Self { zones, crs })
    }

    /// Areal features of a collection. The id is read from `id_field`, then
    /// the feature id, then the feature position.
    pub fn from_collection(collection: &FeatureCollection, id_field: &str) -> AccessResult<Self> {
        let crs = collection.crs_code()?;
        let mut zones = Vec::new();
        for (index, feature) in collection.features.iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let geometry = match geometry.to_geo()? {
                geo::Geometry::Polygon(p) => geo::MultiPolygon(vec![p]),
                geo::Geometry::MultiPolygon(mp) => mp,
                _ => {
                    warn!(index, "Skipping non-areal zone");
                    continue;
                }
            };
            let id = feature
                .property_str(id_field)
                .or_else(|| feature.id.as_ref().map(feature_id))
                .unwrap_or_else(|| index.to_string());
            zones.push(Zone { id, geometry });
        }
        debug!(zones = zones.len(), crs = %crs, "Loaded zones");
        Self::new(zones, crs)
    }

    pub fn load(path: &Path, id_field: &str) -> AccessResult<Self> {
        Self::from_collection(&FeatureCollection::read("zones", path)?, id_field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    /// Reproject every zone into `crs`.
    pub fn to_crs(&self, crs: CrsCode) -> Self {
        let transformer = Transformer::new(self.crs, crs);
        let zones = self
            .zones
            .iter()
            .map(|zone| {
                let projected = transformer.transform_geometry(&geo::Geometry::MultiPolygon(
                    zone.geometry.clone(),
                ));
                let geometry = match projected {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    _ => zone.geometry.clone(),
                };
                Zone {
                    id: zone.id.clone(),
                    geometry,
                }
            })
            .collect();
        Self { zones, crs }
    }
}

fn feature_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
