//! Point, bounds and geometry transformations between supported CRSs.

use crate::{TransverseMercator, WebMercator};
use access_common::{BoundingBox, CrsCode};
use geo::MapCoords;

/// One side of a transformation.
#[derive(Debug, Clone)]
enum Projection {
    Geographic,
    Mercator(WebMercator),
    Utm(TransverseMercator),
}

impl Projection {
    fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::Mercator(WebMercator),
            CrsCode::Utm { zone, north } => Projection::Utm(TransverseMercator::utm(zone, north)),
        }
    }

    fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (x, y),
            Projection::Mercator(p) => p.inverse(x, y),
            Projection::Utm(p) => p.inverse(x, y),
        }
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lon, lat),
            Projection::Mercator(p) => p.forward(lon, lat),
            Projection::Utm(p) => p.forward(lon, lat),
        }
    }
}

/// Transforms coordinates from a source CRS to a destination CRS.
#[derive(Debug, Clone)]
pub struct Transformer {
    src: CrsCode,
    dst: CrsCode,
    src_proj: Projection,
    dst_proj: Projection,
}

impl Transformer {
    pub fn new(src: CrsCode, dst: CrsCode) -> Self {
        Self {
            src,
            dst,
            src_proj: Projection::for_crs(src),
            dst_proj: Projection::for_crs(dst),
        }
    }

    pub fn src(&self) -> CrsCode {
        self.src
    }

    pub fn dst(&self) -> CrsCode {
        self.dst
    }

    pub fn is_identity(&self) -> bool {
        self.src == self.dst
    }

    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_identity() {
            return (x, y);
        }
        let (lon, lat) = self.src_proj.to_geographic(x, y);
        self.dst_proj.from_geographic(lon, lat)
    }

    /// Transform a bounding box by sampling `densify` points along each edge
    /// in addition to the corners.
    pub fn transform_bounds(&self, bbox: &BoundingBox, densify: usize) -> BoundingBox {
        if self.is_identity() {
            return *bbox;
        }
        let steps = densify + 1;
        let mut samples = Vec::with_capacity(4 * steps);
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let x = bbox.min_x + t * bbox.width();
            let y = bbox.min_y + t * bbox.height();
            samples.push((x, bbox.min_y));
            samples.push((bbox.max_x, y));
            samples.push((bbox.max_x - t * bbox.width(), bbox.max_y));
            samples.push((bbox.min_x, bbox.max_y - t * bbox.height()));
        }
        let projected = samples.into_iter().map(|(x, y)| self.transform(x, y));
        BoundingBox::from_points(projected).unwrap_or(*bbox)
    }

    /// Transform every vertex of a geometry. Edges are not densified.
    pub fn transform_geometry(&self, geometry: &geo::Geometry<f64>) -> geo::Geometry<f64> {
        if self.is_identity() {
            return geometry.clone();
        }
        geometry.map_coords(|c| {
            let (x, y) = self.transform(c.x, c.y);
            geo::coord! { x: x, y: y }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Transformer::new(CrsCode::Epsg3857, CrsCode::Epsg3857);
        assert!(t.is_identity());
        assert_eq!(t.transform(123.0, 456.0), (123.0, 456.0));
    }

    #[test]
    fn test_mercator_to_utm_via_geographic() {
        let to_merc = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let merc_to_utm = Transformer::new(
            CrsCode::Epsg3857,
            CrsCode::Utm {
                zone: 31,
                north: true,
            },
        );
        let (mx, my) = to_merc.transform(3.0, 0.0);
        let (e, n) = merc_to_utm.transform(mx, my);
        assert!((e - 500_000.0).abs() < 1e-6);
        assert!(n.abs() < 1e-6);
    }

    #[test]
    fn test_transform_bounds_contains_corners() {
        let t = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let bbox = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);
        let out = t.transform_bounds(&bbox, 4);
        let (x, y) = t.transform(1.0, 1.0);
        assert!((out.max_x - x).abs() < 1e-6);
        assert!((out.max_y - y).abs() < 1e-6);
        assert!((out.min_x + x).abs() < 1e-6);
    }

    #[test]
    fn test_transform_geometry() {
        let t = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let point = geo::Geometry::Point(geo::Point::new(180.0, 0.0));
        match t.transform_geometry(&point) {
            geo::Geometry::Point(p) => {
                assert!((p.x() - crate::mercator::MAX_EXTENT).abs() < 1e-6);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
