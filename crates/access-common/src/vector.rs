//! GeoJSON vector payloads.
//!
//! Roads, ferries, water bodies, destinations and administrative zones all
//! enter the pipeline as GeoJSON. Features keep their attribute table as raw
//! JSON so that each consumer decides which tags it reads.
//!
//! RFC 7946 data are EPSG:4326. The legacy `crs` member
//! (`{"type": "name", "properties": {"name": "EPSG:3857"}}`) is honored on
//! read and emitted on write for staged layers in projected coordinates.

use crate::{AccessError, AccessResult, CrsCode};
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// A GeoJSON position `[x, y]`. Extra ordinates (`z`, `m`) are skipped on
/// read and never written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.x)?;
        tuple.serialize_element(&self.y)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a GeoJSON position with at least two numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
                let x = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let y = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(1, &self))?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Position::new(x, y))
            }
        }

        deserializer.deserialize_seq(PositionVisitor)
    }
}

impl From<geo::Coord<f64>> for Position {
    fn from(c: geo::Coord<f64>) -> Self {
        Position::new(c.x, c.y)
    }
}

/// GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Convert into a `geo` geometry, rejecting non-finite positions.
    pub fn to_geo(&self) -> AccessResult<geo::Geometry<f64>> {
        Ok(match self {
            Geometry::Point { coordinates } => geo::Geometry::Point(coord(coordinates)?.into()),
            Geometry::MultiPoint { coordinates } => geo::Geometry::MultiPoint(geo::MultiPoint(
                coordinates
                    .iter()
                    .map(|p| coord(p).map(geo::Point::from))
                    .collect::<AccessResult<_>>()?,
            )),
            Geometry::LineString { coordinates } => {
                geo::Geometry::LineString(line_string(coordinates)?)
            }
            Geometry::MultiLineString { coordinates } => {
                geo::Geometry::MultiLineString(geo::MultiLineString(
                    coordinates
                        .iter()
                        .map(|l| line_string(l))
                        .collect::<AccessResult<_>>()?,
                ))
            }
            Geometry::Polygon { coordinates } => geo::Geometry::Polygon(polygon(coordinates)?),
            Geometry::MultiPolygon { coordinates } => geo::Geometry::MultiPolygon(
                geo::MultiPolygon(
                    coordinates
                        .iter()
                        .map(|p| polygon(p))
                        .collect::<AccessResult<_>>()?,
                ),
            ),
            Geometry::GeometryCollection { geometries } => {
                geo::Geometry::GeometryCollection(geo::GeometryCollection(
                    geometries
                        .iter()
                        .map(Geometry::to_geo)
                        .collect::<AccessResult<_>>()?,
                ))
            }
        })
    }

    /// Convert from a `geo` geometry. Lines, rects and triangles become their
    /// GeoJSON equivalents.
    pub fn from_geo(geometry: &geo::Geometry<f64>) -> Self {
        match geometry {
            geo::Geometry::Point(p) => Geometry::Point {
                coordinates: p.0.into(),
            },
            geo::Geometry::MultiPoint(mp) => Geometry::MultiPoint {
                coordinates: mp.iter().map(|p| p.0.into()).collect(),
            },
            geo::Geometry::Line(l) => Geometry::LineString {
                coordinates: vec![l.start.into(), l.end.into()],
            },
            geo::Geometry::LineString(ls) => Geometry::LineString {
                coordinates: positions(ls),
            },
            geo::Geometry::MultiLineString(mls) => Geometry::MultiLineString {
                coordinates: mls.iter().map(positions).collect(),
            },
            geo::Geometry::Polygon(p) => Geometry::Polygon {
                coordinates: rings(p),
            },
            geo::Geometry::MultiPolygon(mp) => Geometry::MultiPolygon {
                coordinates: mp.iter().map(rings).collect(),
            },
            geo::Geometry::GeometryCollection(gc) => Geometry::GeometryCollection {
                geometries: gc.iter().map(Geometry::from_geo).collect(),
            },
            geo::Geometry::Rect(r) => Geometry::Polygon {
                coordinates: rings(&r.to_polygon()),
            },
            geo::Geometry::Triangle(t) => Geometry::Polygon {
                coordinates: rings(&t.to_polygon()),
            },
        }
    }
}

fn coord(position: &Position) -> AccessResult<geo::Coord<f64>> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(geo::coord! { x: position.x, y: position.y })
    } else {
        Err(AccessError::bad_data(
            "vector",
            format!("invalid GeoJSON position {:?}", position),
        ))
    }
}

fn line_string(positions: &[Position]) -> AccessResult<geo::LineString<f64>> {
    Ok(geo::LineString(
        positions
            .iter()
            .map(|p| coord(p))
            .collect::<AccessResult<_>>()?,
    ))
}

fn polygon(rings: &[Vec<Position>]) -> AccessResult<geo::Polygon<f64>> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(ring) => line_string(ring)?,
        None => geo::LineString(Vec::new()),
    };
    let interiors = rings.map(|r| line_string(r)).collect::<AccessResult<_>>()?;
    Ok(geo::Polygon::new(exterior, interiors))
}

fn positions(ls: &geo::LineString<f64>) -> Vec<Position> {
    ls.coords().map(|c| Position::from(*c)).collect()
}

fn rings(p: &geo::Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(positions)
        .collect()
}

/// A GeoJSON feature with its attribute table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Some(geometry),
            properties: Some(Map::new()),
        }
    }

    /// Attach a property, creating the attribute table if needed.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(key)
    }

    /// Property as text. Numbers and booleans are stringified, `null` is absent.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Legacy named CRS member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCrs {
    #[serde(rename = "type")]
    pub type_: String,
    pub properties: NamedCrsProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCrsProperties {
    pub name: String,
}

impl NamedCrs {
    pub fn from_code(code: CrsCode) -> Self {
        Self {
            type_: "name".to_string(),
            properties: NamedCrsProperties {
                name: format!("urn:ogc:def:crs:EPSG::{}", code.epsg()),
            },
        }
    }

    /// Resolve `EPSG:n`, `urn:ogc:def:crs:EPSG::n` and `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn code(&self) -> Option<CrsCode> {
        let name = self.properties.name.trim();
        if name.ends_with("CRS84") {
            return Some(CrsCode::Epsg4326);
        }
        if let Some((_, epsg)) = name.rsplit_once("EPSG::") {
            return epsg.parse().ok().and_then(CrsCode::from_epsg);
        }
        CrsCode::parse(name).ok()
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,

    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            crs: None,
            features,
        }
    }

    pub fn with_crs(mut self, code: CrsCode) -> Self {
        self.crs = if code == CrsCode::Epsg4326 {
            None
        } else {
            Some(NamedCrs::from_code(code))
        };
        self
    }

    /// CRS of the coordinates, EPSG:4326 when the member is absent.
    pub fn crs_code(&self) -> AccessResult<CrsCode> {
        match &self.crs {
            None => Ok(CrsCode::Epsg4326),
            Some(named) => named.code().ok_or_else(|| {
                AccessError::bad_data(
                    "vector",
                    format!("unsupported GeoJSON CRS '{}'", named.properties.name),
                )
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parse any GeoJSON object. A bare feature or geometry is wrapped into
    /// a one-element collection.
    pub fn from_json(layer: &str, text: &str) -> AccessResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| AccessError::bad_data(layer, format!("invalid GeoJSON: {}", e)))?;
        let invalid = |e: serde_json::Error| AccessError::bad_data(layer, e.to_string());

        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => serde_json::from_value(value).map_err(invalid),
            Some("Feature") => Ok(Self::new(vec![
                serde_json::from_value(value).map_err(invalid)?
            ])),
            Some(_) => {
                let geometry: Geometry = serde_json::from_value(value).map_err(invalid)?;
                Ok(Self::new(vec![Feature::new(geometry)]))
            }
            None => Err(AccessError::bad_data(
                layer,
                "GeoJSON object has no 'type' member",
            )),
        }
    }

    /// Read a layer from disk. A missing file is `MissingData`, anything
    /// unparsable is `BadData`.
    pub fn read(layer: &str, path: &Path) -> AccessResult<Self> {
        if !path.is_file() {
            return Err(AccessError::missing_data(layer, path));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(layer, &text)
    }

    pub fn write(&self, path: &Path) -> AccessResult<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// All geometries converted to `geo`, skipping features without one.
    pub fn geometries(&self) -> AccessResult<Vec<geo::Geometry<f64>>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(Geometry::to_geo)
            .collect()
    }
}
