//! Travel-speed lookup tables.
//!
//! Every table is keyed by a closed tag enumeration, so a misspelled key in a
//! speeds file fails at load time instead of silently never matching.
//! Tag values found in the data are parsed leniently: an unknown quality tag
//! is a neutral factor of `1`, an unknown `highway` excludes the segment.

use access_common::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Default table shipped with the crate.
const DEFAULT_SPEEDS: &str = include_str!("../resources/travel-speeds.json");

macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $tag:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AccessError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($name::$variant),)+
                    other => Err(AccessError::configuration(format!(
                        "unknown {} '{}'",
                        $label, other
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = AccessError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

tag_enum! {
    /// Land-cover classes, one coverage layer (0-100 %) each.
    LandCoverClass, "land-cover class" {
        Bare => "bare",
        Crops => "crops",
        Grass => "grass",
        Moss => "moss",
        Shrub => "shrub",
        Snow => "snow",
        Tree => "tree",
        Urban => "urban",
        WaterPermanent => "water-permanent",
        WaterSeasonal => "water-seasonal",
    }
}

tag_enum! {
    /// OSM `highway` values that carry a base speed.
    Highway, "highway" {
        Motorway => "motorway",
        MotorwayLink => "motorway_link",
        Trunk => "trunk",
        TrunkLink => "trunk_link",
        Primary => "primary",
        PrimaryLink => "primary_link",
        Secondary => "secondary",
        SecondaryLink => "secondary_link",
        Tertiary => "tertiary",
        TertiaryLink => "tertiary_link",
        Unclassified => "unclassified",
        Residential => "residential",
        LivingStreet => "living_street",
        Service => "service",
        Road => "road",
        Track => "track",
        Path => "path",
        Footway => "footway",
        Pedestrian => "pedestrian",
        Bridleway => "bridleway",
        Cycleway => "cycleway",
        Steps => "steps",
    }
}

tag_enum! {
    /// OSM `tracktype` grades.
    TrackType, "tracktype" {
        Grade1 => "grade1",
        Grade2 => "grade2",
        Grade3 => "grade3",
        Grade4 => "grade4",
        Grade5 => "grade5",
    }
}

tag_enum! {
    /// OSM `smoothness` values.
    Smoothness, "smoothness" {
        Excellent => "excellent",
        Good => "good",
        Intermediate => "intermediate",
        Bad => "bad",
        VeryBad => "very_bad",
        Horrible => "horrible",
        VeryHorrible => "very_horrible",
        Impassable => "impassable",
    }
}

tag_enum! {
    /// OSM `surface` values.
    Surface, "surface" {
        Paved => "paved",
        Asphalt => "asphalt",
        Concrete => "concrete",
        PavingStones => "paving_stones",
        Sett => "sett",
        Cobblestone => "cobblestone",
        Metal => "metal",
        Wood => "wood",
        Compacted => "compacted",
        FineGravel => "fine_gravel",
        Gravel => "gravel",
        Pebblestone => "pebblestone",
        Unpaved => "unpaved",
        Dirt => "dirt",
        Earth => "earth",
        Ground => "ground",
        Grass => "grass",
        Mud => "mud",
        Sand => "sand",
    }
}

/// Fixed speeds for `route` relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpeeds {
    /// Ferry crossing speed in km/h.
    pub ferry: f64,
}

/// Road network speed (km/h) and quality factor tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSpeeds {
    pub highway: BTreeMap<Highway, f64>,

    #[serde(default)]
    pub tracktype: BTreeMap<TrackType, f64>,

    #[serde(default)]
    pub smoothness: BTreeMap<Smoothness, f64>,

    #[serde(default)]
    pub surface: BTreeMap<Surface, f64>,

    pub route: RouteSpeeds,
}

/// Complete travel-speed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TravelSpeeds {
    #[serde(rename = "land-cover")]
    pub land_cover: BTreeMap<LandCoverClass, f64>,

    pub transport: TransportSpeeds,
}

impl TravelSpeeds {
    /// The table embedded in the crate.
    pub fn embedded() -> AccessResult<Self> {
        Self::from_json(DEFAULT_SPEEDS)
    }

    /// Parse and validate a speeds table.
    pub fn from_json(text: &str) -> AccessResult<Self> {
        let speeds: Self = serde_json::from_str(text)
            .map_err(|e| AccessError::configuration(format!("invalid travel speeds: {}", e)))?;
        speeds.validate()?;
        Ok(speeds)
    }

    /// Load a speeds table from disk.
    pub fn load(path: &Path) -> AccessResult<Self> {
        if !path.is_file() {
            return Err(AccessError::missing_data("travel speeds", path));
        }
        let speeds = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(
            path = %path.display(),
            highways = speeds.transport.highway.len(),
            classes = speeds.land_cover.len(),
            "Loaded travel speeds"
        );
        Ok(speeds)
    }

    /// Speeds must be finite and non-negative, factors within `[0, 1]`.
    pub fn validate(&self) -> AccessResult<()> {
        let speeds = self
            .land_cover
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .chain(self.transport.highway.iter().map(|(k, v)| (k.as_str(), *v)))
            .chain(std::iter::once(("ferry", self.transport.route.ferry)));
        for (key, speed) in speeds {
            if !speed.is_finite() || speed < 0.0 {
                return Err(AccessError::configuration(format!(
                    "speed for '{}' must be a non-negative number, got {}",
                    key, speed
                )));
            }
        }

        let factors = self
            .transport
            .tracktype
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .chain(self.transport.smoothness.iter().map(|(k, v)| (k.as_str(), *v)))
            .chain(self.transport.surface.iter().map(|(k, v)| (k.as_str(), *v)));
        for (key, factor) in factors {
            if !(0.0..=1.0).contains(&factor) {
                return Err(AccessError::configuration(format!(
                    "factor for '{}' must be within [0, 1], got {}",
                    key, factor
                )));
            }
        }
        Ok(())
    }

    /// Base speed of a land-cover class.
    pub fn land_cover_speed(&self, class: LandCoverClass) -> Option<f64> {
        self.land_cover.get(&class).copied()
    }

    /// Speed of a road segment from its OSM tags.
    ///
    /// `highway_base * min(tracktype, smoothness, surface)`. Returns `None`
    /// for a missing or unsupported `highway`.
    pub fn segment_speed(
        &self,
        highway: Option<&str>,
        tracktype: Option<&str>,
        smoothness: Option<&str>,
        surface: Option<&str>,
    ) -> Option<f64> {
        let highway: Highway = highway?.parse().ok()?;
        let base = *self.transport.highway.get(&highway)?;

        let t = &self.transport;
        let factor = factor(&t.tracktype, tracktype)
            .min(factor(&t.smoothness, smoothness))
            .min(factor(&t.surface, surface));
        Some(base * factor)
    }

    /// Fixed ferry speed.
    pub fn ferry_speed(&self) -> f64 {
        self.transport.route.ferry
    }
}

fn factor<K: FromStr + Ord>(table: &BTreeMap<K, f64>, tag: Option<&str>) -> f64 {
    tag.and_then(|s| s.parse::<K>().ok())
        .and_then(|k| table.get(&k).copied())
        .unwrap_or(1.0)
}
