//! Run configuration.
//!
//! Loaded from YAML with environment variable substitution using `${VAR}` and
//! `${VAR:-default}` syntax. Every section has defaults, so an empty file is
//! a valid configuration.

use access_common::{AccessError, AccessResult, CrsCode};
use cost_distance::SolverConfig;
use cost_surface::{ObstacleThresholds, TransportMode};
use raster_io::InterpolationMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MIN_RESOLUTION: f64 = 50.0;
pub const MAX_RESOLUTION: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Label stored in the session metadata.
    pub country: String,
    /// Directory holding the preprocessed input layers.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Area of interest polygon(s).
    pub aoi: PathBuf,
    pub grid: GridConfig,
    /// Travel-speed table, the built-in one when absent.
    pub speeds: Option<PathBuf>,
    pub obstacles: ObstacleThresholds,
    pub include_streams: bool,
    pub modes: Vec<TransportMode>,
    /// Walking speed ceiling in km/h.
    pub walk_speed: f64,
    pub solver: SolverConfig,
    pub access: AccessSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub crs: CrsCode,
    /// Pixel size in CRS units.
    pub resolution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessSettings {
    /// Travel-time levels in minutes.
    pub levels: Vec<u32>,
    pub resampling: InterpolationMethod,
    pub population: PathBuf,
    pub zones: PathBuf,
    /// Zone property holding the zone identifier.
    pub zone_id: String,
    /// Destination layers by name.
    pub destinations: BTreeMap<String, PathBuf>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            country: "AOI".to_string(),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            aoi: PathBuf::from("aoi.geojson"),
            grid: GridConfig::default(),
            speeds: None,
            obstacles: ObstacleThresholds::default(),
            include_streams: false,
            modes: vec![TransportMode::Car],
            walk_speed: 5.0,
            solver: SolverConfig::default(),
            access: AccessSettings::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            crs: CrsCode::Epsg3857,
            resolution: 100.0,
        }
    }
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            levels: vec![30, 90, 120, 150, 190],
            resampling: InterpolationMethod::Bilinear,
            population: PathBuf::from("population.tif"),
            zones: PathBuf::from("areas.geojson"),
            zone_id: "GID_2".to_string(),
            destinations: BTreeMap::from([("health".to_string(), PathBuf::from("health.geojson"))]),
        }
    }
}

impl AccessConfig {
    /// Load, expand and validate a YAML configuration file.
    pub fn load(path: &Path) -> AccessResult<Self> {
        if !path.is_file() {
            return Err(AccessError::missing_data("configuration", path));
        }
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn from_yaml(content: &str) -> AccessResult<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = if expanded.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&expanded)
                .map_err(|e| AccessError::configuration(format!("invalid configuration: {}", e)))?
        };
        config.validate().map_err(AccessError::configuration)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let resolution = self.grid.resolution;
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(format!(
                "resolution must be within {}-{}, got {}",
                MIN_RESOLUTION, MAX_RESOLUTION, resolution
            ));
        }
        if self.grid.crs.is_geographic() {
            return Err(format!("grid CRS {} must be projected", self.grid.crs));
        }
        if !(self.walk_speed.is_finite() && self.walk_speed > 0.0) {
            return Err(format!("walk_speed must be > 0 km/h, got {}", self.walk_speed));
        }
        let max_slope = self.obstacles.max_slope;
        if !(max_slope > 0.0 && max_slope <= 90.0) {
            return Err(format!("max_slope must be within (0, 90] degrees, got {}", max_slope));
        }
        let seasonality = self.obstacles.water_seasonality;
        if !(0.0..=100.0).contains(&seasonality) {
            return Err(format!(
                "water_seasonality must be within [0, 100], got {}",
                seasonality
            ));
        }
        if self.access.levels.is_empty() {
            return Err("at least one travel-time level is required".to_string());
        }
        if self.access.levels.contains(&0) {
            return Err("travel-time levels must be > 0 minutes".to_string());
        }
        self.solver.validate()
    }

    /// Resolve a layer path against `input_dir`.
    pub fn input(&self, path: &Path) -> PathBuf {
        self.input_dir.join(path)
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in `content`.
fn expand_env_vars(content: &str) -> AccessResult<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => {
                        depth += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        depth -= 1;
                        if depth > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(AccessError::configuration(format!(
                            "unclosed variable substitution: ${{{}",
                            var_expr
                        )))
                    }
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }
    Ok(result)
}

fn resolve_var_expr(expr: &str) -> AccessResult<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            AccessError::configuration(format!("environment variable {} not set", expr.trim()))
        })
    }
}
