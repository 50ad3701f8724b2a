//! Solver boundary.

use crate::environment::GisEnvironment;
use access_common::AccessResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Cost accumulation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Same cost in every direction (friction x distance over 8 neighbors).
    Isotropic,
    /// Direction dependent, with elevation-driven walking penalties.
    Anisotropic,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Isotropic => write!(f, "isotropic"),
            Direction::Anisotropic => write!(f, "anisotropic"),
        }
    }
}

/// Staged inputs of one solver call. All paths live in the scratch workspace.
#[derive(Debug, Clone)]
pub struct SolverRequest {
    pub friction: PathBuf,
    /// Required for [`Direction::Anisotropic`].
    pub elevation: Option<PathBuf>,
    /// Target points in the friction raster's CRS.
    pub targets: PathBuf,
    pub direction: Direction,
    /// Directory the solver writes its GeoTIFF outputs into.
    pub output_dir: PathBuf,
}

/// Raster outputs of a solver call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutputs {
    /// Accumulated cost in seconds.
    pub cost: PathBuf,
    /// Id of the nearest target.
    pub nearest: PathBuf,
    /// Movement direction. Best effort for anisotropic runs.
    pub backlink: Option<PathBuf>,
}

/// A least-cost-path engine.
///
/// Implementations block until the solver finishes. Any failure must be
/// reported as `AccessError::Modeling` with the solver's diagnostics.
pub trait CostSolver {
    fn name(&self) -> &str;

    fn solve(&self, env: &GisEnvironment, request: &SolverRequest) -> AccessResult<SolverOutputs>;
}
