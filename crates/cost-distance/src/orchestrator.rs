//! Cost-distance orchestration.
//!
//! Each call walks `INIT -> STAGE_INPUTS -> INVOKE_SOLVER -> COLLECT_OUTPUTS
//! -> CLEANUP -> DONE`. The scratch workspace is removed on every exit path,
//! including solver failures.

use crate::environment::{GisEnvironment, SolverConfig};
use crate::solver::{CostSolver, Direction, SolverOutputs, SolverRequest};
use crate::targets::Targets;
use crate::workspace::ScratchWorkspace;
use access_common::{AccessError, AccessResult, Grid};
use raster_io::{read_geotiff, write_geotiff, Raster};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Sentinel for undefined elevation in the staged raster.
pub const ELEVATION_NODATA: f64 = -32768.0;

/// Orchestration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    StageInputs,
    InvokeSolver,
    CollectOutputs,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "INIT",
            Stage::StageInputs => "STAGE_INPUTS",
            Stage::InvokeSolver => "INVOKE_SOLVER",
            Stage::CollectOutputs => "COLLECT_OUTPUTS",
            Stage::Cleanup => "CLEANUP",
            Stage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Rasters written to the caller's output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CostDistanceOutputs {
    /// Accumulated cost in seconds.
    pub cost: PathBuf,
    pub nearest: PathBuf,
    pub backlink: Option<PathBuf>,
}

/// Output file name, `<kind>_<label>.tif` or `<kind>.tif` without a label.
pub fn output_file_name(kind: &str, label: &str) -> String {
    if label.is_empty() {
        format!("{}.tif", kind)
    } else {
        format!("{}_{}.tif", kind, label)
    }
}

/// Drives a [`CostSolver`] over staged inputs.
pub struct CostDistance<S> {
    solver: S,
    config: SolverConfig,
}

impl<S: CostSolver> CostDistance<S> {
    pub fn new(solver: S, config: SolverConfig) -> Self {
        Self { solver, config }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Direction independent accumulation over `friction` (seconds per pixel).
    pub fn isotropic(
        &self,
        friction: &Raster<f64>,
        targets: &Targets,
        dst_dir: &Path,
        label: &str,
    ) -> AccessResult<CostDistanceOutputs> {
        self.run(Direction::Isotropic, friction, None, targets, dst_dir, label)
    }

    /// Walking accumulation over `friction` (seconds per meter) and `elevation`.
    pub fn anisotropic(
        &self,
        friction: &Raster<f64>,
        elevation: &Raster<f64>,
        targets: &Targets,
        dst_dir: &Path,
        label: &str,
    ) -> AccessResult<CostDistanceOutputs> {
        self.run(
            Direction::Anisotropic,
            friction,
            Some(elevation),
            targets,
            dst_dir,
            label,
        )
    }

    fn run(
        &self,
        direction: Direction,
        friction: &Raster<f64>,
        elevation: Option<&Raster<f64>>,
        targets: &Targets,
        dst_dir: &Path,
        label: &str,
    ) -> AccessResult<CostDistanceOutputs> {
        let mut stage = Stage::Init;
        info!(
            stage = %stage,
            solver = self.solver.name(),
            direction = %direction,
            targets = targets.len(),
            label,
            "Starting cost-distance modeling"
        );
        if let Some(elevation) = elevation {
            elevation
                .ensure_aligned(friction.grid())
                .map_err(|e| e.into_access("elevation"))?;
        }
        std::fs::create_dir_all(dst_dir)?;
        let scratch = ScratchWorkspace::create(&self.config.cache_root)?;

        let result = self.stage_and_solve(
            &mut stage, &scratch, direction, friction, elevation, targets, dst_dir, label,
        );

        advance(&mut stage, Stage::Cleanup);
        let cleanup = scratch.close();
        let outputs = match (result, cleanup) {
            (Ok(outputs), Ok(())) => outputs,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(error = %cleanup_err, "Failed to remove scratch workspace");
                }
                error!(error = %e, "Cost-distance modeling failed");
                return Err(e);
            }
        };

        advance(&mut stage, Stage::Done);
        Ok(outputs)
    }

    #[allow(clippy::too_many_arguments)]
    fn stage_and_solve(
        &self,
        stage: &mut Stage,
        scratch: &ScratchWorkspace,
        direction: Direction,
        friction: &Raster<f64>,
        elevation: Option<&Raster<f64>>,
        targets: &Targets,
        dst_dir: &Path,
        label: &str,
    ) -> AccessResult<CostDistanceOutputs> {
        let grid = friction.grid();

        advance(stage, Stage::StageInputs);
        let friction_path = scratch.join("friction.tif");
        write_geotiff(&friction_path, friction, Some(self.config.raster.friction_nodata))
            .map_err(|e| e.into_access("friction"))?;

        let elevation_path = match elevation {
            Some(raster) => {
                let path = scratch.join("elevation.tif");
                write_geotiff(&path, raster, Some(ELEVATION_NODATA))
                    .map_err(|e| e.into_access("elevation"))?;
                Some(path)
            }
            None => None,
        };

        let targets_path = scratch.join("targets.geojson");
        targets.to_crs(grid.crs()).to_collection().write(&targets_path)?;

        advance(stage, Stage::InvokeSolver);
        let env = GisEnvironment::new(scratch.join("grassdata"), grid.crs(), &self.config);
        let request = SolverRequest {
            friction: friction_path,
            elevation: elevation_path,
            targets: targets_path,
            direction,
            output_dir: scratch.join("outputs"),
        };
        let outputs = self.solver.solve(&env, &request)?;

        advance(stage, Stage::CollectOutputs);
        collect_outputs(&outputs, grid, self.config.raster.cost_nodata, dst_dir, label)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    info!(from = %stage, to = %next, "Cost-distance stage");
    *stage = next;
}

fn collect_outputs(
    outputs: &SolverOutputs,
    grid: &Grid,
    nodata: f64,
    dst_dir: &Path,
    label: &str,
) -> AccessResult<CostDistanceOutputs> {
    let copy = |src: &Path, kind: &str| {
        copy_output(src, grid, nodata, &dst_dir.join(output_file_name(kind, label)))
    };
    let cost = copy(&outputs.cost, "cost")?;
    let nearest = copy(&outputs.nearest, "nearest")?;
    let backlink = match &outputs.backlink {
        Some(src) => Some(copy(src, "backlink")?),
        None => None,
    };
    Ok(CostDistanceOutputs {
        cost,
        nearest,
        backlink,
    })
}

/// Re-encode a solver raster into `dst` on the modeling grid.
fn copy_output(src: &Path, grid: &Grid, nodata: f64, dst: &Path) -> AccessResult<PathBuf> {
    let malformed = |reason: String| {
        AccessError::modeling(format!("malformed solver output {}", src.display()), reason)
    };
    let raster = read_geotiff(src).map_err(|e| malformed(e.to_string()))?;
    raster
        .ensure_aligned(grid)
        .map_err(|e| malformed(e.to_string()))?;
    // Solver georeferencing may drift within tolerance; outputs carry the exact grid
    let raster = Raster::new(grid.clone(), raster.into_data()).map_err(|e| malformed(e.to_string()))?;
    write_geotiff(dst, &raster, Some(nodata)).map_err(|e| e.into_access("cost distance"))?;
    info!(src = %src.display(), dst = %dst.display(), "Collected solver output");
    Ok(dst.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::StageInputs.to_string(), "STAGE_INPUTS");
        assert_eq!(Stage::Done.to_string(), "DONE");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("cost", "walk_health"), "cost_walk_health.tif");
        assert_eq!(output_file_name("nearest", ""), "nearest.tif");
    }
}
