//! Least-cost-path solver orchestration.
//!
//! The solver itself is external. This crate stages the friction surface,
//! optional elevation and target points into a scratch workspace, invokes a
//! [`CostSolver`], and copies the accumulated-cost, nearest-target and
//! backlink rasters back out with a fixed nodata sentinel.

pub mod environment;
pub mod grass;
pub mod orchestrator;
pub mod solver;
pub mod targets;
pub mod workspace;

pub use environment::{GisEnvironment, SolverConfig};
pub use grass::{GrassSolver, SolverCommand};
pub use orchestrator::{output_file_name, CostDistance, CostDistanceOutputs, Stage};
pub use solver::{CostSolver, Direction, SolverOutputs, SolverRequest};
pub use targets::Targets;
pub use workspace::ScratchWorkspace;
