//! GRASS GIS solver (`r.cost` / `r.walk`) driven through its command line.

use crate::environment::GisEnvironment;
use crate::solver::{CostSolver, Direction, SolverOutputs, SolverRequest};
use access_common::{AccessError, AccessResult};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// One solver process invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverCommand {
    pub description: &'static str,
    pub args: Vec<OsString>,
    /// Failure is logged instead of aborting the call.
    pub optional: bool,
}

impl SolverCommand {
    fn new(description: &'static str, args: Vec<OsString>) -> Self {
        Self {
            description,
            args,
            optional: false,
        }
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Runs `r.cost` or `r.walk` through the `grass` executable.
#[derive(Debug, Clone, Default)]
pub struct GrassSolver;

impl GrassSolver {
    pub fn new() -> Self {
        Self
    }

    /// The full command sequence for `request`, in execution order.
    pub fn commands(env: &GisEnvironment, request: &SolverRequest) -> AccessResult<Vec<SolverCommand>> {
        let mapset = env.mapset_path();
        let exec = |module: &str, params: Vec<String>| -> Vec<OsString> {
            let mut args: Vec<OsString> = vec![mapset.clone().into(), "--exec".into(), module.into()];
            args.extend(params.into_iter().map(OsString::from));
            args
        };
        let path = |p: &Path| p.display().to_string();
        let memory = format!("memory={}", env.memory_mb);

        let mut commands = vec![
            SolverCommand::new(
                "create location",
                vec![
                    "-c".into(),
                    format!("EPSG:{}", env.crs.epsg()).into(),
                    "-e".into(),
                    env.location_path().into(),
                ],
            ),
            SolverCommand::new(
                "import friction",
                exec(
                    "r.in.gdal",
                    vec![
                        format!("input={}", path(&request.friction)),
                        "output=friction".into(),
                        "--overwrite".into(),
                    ],
                ),
            ),
            SolverCommand::new("set region", exec("g.region", vec!["raster=friction".into()])),
        ];

        if request.direction == Direction::Anisotropic {
            let elevation = request.elevation.as_deref().ok_or_else(|| {
                AccessError::configuration("anisotropic cost distance requires an elevation raster")
            })?;
            commands.push(SolverCommand::new(
                "import elevation",
                exec(
                    "r.in.gdal",
                    vec![
                        format!("input={}", path(elevation)),
                        "output=elevation".into(),
                        "--overwrite".into(),
                    ],
                ),
            ));
        }

        commands.push(SolverCommand::new(
            "import targets",
            exec(
                "v.in.ogr",
                vec![
                    format!("input={}", path(&request.targets)),
                    "output=target".into(),
                    "-o".into(),
                    "--overwrite".into(),
                ],
            ),
        ));

        let outputs = [
            "output=cost".to_string(),
            "nearest=nearest".to_string(),
            "outdir=backlink".to_string(),
            "start_points=target".to_string(),
            memory,
        ];
        commands.push(match request.direction {
            Direction::Isotropic => SolverCommand::new(
                "accumulate cost",
                exec(
                    "r.cost",
                    ["-kn".to_string(), "input=friction".to_string()]
                        .into_iter()
                        .chain(outputs)
                        .collect(),
                ),
            ),
            Direction::Anisotropic => SolverCommand::new(
                "accumulate walking cost",
                exec(
                    "r.walk",
                    [
                        "-kn".to_string(),
                        "friction=friction".to_string(),
                        "elevation=elevation".to_string(),
                    ]
                    .into_iter()
                    .chain(outputs)
                    .collect(),
                ),
            ),
        });

        for name in ["cost", "nearest", "backlink"] {
            let export = SolverCommand::new(
                "export output",
                exec(
                    "r.out.gdal",
                    vec![
                        format!("input={}", name),
                        format!("output={}", path(&request.output_dir.join(format!("{}.tif", name)))),
                        "format=GTiff".into(),
                        format!("nodata={}", env.cost_nodata),
                        "--overwrite".into(),
                    ],
                ),
            );
            let best_effort = name == "backlink" && request.direction == Direction::Anisotropic;
            commands.push(if best_effort { export.optional() } else { export });
        }
        Ok(commands)
    }

    fn run(env: &GisEnvironment, command: &SolverCommand) -> AccessResult<()> {
        info!(
            step = command.description,
            executable = %env.executable.display(),
            args = ?command.args,
            "Running solver command"
        );
        let output = Command::new(&env.executable)
            .args(&command.args)
            .output()
            .map_err(|e| {
                AccessError::modeling(
                    format!("failed to run {}", env.executable.display()),
                    e.to_string(),
                )
            })?;

        debug!(
            step = command.description,
            stdout = %String::from_utf8_lossy(&output.stdout),
            "Solver command finished"
        );
        if !output.status.success() {
            return Err(AccessError::modeling(
                format!("{} failed with {}", command.description, output.status),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

impl CostSolver for GrassSolver {
    fn name(&self) -> &str {
        "grass"
    }

    fn solve(&self, env: &GisEnvironment, request: &SolverRequest) -> AccessResult<SolverOutputs> {
        std::fs::create_dir_all(env.gisdbase())?;
        std::fs::create_dir_all(&request.output_dir)?;

        let mut backlink_ok = true;
        for command in Self::commands(env, request)? {
            match Self::run(env, &command) {
                Ok(()) => {}
                Err(AccessError::Modeling { message, diagnostics }) if command.optional => {
                    warn!(step = command.description, %message, %diagnostics, "Optional solver step failed");
                    backlink_ok = false;
                }
                Err(e) => return Err(e),
            }
        }

        let backlink = request.output_dir.join("backlink.tif");
        Ok(SolverOutputs {
            cost: request.output_dir.join("cost.tif"),
            nearest: request.output_dir.join("nearest.tif"),
            backlink: (backlink_ok && backlink.is_file()).then_some(backlink),
        })
    }
}
