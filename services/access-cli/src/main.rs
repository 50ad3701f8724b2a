//! Accessibility modeling command line.
//!
//! Builds the analysis grid, friction surfaces and travel-time rasters for
//! one area of interest, then aggregates population accessibility per zone.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use access_cli::pipeline::{build_session, compute_access, compute_friction, open_session};
use access_cli::{AccessConfig, ModeFlags};
use access_common::{AccessError, CrsCode};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use cost_distance::{CostDistance, GrassSolver};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "access")]
#[command(about = "Accessibility modeling: friction surfaces, travel times and zonal statistics")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "ACCESS_CONFIG")]
    config: Option<PathBuf>,

    /// Input layer directory (overrides the configuration)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory (overrides the configuration)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write logs to access-<timestamp>.log in this directory
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Log as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the analysis grid and write meta.json
    Grid {
        /// Country or region label
        #[arg(long)]
        country: Option<String>,

        /// Pixel size in CRS units
        #[arg(long)]
        resolution: Option<f64>,

        /// Projected CRS, e.g. EPSG:3857 or EPSG:32628
        #[arg(long)]
        crs: Option<String>,
    },

    /// Compute friction surfaces
    Friction(ModeFlags),

    /// Compute friction, travel times and accessibility statistics
    Access(ModeFlags),
}

fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if let Err(e) = init_tracing(&args) {
        eprintln!("failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<AccessError>().map_or(1, AccessError::exit_code);
            let kind = e.downcast_ref::<AccessError>().map_or("other", AccessError::kind);
            error!(kind, error = %format!("{:#}", e), "Run failed");
            ExitCode::from(code as u8)
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let writer = match &args.logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create logs directory {:?}", dir))?;
            let path = dir.join(format!("access-{}.log", Utc::now().format("%Y%m%d-%H%M%S")));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(writer);

    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AccessConfig> {
    let mut config = match &args.config {
        Some(path) => AccessConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => AccessConfig::default(),
    };
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    info!(
        country = %config.country,
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        "Starting accessibility modeling"
    );

    match &args.command {
        Command::Grid {
            country,
            resolution,
            crs,
        } => {
            if let Some(country) = country {
                config.country = country.clone();
            }
            if let Some(resolution) = resolution {
                config.grid.resolution = *resolution;
            }
            if let Some(crs) = crs {
                config.grid.crs = CrsCode::parse(crs)
                    .map_err(|e| AccessError::configuration(e.to_string()))?;
            }
            config.validate().map_err(AccessError::configuration)?;

            let session = build_session(&config).context("Failed to build analysis grid")?;
            info!(
                rows = session.grid().height(),
                cols = session.grid().width(),
                crs = %session.grid().crs(),
                "Analysis grid ready"
            );
        }
        Command::Friction(flags) => {
            let modes = flags.resolve(&config.modes);
            let session = open_session(&config)?;
            let frictions = compute_friction(&config, &session, &modes)?;
            info!(modes = ?modes, written = frictions.len(), "Friction surfaces ready");
        }
        Command::Access(flags) => {
            let modes = flags.resolve(&config.modes);
            let session = open_session(&config)?;
            let frictions = compute_friction(&config, &session, &modes)?;
            let orchestrator = CostDistance::new(GrassSolver::new(), config.solver.clone());
            let reports = compute_access(&config, &session, &frictions, &orchestrator)?;
            info!(reports = reports.len(), "Accessibility statistics ready");
        }
    }

    info!("Accessibility modeling completed");
    Ok(())
}
