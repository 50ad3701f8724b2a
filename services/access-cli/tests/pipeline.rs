//! Full run over a synthetic input directory with an in-process solver.

use access_cli::pipeline::{build_session, compute_access, compute_friction, open_session};
use access_cli::AccessConfig;
use access_common::{AccessError, AccessResult, CrsCode};
use accessibility::AccessibilityReport;
use cost_distance::{CostDistance, CostSolver, GisEnvironment, SolverConfig, SolverOutputs, SolverRequest};
use cost_surface::landcover::layer_file_name;
use cost_surface::{LandCoverClass, Session, TransportMode};
use raster_io::{read_geotiff, write_geotiff};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use test_utils::{
    aoi, assert_approx_eq, extent_feature, line_feature, point_feature, uniform_raster,
    write_features, write_raster,
};

const SPEEDS: &str = r#"{
    "land-cover": {"tree": 4},
    "transport": {
        "highway": {"residential": 50},
        "surface": {"unpaved": 0.5},
        "route": {"ferry": 10}
    }
}"#;

/// Accumulated cost equal to the friction of the pixel itself.
struct EchoSolver;

impl CostSolver for EchoSolver {
    fn name(&self) -> &str {
        "echo"
    }

    fn solve(&self, _env: &GisEnvironment, request: &SolverRequest) -> AccessResult<SolverOutputs> {
        std::fs::create_dir_all(&request.output_dir)?;
        let friction = read_geotiff(&request.friction)?;
        let out = |name: &str| request.output_dir.join(name);
        write_geotiff(&out("cost.tif"), &friction, Some(-1.0))?;
        write_geotiff(&out("nearest.tif"), &friction.map(|_| 1.0), None)?;
        Ok(SolverOutputs {
            cost: out("cost.tif"),
            nearest: out("nearest.tif"),
            backlink: None,
        })
    }
}

struct Run {
    _dir: TempDir,
    config: AccessConfig,
}

fn setup() -> Run {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();

    let mut config = AccessConfig {
        country: "TST".to_string(),
        input_dir: input.clone(),
        output_dir: dir.path().join("output"),
        speeds: Some(PathBuf::from("speeds.json")),
        solver: SolverConfig {
            cache_root: dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };
    config.grid.resolution = 1000.0;
    config.access.levels = vec![5, 30];

    std::fs::write(input.join("speeds.json"), SPEEDS).unwrap();
    write_features(&input, "aoi.geojson", vec![extent_feature(aoi::EQUATOR, &[])], CrsCode::Epsg4326);
    Run { _dir: dir, config }
}

fn write_layers(input: &Path, session: &Session) {
    let grid = session.grid();
    write_raster(input, &layer_file_name(LandCoverClass::Tree), &uniform_raster(grid, 100.0), Some(-1.0));
    write_raster(input, "water_osm.tif", &uniform_raster(grid, 0.0), None);
    write_raster(input, "water_gsw.tif", &uniform_raster(grid, 0.0), None);
    write_raster(input, "slope.tif", &uniform_raster(grid, 0.0), None);
    write_raster(input, "population.tif", &uniform_raster(grid, 1.0), None);

    let b = grid.bounds();
    let y = b.max_y - 5.5 * 1000.0;
    write_features(
        input,
        "roads.geojson",
        vec![line_feature(
            &[(b.min_x + 1.0, y), (b.max_x - 1.0, y)],
            &[("highway", "residential"), ("surface", "unpaved")],
        )],
        CrsCode::Epsg3857,
    );
    write_features(
        input,
        "areas.geojson",
        vec![extent_feature((b.min_x, b.min_y, b.max_x, b.max_y), &[("GID_2", "all")])],
        CrsCode::Epsg3857,
    );
    write_features(input, "health.geojson", vec![point_feature(0.0, 0.0, &[])], CrsCode::Epsg4326);
}

#[test]
fn test_session_is_built_once() {
    let run = setup();
    let built = build_session(&run.config).unwrap();
    assert_eq!(built.grid().shape(), (12, 12));
    assert!(run.config.output_dir.join("meta.json").is_file());

    let reopened = open_session(&run.config).unwrap();
    assert_eq!(reopened.grid(), built.grid());
    assert_eq!(reopened.created_at(), built.created_at());
}

#[test]
fn test_friction_surfaces_are_written() {
    let run = setup();
    let session = build_session(&run.config).unwrap();
    write_layers(&run.config.input_dir, &session);

    let frictions =
        compute_friction(&run.config, &session, &[TransportMode::Car, TransportMode::Walk]).unwrap();
    assert_eq!(frictions.len(), 2);

    let walk = read_geotiff(&run.config.output_dir.join("friction_walk.tif")).unwrap();
    assert_eq!(walk.grid(), session.grid());
    assert_approx_eq!(walk.get(0, 0).unwrap(), 0.9, 1e-9);

    let car = read_geotiff(&run.config.output_dir.join("friction_car.tif")).unwrap();
    assert_approx_eq!(car.get(0, 0).unwrap(), 900.0, 1e-6);
    assert_approx_eq!(car.get(5, 3).unwrap(), 144.0, 1e-6);

    let obstacles = read_geotiff(&run.config.output_dir.join("obstacles.tif")).unwrap();
    assert!(obstacles.data().iter().all(|v| *v == 0.0));
}

#[test]
fn test_access_report_counts_reachable_population() {
    let run = setup();
    let session = build_session(&run.config).unwrap();
    write_layers(&run.config.input_dir, &session);

    let frictions = compute_friction(&run.config, &session, &[TransportMode::Car]).unwrap();
    let orchestrator = CostDistance::new(EchoSolver, run.config.solver.clone());
    let reports = compute_access(&run.config, &session, &frictions, &orchestrator).unwrap();
    assert_eq!(reports, vec![run.config.output_dir.join("access_car_health.json")]);

    for name in ["cost_car_health.tif", "nearest_car_health.tif", "travel_time_car_health.tif"] {
        assert!(run.config.output_dir.join(name).is_file(), "{} missing", name);
    }
    let minutes = read_geotiff(&run.config.output_dir.join("travel_time_car_health.tif")).unwrap();
    assert_approx_eq!(minutes.get(0, 0).unwrap(), 15.0, 1e-9);

    let report: AccessibilityReport =
        serde_json::from_str(&std::fs::read_to_string(&reports[0]).unwrap()).unwrap();
    let zone = report.zone("all").unwrap();
    assert_eq!(zone.population, 144.0);
    // Only the road row is within 5 minutes
    assert_eq!(zone.levels[0].population, 12.0);
    assert_eq!(zone.levels[1].population, 144.0);
}

#[test]
fn test_walk_without_elevation_is_missing_data() {
    let run = setup();
    let session = build_session(&run.config).unwrap();
    write_layers(&run.config.input_dir, &session);

    let frictions = compute_friction(&run.config, &session, &[TransportMode::Walk]).unwrap();
    let orchestrator = CostDistance::new(EchoSolver, run.config.solver.clone());
    let err = compute_access(&run.config, &session, &frictions, &orchestrator).unwrap_err();
    assert!(matches!(err, AccessError::MissingData { ref layer, .. } if layer == "elevation"));
}
