use std::fs;
use std::path::Path;
use approx::assert_relative_eq;
use serde_json::json;

use bipvsim::config::simulation_config::SimulationConfig;
use bipvsim::core::multi_simulation::{run_multi_simulation, BatchOptions};
use bipvsim::core::simulation::BuildingOutcome;
use bipvsim::data::buildings_loader::load_buildings;
use bipvsim::data::checkpoint::BuildingCheckpoint;
use bipvsim::data::library_loader::Library;
use bipvsim::models::building::SurfaceKind;
use bipvsim::models::panel::{FailureDraw, FailureSettings};
use bipvsim::utils::csv_export::CsvExporter;
use bipvsim::BipvError;

const HOURS: usize = 24;

fn write_library(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("library.json");
    let library = json!({
        "mono": {
            "id": "mono",
            "type": "pv_technology",
            "panel_area": 1.6,
            "nominal_efficiency": 0.2,
            "efficiency_model": {"kind": "degrading_rate", "initial_efficiency": 0.2, "annual_degradation_rate": 0.005},
            "weibull_law_failure_parameters": {"scale": 22.0, "shape": 5.0, "lifetime": 8},
            "primary_energy_manufacturing": 1500.0,
            "ghg_manufacturing": 350.0,
            "cost_investment": 280.0,
            "weight": 19.0,
            "primary_energy_recycling": 60.0,
            "ghg_recycling": 12.0,
            "cost_recycling": 14.0,
            "revenue_material_recovery": 6.0,
            "primary_energy_annual_maintenance": 2.0,
            "ghg_annual_maintenance": 0.4,
            "cost_annual_maintenance": 2.5,
            "revenue_substituted_construction_material_roof": 30.0,
            "revenue_substituted_construction_material_facades": 55.0,
            "estimated_primary_energy_inverter": 90.0
        },
        "truck": {
            "id": "truck",
            "type": "transportation",
            "gate_to_gate": {"distance_km": 800.0, "primary_energy_per_tkm": 0.7, "ghg_per_tkm": 0.09, "cost_per_tkm": 0.06},
            "recycling": {"distance_km": 150.0, "primary_energy_per_tkm": 0.7, "ghg_per_tkm": 0.09, "cost_per_tkm": 0.06}
        },
        "string": {
            "id": "string",
            "type": "inverter",
            "replacement_frequency": 10,
            "max_unit_capacity_kw": 5.0,
            "primary_energy_per_kw": 140.0,
            "ghg_per_kw": 35.0,
            "cost_per_kw": 95.0
        }
    });
    fs::write(&path, library.to_string()).unwrap();
    path
}

fn write_table(path: &Path, cells: usize, irradiance: f64) {
    let row = vec![irradiance.to_string(); HOURS].join(",");
    let rows: Vec<String> = (0..cells).map(|_| row.clone()).collect();
    fs::write(path, rows.join("\n")).unwrap();
}

fn write_buildings(dir: &Path) -> std::path::PathBuf {
    write_table(&dir.join("b1_roof.csv"), 4, 800.0);
    write_table(&dir.join("b1_facades.csv"), 3, 300.0);
    write_table(&dir.join("b3_roof.csv"), 2, 800.0);
    let path = dir.join("buildings.json");
    let buildings = json!([
        {
            "id": "b1",
            "construction_year": 1985,
            "typology": "residential",
            "height": 12.0,
            "roof": {"face_areas": [2.0, 2.0, 2.0, 0.4], "annual_irradiance": [1400.0, 1400.0, 1400.0, 1400.0], "hourly_irradiance_file": "b1_roof.csv"},
            "facades": {"face_areas": [3.0, 3.0, 3.0], "annual_irradiance": [1000.0, 60.0, 1000.0], "hourly_irradiance_file": "b1_facades.csv"}
        },
        {
            "id": "b2",
            "roof": {"face_areas": [2.0], "annual_irradiance": [1400.0], "hourly_irradiance_file": "missing.csv"}
        },
        {
            "id": "b3",
            "is_target": false,
            "roof": {"face_areas": [2.0, 2.0], "annual_irradiance": [1400.0, 1400.0], "hourly_irradiance_file": "b3_roof.csv"}
        },
        {
            "id": "b4"
        }
    ]);
    fs::write(&path, buildings.to_string()).unwrap();
    path
}

fn config(end_year: u32) -> SimulationConfig {
    let mut config = SimulationConfig {
        uc_start_year: 2024,
        uc_current_year: 2024,
        uc_end_year: end_year,
        failure: FailureSettings { draw: FailureDraw::ExpectedLifetime, seed: 1 },
        ..SimulationConfig::default()
    };
    for id in [&mut config.bipv.roof_pv_tech_id, &mut config.bipv.facades_pv_tech_id] {
        *id = "mono".to_string();
    }
    for id in [&mut config.bipv.roof_transport_id, &mut config.bipv.facades_transport_id] {
        *id = "truck".to_string();
    }
    for id in [&mut config.bipv.roof_inverter_id, &mut config.bipv.facades_inverter_id] {
        *id = "string".to_string();
    }
    config
}

#[test]
fn batch_simulates_targets_and_skips_missing_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::load(&[write_library(dir.path())]).unwrap();
    let buildings = load_buildings(write_buildings(dir.path())).unwrap();
    let config = config(2044);
    let options = BatchOptions { parallel: true, ..BatchOptions::default() };

    let outcomes = run_multi_simulation(&buildings, &library, &config, &options).unwrap();
    let ids: Vec<&str> = outcomes.iter().map(|outcome| outcome.building_id()).collect();
    assert_eq!(ids, vec!["b1", "b2", "b4"]);
    assert!(matches!(outcomes[1], BuildingOutcome::Skipped { .. }));
    assert!(matches!(outcomes[2], BuildingOutcome::Skipped { .. }));

    let report = outcomes[0].report().unwrap();
    let roof = report.surface(SurfaceKind::Roof).unwrap();
    let facades = report.surface(SurfaceKind::Facades).unwrap();
    assert_eq!(roof.nb_panels, 3);
    // the facade cell at 60 kWh/m2/year does not pay back its embodied energy
    assert_eq!(facades.nb_panels, 2);

    let total = &report.results.total;
    assert_eq!(total.years, (2024..2044).collect::<Vec<u32>>());
    assert_eq!(total.nb_new_panels[0], 5);
    // every panel fails at 8 and is replaced on the next multiple of 5, then fails again at 18
    assert_eq!(total.nb_new_panels[10], 5);
    assert_eq!(total.nb_new_panels.iter().sum::<usize>(), 10);
    assert_relative_eq!(
        report.summary.total_energy_harvested,
        total.energy_harvested.iter().sum::<f64>(),
        epsilon = 1e-6
    );
    assert!(report.summary.total_primary_energy > 0.0);

    let exporter = CsvExporter::new(dir.path().join("out"), false).unwrap();
    exporter.export_outcomes(&outcomes).unwrap();
    let building_dir = exporter.output_dir().join("b1");
    let mut reader = csv::Reader::from_path(building_dir.join("results.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "year");
    assert_eq!(&headers[1], "surface");
    let rows = reader.records().count();
    assert_eq!(rows, 3 * 20);
    assert!(building_dir.join("results.json").is_file());
    assert!(!exporter.output_dir().join("b2").exists());

    let mut summary = csv::Reader::from_path(exporter.output_dir().join("summary.csv")).unwrap();
    assert_eq!(summary.records().count(), 3);
}

#[test]
fn resumed_batch_continues_from_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::load(&[write_library(dir.path())]).unwrap();
    let buildings = load_buildings(write_buildings(dir.path())).unwrap();
    let checkpoint_dir = dir.path().join("checkpoints");
    let options = BatchOptions {
        parallel: false,
        building_ids: vec!["b1".to_string()],
        checkpoint_dir: Some(checkpoint_dir.clone()),
        ..BatchOptions::default()
    };

    let full = run_multi_simulation(&buildings, &library, &config(2044), &BatchOptions {
        checkpoint_dir: None,
        ..options.clone()
    })
    .unwrap();

    run_multi_simulation(&buildings, &library, &config(2031), &options).unwrap();
    let stored = BuildingCheckpoint::load(&checkpoint_dir, "b1").unwrap().unwrap();
    assert_eq!(stored.roof.as_ref().map(|fleet| fleet.current_study_duration_in_years), Some(7));

    let resumed_config = SimulationConfig { continue_simulation: true, ..config(2044) };
    let resumed = run_multi_simulation(&buildings, &library, &resumed_config, &options).unwrap();

    let full = full[0].report().unwrap();
    let resumed = resumed[0].report().unwrap();
    let (expected, actual) = (&full.results.total, &resumed.results.total);
    assert_eq!(actual.years, expected.years);
    assert_eq!(actual.nb_new_panels, expected.nb_new_panels);
    for ((name, expected), (_, actual)) in expected.named_series().into_iter().zip(actual.named_series()) {
        for (e, a) in expected.iter().zip(actual) {
            assert_relative_eq!(*a, *e, epsilon = 1e-9, max_relative = 1e-12);
        }
        assert_eq!(expected.len(), actual.len(), "{}", name);
    }
    assert!(resumed.surfaces.iter().all(|surface| surface.resumed));
}

#[test]
fn surface_enabled_after_the_checkpoint_joins_the_resumed_years() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::load(&[write_library(dir.path())]).unwrap();
    let buildings = load_buildings(write_buildings(dir.path())).unwrap();
    let checkpoint_dir = dir.path().join("checkpoints");
    let options = BatchOptions {
        parallel: false,
        building_ids: vec!["b1".to_string()],
        checkpoint_dir: Some(checkpoint_dir.clone()),
        ..BatchOptions::default()
    };

    let roof_only = SimulationConfig { bipv_on_facades: false, ..config(2031) };
    run_multi_simulation(&buildings, &library, &roof_only, &options).unwrap();
    let stored = BuildingCheckpoint::load(&checkpoint_dir, "b1").unwrap().unwrap();
    assert!(stored.facades.is_none());

    let resumed_config = SimulationConfig { continue_simulation: true, ..config(2044) };
    let outcomes = run_multi_simulation(&buildings, &library, &resumed_config, &options).unwrap();
    let report = outcomes[0].report().expect("b1 is resumed, not skipped");
    assert!(report.surface(SurfaceKind::Roof).unwrap().resumed);
    assert!(!report.surface(SurfaceKind::Facades).unwrap().resumed);

    let years: Vec<u32> = (2024..2044).collect();
    let roof = report.results.roof.as_ref().unwrap();
    let facades = report.results.facades.as_ref().unwrap();
    assert_eq!(roof.years, years);
    assert_eq!(facades.years, years);
    assert_eq!(report.results.total.years, years);
    // facades are installed in the first resumed year
    assert!(facades.nb_new_panels[..7].iter().all(|n| *n == 0));
    assert!(facades.energy_harvested[..7].iter().all(|e| *e == 0.0));
    assert_eq!(facades.nb_new_panels[7], 2);
    assert!(facades.energy_harvested[7] > 0.0);
    for i in 0..years.len() {
        assert_eq!(report.results.total.energy_harvested[i], roof.energy_harvested[i] + facades.energy_harvested[i]);
    }

    let stored = BuildingCheckpoint::load(&checkpoint_dir, "b1").unwrap().unwrap();
    assert_eq!(stored.facades.as_ref().map(|fleet| fleet.start_year), Some(2031));
    assert_eq!(stored.results.total.years, years);
}

#[test]
fn surface_disabled_after_the_checkpoint_is_padded() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::load(&[write_library(dir.path())]).unwrap();
    let buildings = load_buildings(write_buildings(dir.path())).unwrap();
    let checkpoint_dir = dir.path().join("checkpoints");
    let options = BatchOptions {
        parallel: false,
        building_ids: vec!["b1".to_string()],
        checkpoint_dir: Some(checkpoint_dir),
        ..BatchOptions::default()
    };

    run_multi_simulation(&buildings, &library, &config(2031), &options).unwrap();
    let resumed_config = SimulationConfig { continue_simulation: true, bipv_on_facades: false, ..config(2044) };
    let outcomes = run_multi_simulation(&buildings, &library, &resumed_config, &options).unwrap();
    let report = outcomes[0].report().expect("b1 is resumed, not skipped");
    assert!(report.surface(SurfaceKind::Facades).is_none());

    let facades = report.results.facades.as_ref().unwrap();
    assert_eq!(facades.years, (2024..2044).collect::<Vec<u32>>());
    assert!(facades.energy_harvested[..7].iter().all(|e| *e > 0.0));
    assert!(facades.energy_harvested[7..].iter().all(|e| *e == 0.0));
    assert_eq!(report.results.total.len(), 20);
}

#[test]
fn unknown_library_id_aborts_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::load(&[write_library(dir.path())]).unwrap();
    let buildings = load_buildings(write_buildings(dir.path())).unwrap();
    let mut config = config(2044);
    config.bipv.facades_inverter_id = "central".to_string();

    let err = run_multi_simulation(&buildings, &library, &config, &BatchOptions::default()).unwrap_err();
    assert!(matches!(err, BipvError::UnknownLibraryId { .. }));
}
