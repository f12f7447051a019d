use std::path::Path;
use std::sync::Arc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::analysis::lca::LcaCostAggregator;
use crate::analysis::metrics::ResultsSummary;
use crate::analysis::results::{BuildingResults, SurfaceResults};
use crate::config::simulation_config::SimulationConfig;
use crate::core::fleet::{FleetSimulator, FleetState};
use crate::core::replacement::ReplacementScenario;
use crate::core::screening::screen_panels;
use crate::data::buildings_loader::load_irradiance_table;
use crate::data::checkpoint::BuildingCheckpoint;
use crate::data::library_loader::Library;
use crate::error::Result;
use crate::models::building::{BuildingModeled, SurfaceKind};
use crate::utils::logging::{self, OperationCategory};

/// Per surface figures shown in the console and the summary export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceReport {
    pub surface: SurfaceKind,
    pub technology_id: String,
    pub nb_candidate_cells: usize,
    pub nb_panels: usize,
    pub inverter_capacity: f64, // W
    pub resumed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingReport {
    pub building_id: String,
    pub surfaces: Vec<SurfaceReport>,
    pub results: BuildingResults,
    pub summary: ResultsSummary,
}

impl BuildingReport {
    pub fn surface(&self, surface: SurfaceKind) -> Option<&SurfaceReport> {
        self.surfaces.iter().find(|report| report.surface == surface)
    }

    pub fn nb_panels(&self) -> usize {
        self.surfaces.iter().map(|report| report.nb_panels).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildingOutcome {
    Simulated(BuildingReport),
    Skipped { building_id: String, reason: String },
}

impl BuildingOutcome {
    pub fn building_id(&self) -> &str {
        match self {
            BuildingOutcome::Simulated(report) => &report.building_id,
            BuildingOutcome::Skipped { building_id, .. } => building_id,
        }
    }

    pub fn report(&self) -> Option<&BuildingReport> {
        match self {
            BuildingOutcome::Simulated(report) => Some(report),
            BuildingOutcome::Skipped { .. } => None,
        }
    }
}

enum SurfaceRun {
    Simulated {
        report: SurfaceReport,
        fleet: FleetState,
        results: SurfaceResults,
    },
    Missing(String),
}

/// Simulates the enabled surfaces of one building, resuming from its checkpoint when asked to.
pub struct BuildingSimulator<'a> {
    config: &'a SimulationConfig,
    scenario: &'a ReplacementScenario,
    library: &'a Library,
    checkpoint_dir: Option<&'a Path>,
}

impl<'a> BuildingSimulator<'a> {
    pub fn new(config: &'a SimulationConfig, scenario: &'a ReplacementScenario, library: &'a Library) -> Self {
        Self {
            config,
            scenario,
            library,
            checkpoint_dir: None,
        }
    }

    pub fn with_checkpoint_dir(mut self, checkpoint_dir: &'a Path) -> Self {
        self.checkpoint_dir = Some(checkpoint_dir);
        self
    }

    pub fn simulate(&self, building: &BuildingModeled) -> Result<BuildingOutcome> {
        let _timing = logging::start_timing("simulate_building", OperationCategory::Simulation);

        let checkpoint = match (self.config.continue_simulation, self.checkpoint_dir) {
            (true, Some(dir)) => BuildingCheckpoint::load(dir, &building.id)?,
            _ => None,
        };
        // surfaces absent from the checkpoint join the others in the year they resume
        let new_fleet_start_year = checkpoint
            .as_ref()
            .and_then(|checkpoint| checkpoint.results.total.years.last())
            .map_or(self.config.uc_current_year, |last| last + 1);

        let runs = self
            .config
            .enabled_surfaces()
            .into_par_iter()
            .map(|surface| {
                let stored = checkpoint.as_ref().and_then(|checkpoint| checkpoint.fleet(surface));
                self.simulate_surface(building, surface, stored, new_fleet_start_year)
                    .map(|run| (surface, run))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut reports = Vec::new();
        let mut fleets: (Option<FleetState>, Option<FleetState>) = (
            checkpoint.as_ref().and_then(|c| c.roof.clone()),
            checkpoint.as_ref().and_then(|c| c.facades.clone()),
        );
        let mut newer: (Option<SurfaceResults>, Option<SurfaceResults>) = (None, None);
        let mut missing = Vec::new();
        for (surface, run) in runs {
            match run {
                SurfaceRun::Simulated { report, fleet, results } => {
                    reports.push(report);
                    match surface {
                        SurfaceKind::Roof => {
                            fleets.0 = Some(fleet);
                            newer.0 = Some(results);
                        }
                        SurfaceKind::Facades => {
                            fleets.1 = Some(fleet);
                            newer.1 = Some(results);
                        }
                    }
                }
                SurfaceRun::Missing(reason) => missing.push(format!("{}: {}", surface, reason)),
            }
        }

        if reports.is_empty() {
            let reason = if missing.is_empty() {
                "no surface enabled for BIPV".to_string()
            } else {
                missing.join("; ")
            };
            info!(target: "user", "Building {} skipped: {}", building.id, reason);
            return Ok(BuildingOutcome::Skipped {
                building_id: building.id.clone(),
                reason,
            });
        }

        let newer = BuildingResults::from_surfaces(newer.0, newer.1)?;
        let results = match checkpoint {
            Some(checkpoint) => {
                let mut stored = checkpoint.results;
                stored.append(newer)?;
                stored
            }
            None => newer,
        };

        if let Some(dir) = self.checkpoint_dir {
            BuildingCheckpoint::new(&building.id, fleets.0, fleets.1, results.clone()).save(dir)?;
        }

        let summary = ResultsSummary::from_results(&results.total, self.config.country_ghg_intensity);
        debug!(
            target: "dev",
            building = %building.id,
            surfaces = reports.len(),
            years = results.total.len(),
            energy_kwh = summary.total_energy_harvested,
            "building simulated"
        );
        Ok(BuildingOutcome::Simulated(BuildingReport {
            building_id: building.id.clone(),
            surfaces: reports,
            results,
            summary,
        }))
    }

    fn simulate_surface(
        &self,
        building: &BuildingModeled,
        surface: SurfaceKind,
        stored: Option<&FleetState>,
        new_fleet_start_year: u32,
    ) -> Result<SurfaceRun> {
        let grid = match building.grid(surface) {
            Some(grid) => grid,
            None => return Ok(missing_input(building, surface, "no sensor grid was generated")),
        };
        let path = match &grid.hourly_irradiance_file {
            Some(path) => path,
            None => return Ok(missing_input(building, surface, "no hourly irradiance was computed")),
        };
        if !path.is_file() {
            let reason = format!("hourly irradiance file {} not found", path.display());
            return Ok(missing_input(building, surface, &reason));
        }
        let table = match load_irradiance_table(path) {
            Ok(table) => table,
            Err(err) => {
                let reason = format!("invalid hourly irradiance file {}: {}", path.display(), err);
                return Ok(missing_input(building, surface, &reason));
            }
        };

        let bipv = &self.config.bipv;
        let technology = self.library.technology(bipv.pv_tech_id(surface))?;
        let transportation = self.library.transportation(bipv.transport_id(surface))?;
        let inverter = self.library.inverter(bipv.inverter_id(surface))?;

        let (mut fleet, resumed) = match stored {
            Some(state) => {
                let mut fleet = FleetSimulator::from_state(state, self.config.failure, |id| self.library.technology(id))?;
                if self.config.update_panel_technology {
                    fleet.set_technology(Arc::clone(&technology));
                }
                (fleet, true)
            }
            None => {
                grid.validate()?;
                let screening = screen_panels(
                    &grid.face_areas,
                    &grid.annual_irradiance,
                    &technology,
                    &transportation,
                    bipv.minimum_panel_eroi,
                )?;
                screening.log_warnings(&building.id, surface);
                let fleet = FleetSimulator::new(
                    surface,
                    Arc::clone(&technology),
                    &screening.accepted,
                    new_fleet_start_year,
                    self.config.failure,
                )
                .with_inverter_sizing_ratio(bipv.inverter_sizing_ratio(surface));
                (fleet, false)
            }
        };

        let states = fleet.run(&table, self.config.uc_start_year, self.config.uc_end_year, self.scenario)?;
        let results = LcaCostAggregator::new(
            fleet.technology(),
            &transportation,
            &inverter,
            surface,
            fleet.start_year(),
            fleet.inverter_capacity(),
        )
        .aggregate(&states);

        Ok(SurfaceRun::Simulated {
            report: SurfaceReport {
                surface,
                technology_id: fleet.technology().id.clone(),
                nb_candidate_cells: grid.len(),
                nb_panels: fleet.nb_panels(),
                inverter_capacity: fleet.inverter_capacity(),
                resumed,
            },
            fleet: fleet.to_state(),
            results,
        })
    }
}

fn missing_input(building: &BuildingModeled, surface: SurfaceKind, reason: &str) -> SurfaceRun {
    info!(target: "user", "No simulation for the {} of building {}: {}", surface, building.id, reason);
    info!(
        target: "dev",
        building = %building.id,
        surface = %surface,
        reason,
        "surface skipped for missing input"
    );
    SurfaceRun::Missing(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::HOURS_PER_YEAR;
    use crate::core::replacement::ReplacementPolicy;
    use crate::models::building::{BuildingBasic, SurfaceGrid};
    use crate::models::inverter::Inverter;
    use crate::models::panel::FailureSettings;
    use crate::models::technology::tests::{technology, transportation};
    use crate::models::technology::EfficiencyModel;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn library() -> Library {
        let mut library = Library::default();
        let mut tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        tech.id = "tech".to_string();
        library.add_technology(tech).unwrap();
        let mut transport = transportation();
        transport.id = "truck".to_string();
        library.add_transportation(transport).unwrap();
        library
            .add_inverter(Inverter {
                id: "central".to_string(),
                replacement_frequency: 10,
                max_unit_capacity_kw: 50.0,
                primary_energy_per_kw: 150.0,
                ghg_per_kw: 40.0,
                cost_per_kw: 100.0,
                fixed_cost_per_unit: 0.0,
            })
            .unwrap();
        library
    }

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig {
            uc_start_year: 2024,
            uc_current_year: 2024,
            uc_end_year: 2034,
            bipv_on_facades: false,
            failure: FailureSettings::never(),
            ..SimulationConfig::default()
        };
        config.bipv.roof_pv_tech_id = "tech".to_string();
        config.bipv.roof_transport_id = "truck".to_string();
        config.bipv.roof_inverter_id = "central".to_string();
        config.replacement.replacement_scenario = ReplacementPolicy::NoReplacement.id().to_string();
        config
    }

    fn building(file: Option<PathBuf>) -> BuildingModeled {
        let basic = BuildingBasic {
            id: "b1".to_string(),
            ..BuildingBasic::default()
        };
        let mut building = BuildingModeled::from_basic(basic, true);
        building.set_grid(
            SurfaceKind::Roof,
            SurfaceGrid {
                face_areas: vec![2.0, 2.0, 0.5],
                annual_irradiance: vec![1500.0, 1500.0, 1500.0],
                hourly_irradiance_file: file,
            },
        );
        building
    }

    fn write_table(dir: &Path) -> PathBuf {
        let path = dir.join("roof.csv");
        let row = vec!["500"; HOURS_PER_YEAR].join(",");
        std::fs::write(&path, format!("{}\n{}\n{}\n", row, row, row)).unwrap();
        path
    }

    #[test]
    fn missing_irradiance_file_skips_the_building() {
        let config = config();
        let scenario = config.validate().unwrap();
        let library = library();
        let simulator = BuildingSimulator::new(&config, &scenario, &library);
        let outcome = simulator.simulate(&building(Some(PathBuf::from("/nonexistent/roof.csv")))).unwrap();
        assert!(matches!(outcome, BuildingOutcome::Skipped { .. }));
        let outcome = simulator.simulate(&building(None)).unwrap();
        assert!(matches!(outcome, BuildingOutcome::Skipped { .. }));
    }

    #[test]
    fn roof_is_screened_and_simulated() {
        let dir = tempfile::tempdir().unwrap();
        let config = config();
        let scenario = config.validate().unwrap();
        let library = library();
        let simulator = BuildingSimulator::new(&config, &scenario, &library);
        let outcome = simulator.simulate(&building(Some(write_table(dir.path())))).unwrap();
        let report = outcome.report().unwrap();

        let roof = report.surface(SurfaceKind::Roof).unwrap();
        // the 0.5 m2 face cannot hold a 1.6 m2 panel
        assert_eq!(roof.nb_panels, 2);
        assert_eq!(roof.nb_candidate_cells, 3);
        assert!(!roof.resumed);
        assert_eq!(report.results.total.years.len(), 10);
        assert_eq!(report.results.total.nb_new_panels[0], 2);
        assert!(report.results.total.nb_new_panels[1..].iter().all(|n| *n == 0));
        // 2 panels * 500 * 1.6 * 0.2 = 320 W, below the 576 W inverter
        assert_relative_eq!(
            report.results.total.energy_harvested[0],
            320.0 * HOURS_PER_YEAR as f64 / 1000.0,
            epsilon = 1e-6
        );
        assert_eq!(report.results.total, *report.results.roof.as_ref().unwrap());
    }

    #[test]
    fn unknown_technology_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.bipv.roof_pv_tech_id = "missing".to_string();
        let scenario = config.validate().unwrap();
        let library = library();
        let err = BuildingSimulator::new(&config, &scenario, &library)
            .simulate(&building(Some(write_table(dir.path()))))
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn resumed_building_appends_to_its_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = dir.path().join("checkpoints");
        let table = write_table(dir.path());
        let library = library();

        let mut first = config();
        first.uc_end_year = 2029;
        let scenario = first.validate().unwrap();
        BuildingSimulator::new(&first, &scenario, &library)
            .with_checkpoint_dir(&checkpoints)
            .simulate(&building(Some(table.clone())))
            .unwrap();

        let second = SimulationConfig { continue_simulation: true, ..config() };
        let outcome = BuildingSimulator::new(&second, &scenario, &library)
            .with_checkpoint_dir(&checkpoints)
            .simulate(&building(Some(table)))
            .unwrap();
        let report = outcome.report().unwrap();
        assert!(report.surface(SurfaceKind::Roof).unwrap().resumed);
        assert_eq!(report.results.total.years, (2024..2034).collect::<Vec<u32>>());
        assert_eq!(report.results.total.nb_new_panels.iter().sum::<usize>(), 2);
    }
}
