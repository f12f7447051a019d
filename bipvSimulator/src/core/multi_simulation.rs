use std::path::PathBuf;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use crate::config::simulation_config::SimulationConfig;
use crate::data::library_loader::Library;
use crate::error::Result;
use crate::models::building::BuildingModeled;
use crate::utils::logging::{self, OperationCategory};
use super::simulation::{BuildingOutcome, BuildingSimulator};

/// How the batch over buildings is run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub parallel: bool,
    pub show_progress: bool,
    pub building_ids: Vec<String>,  // empty means every target building
    pub checkpoint_dir: Option<PathBuf>,
}

impl BatchOptions {
    fn selects(&self, building: &BuildingModeled) -> bool {
        building.is_target && (self.building_ids.is_empty() || self.building_ids.contains(&building.id))
    }
}

/// Checks the library ids named by the configuration before any building is simulated.
fn check_library(config: &SimulationConfig, library: &Library) -> Result<()> {
    for surface in config.enabled_surfaces() {
        library.technology(config.bipv.pv_tech_id(surface))?;
        library.transportation(config.bipv.transport_id(surface))?;
        library.inverter(config.bipv.inverter_id(surface))?;
    }
    Ok(())
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} buildings {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Simulates every selected target building. Configuration errors abort the batch,
/// any other failure only skips the building concerned. Outcomes keep the input order.
pub fn run_multi_simulation(
    buildings: &[BuildingModeled],
    library: &Library,
    config: &SimulationConfig,
    options: &BatchOptions,
) -> Result<Vec<BuildingOutcome>> {
    let _timing = logging::start_timing("run_multi_simulation", OperationCategory::Simulation);

    let scenario = config.validate()?;
    check_library(config, library)?;

    let targets: Vec<&BuildingModeled> = buildings.iter().filter(|building| options.selects(building)).collect();
    info!(
        target: "user",
        "Simulating {} building(s) from {} to {} with scenario {}",
        targets.len(),
        config.uc_current_year,
        config.uc_end_year,
        scenario.policy
    );

    let mut simulator = BuildingSimulator::new(config, &scenario, library);
    if let Some(dir) = options.checkpoint_dir.as_deref() {
        simulator = simulator.with_checkpoint_dir(dir);
    }
    let bar = progress_bar(targets.len(), options.show_progress);

    let simulate_one = |building: &BuildingModeled| -> Result<BuildingOutcome> {
        let outcome = match simulator.simulate(building) {
            Ok(outcome) => outcome,
            Err(err) if err.is_configuration_error() => return Err(err),
            Err(err) => {
                warn!(target: "user", "Building {} skipped: {}", building.id, err);
                warn!(target: "dev", building = %building.id, error = ?err, "building simulation failed");
                BuildingOutcome::Skipped {
                    building_id: building.id.clone(),
                    reason: err.to_string(),
                }
            }
        };
        bar.inc(1);
        Ok(outcome)
    };

    let outcomes = if options.parallel {
        targets
            .par_iter()
            .map(|building| simulate_one(*building))
            .collect::<Result<Vec<_>>>()?
    } else {
        targets
            .iter()
            .map(|building| simulate_one(*building))
            .collect::<Result<Vec<_>>>()?
    };

    let simulated = outcomes.iter().filter(|outcome| outcome.report().is_some()).count();
    bar.finish_with_message(format!("{} simulated, {} skipped", simulated, outcomes.len() - simulated));
    info!(
        target: "user",
        "{} building(s) simulated, {} skipped",
        simulated,
        outcomes.len() - simulated
    );
    Ok(outcomes)
}
