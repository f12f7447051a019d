use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use crate::config::constants::{DEFAULT_INVERTER_SIZING_RATIO, WH_PER_KWH};
use crate::core::replacement::{select_panels_to_replace, ReplacementScenario};
use crate::error::{BipvError, Result};
use crate::models::building::SurfaceKind;
use crate::models::panel::{FailureSettings, PanelState, PanelUnit};
use crate::models::technology::PanelTechnology;
use crate::utils::logging::{self, OperationCategory};

/// Hourly irradiance (Wh/m2) of a reference year, one row per mesh cell.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceTable {
    hours: usize,
    rows: Vec<Vec<f64>>,
}

impl IrradianceTable {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let hours = rows.first().map(|row| row.len()).unwrap_or(0);
        if hours == 0 {
            return Err(BipvError::IrradianceTableShape("the table has no hours".to_string()));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != hours) {
            return Err(BipvError::IrradianceTableShape(format!(
                "row {} has {} hours, expected {}",
                index,
                row.len(),
                hours
            )));
        }
        Ok(Self { hours, rows })
    }

    /// Same irradiance for every cell and every hour.
    pub fn constant(cells: usize, hours: usize, irradiance: f64) -> Self {
        Self {
            hours,
            rows: vec![vec![irradiance; hours]; cells],
        }
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    pub fn cells(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(|row| row.as_slice())
    }
}

/// What one simulated year produced, consumed by the LCA accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetYearState {
    pub year: u32,
    pub annual_energy_harvested: f64, // kWh
    pub nb_new_panels: usize,
    pub nb_working_panels: usize,
    pub maintenance_primary_energy: f64,
    pub maintenance_ghg: f64,
    pub maintenance_cost: f64,
}

/// Persisted fleet, enough to resume the yearly loop exactly where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetState {
    pub surface: SurfaceKind,
    pub start_year: u32,
    pub current_study_duration_in_years: u32,
    pub technology_id: String,
    pub inverter_capacity: f64,
    pub panels: Vec<PanelState>,
}

/// The panels of one surface group of one building and the shared inverter they feed.
#[derive(Debug, Clone)]
pub struct FleetSimulator {
    surface: SurfaceKind,
    start_year: u32,
    current_study_duration_in_years: u32,
    technology: Arc<PanelTechnology>,
    inverter_capacity: f64, // W
    failure: FailureSettings,
    panels: Vec<PanelUnit>,
}

impl FleetSimulator {
    /// Creates a fleet over the cells accepted by the screening pass. Panels are
    /// installed by the first simulated year.
    pub fn new(
        surface: SurfaceKind,
        technology: Arc<PanelTechnology>,
        accepted_cells: &[usize],
        start_year: u32,
        failure: FailureSettings,
    ) -> Self {
        let panels = accepted_cells
            .iter()
            .map(|index| PanelUnit::new(*index, technology.clone()))
            .collect();
        let fleet = Self {
            surface,
            start_year,
            current_study_duration_in_years: 0,
            technology,
            inverter_capacity: 0.0,
            failure,
            panels,
        };
        fleet.with_inverter_sizing_ratio(DEFAULT_INVERTER_SIZING_RATIO)
    }

    /// Sizes the inverter as a fraction of the peak power of the fleet.
    pub fn with_inverter_sizing_ratio(mut self, sizing_ratio: f64) -> Self {
        let peak_power: f64 = self.panels.iter().map(|panel| panel.technology().peak_power()).sum();
        self.inverter_capacity = sizing_ratio * peak_power;
        self
    }

    pub fn with_inverter_capacity(mut self, capacity_w: f64) -> Self {
        self.inverter_capacity = capacity_w;
        self
    }

    pub fn from_state<F>(state: &FleetState, failure: FailureSettings, resolve_technology: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Arc<PanelTechnology>>,
    {
        let technology = resolve_technology(&state.technology_id)?;
        let panels = state
            .panels
            .iter()
            .map(|panel| {
                let panel_technology = if panel.technology_id == technology.id {
                    technology.clone()
                } else {
                    resolve_technology(&panel.technology_id)?
                };
                Ok(PanelUnit::from_state(panel, panel_technology))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            surface: state.surface,
            start_year: state.start_year,
            current_study_duration_in_years: state.current_study_duration_in_years,
            technology,
            inverter_capacity: state.inverter_capacity,
            failure,
            panels,
        })
    }

    pub fn to_state(&self) -> FleetState {
        FleetState {
            surface: self.surface,
            start_year: self.start_year,
            current_study_duration_in_years: self.current_study_duration_in_years,
            technology_id: self.technology.id.clone(),
            inverter_capacity: self.inverter_capacity,
            panels: self.panels.iter().map(|panel| panel.to_state()).collect(),
        }
    }

    /// Technology installed on the panels replaced from now on.
    pub fn set_technology(&mut self, technology: Arc<PanelTechnology>) {
        self.technology = technology;
    }

    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    pub fn start_year(&self) -> u32 {
        self.start_year
    }

    pub fn current_study_duration_in_years(&self) -> u32 {
        self.current_study_duration_in_years
    }

    /// First year not simulated yet.
    pub fn iteration_start_year(&self) -> u32 {
        self.start_year + self.current_study_duration_in_years
    }

    pub fn technology(&self) -> &Arc<PanelTechnology> {
        &self.technology
    }

    pub fn inverter_capacity(&self) -> f64 {
        self.inverter_capacity
    }

    pub fn panels(&self) -> &[PanelUnit] {
        &self.panels
    }

    pub fn nb_panels(&self) -> usize {
        self.panels.len()
    }

    fn check_table(&self, table: &IrradianceTable) -> Result<()> {
        if let Some(panel) = self.panels.iter().find(|panel| panel.index() >= table.cells()) {
            return Err(BipvError::IrradianceTableShape(format!(
                "panel on cell {} but the table only has {} rows",
                panel.index(),
                table.cells()
            )));
        }
        Ok(())
    }

    /// Summed power of the working panels for each hour, before the inverter.
    pub fn uncapped_hourly_power(&self, table: &IrradianceTable) -> Result<Vec<f64>> {
        self.check_table(table)?;
        let mut totals = vec![0.0; table.hours()];
        for panel in &self.panels {
            if let Some(row) = table.row(panel.index()) {
                panel.add_hourly_power_into(row, &mut totals);
            }
        }
        Ok(totals)
    }

    /// Hourly power delivered by the inverter: the fleet sum clipped at its capacity.
    pub fn hourly_power(&self, table: &IrradianceTable) -> Result<Vec<f64>> {
        let _timing = logging::start_timing("hourly_power", OperationCategory::PowerAggregation);
        let capacity = self.inverter_capacity;
        Ok(self
            .uncapped_hourly_power(table)?
            .into_iter()
            .map(|power| power.min(capacity))
            .collect())
    }

    /// Simulates one year: replacements, clamped hourly harvest, then aging.
    pub fn simulate_year(
        &mut self,
        year: u32,
        table: &IrradianceTable,
        uc_start_year: u32,
        scenario: &ReplacementScenario,
    ) -> Result<FleetYearState> {
        let decision = select_panels_to_replace(&self.panels, year, self.start_year, uc_start_year, scenario);
        for position in &decision.panels {
            self.panels[*position].initialize_or_replace(self.technology.clone(), &self.failure);
        }

        let annual_energy_harvested = self.hourly_power(table)?.iter().sum::<f64>() / WH_PER_KWH;

        let mut state = FleetYearState {
            year,
            annual_energy_harvested,
            nb_new_panels: decision.nb_new_panels(),
            nb_working_panels: 0,
            maintenance_primary_energy: 0.0,
            maintenance_ghg: 0.0,
            maintenance_cost: 0.0,
        };
        for panel in self.panels.iter().filter(|panel| panel.is_installed()) {
            let technology = panel.technology();
            state.maintenance_primary_energy += technology.primary_energy_annual_maintenance;
            state.maintenance_ghg += technology.ghg_annual_maintenance;
            state.maintenance_cost += technology.cost_annual_maintenance;
            if panel.is_working() {
                state.nb_working_panels += 1;
            }
        }

        for panel in self.panels.iter_mut() {
            panel.increment_age_by_one_year();
        }
        self.current_study_duration_in_years += 1;

        trace!(
            surface = %self.surface,
            year,
            reason = ?decision.reason,
            nb_new_panels = state.nb_new_panels,
            energy_kwh = state.annual_energy_harvested,
            "year simulated"
        );
        Ok(state)
    }

    /// Simulates every year from the first not yet simulated one up to `uc_end_year`
    /// (exclusive). Returns nothing when those years are already covered.
    pub fn run(
        &mut self,
        table: &IrradianceTable,
        uc_start_year: u32,
        uc_end_year: u32,
        scenario: &ReplacementScenario,
    ) -> Result<Vec<FleetYearState>> {
        let _timing = logging::start_timing("fleet_run", OperationCategory::Simulation);
        self.check_table(table)?;

        let iteration_start_year = self.iteration_start_year();
        if iteration_start_year >= uc_end_year {
            debug!(
                surface = %self.surface,
                iteration_start_year,
                uc_end_year,
                "fleet already simulated up to the end year"
            );
            return Ok(Vec::new());
        }

        let mut states = Vec::with_capacity((uc_end_year - iteration_start_year) as usize);
        for year in iteration_start_year..uc_end_year {
            states.push(self.simulate_year(year, table, uc_start_year, scenario)?);
        }
        debug!(
            surface = %self.surface,
            panels = self.panels.len(),
            from = iteration_start_year,
            to = uc_end_year,
            "fleet simulated"
        );
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::replacement::ReplacementPolicy;
    use crate::models::panel::FailureDraw;
    use crate::models::technology::tests::technology;
    use crate::models::technology::EfficiencyModel;
    use approx::assert_relative_eq;

    fn flat_technology() -> Arc<PanelTechnology> {
        Arc::new(technology(EfficiencyModel::Constant { efficiency: 0.2 }))
    }

    #[test]
    fn ragged_table_is_rejected() {
        let err = IrradianceTable::new(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, BipvError::IrradianceTableShape(_)));
        assert!(IrradianceTable::new(Vec::new()).is_err());
    }

    #[test]
    fn inverter_is_sized_on_peak_power() {
        let fleet = FleetSimulator::new(SurfaceKind::Roof, flat_technology(), &[0, 1], 2024, FailureSettings::never())
            .with_inverter_sizing_ratio(0.5);
        assert_relative_eq!(fleet.inverter_capacity(), 0.5 * 2.0 * 320.0, epsilon = 1e-6);
    }

    #[test]
    fn power_is_clamped_after_summing() {
        // each panel gives 1000 * 1.6 * 0.2 = 320 W
        let table = IrradianceTable::new(vec![vec![1000.0, 100.0], vec![1000.0, 100.0]]).unwrap();
        let scenario = ReplacementScenario::new(ReplacementPolicy::NoReplacement);
        let mut fleet = FleetSimulator::new(SurfaceKind::Facades, flat_technology(), &[0, 1], 2024, FailureSettings::never())
            .with_inverter_capacity(500.0);
        let state = fleet.simulate_year(2024, &table, 2024, &scenario).unwrap();
        assert_relative_eq!(state.annual_energy_harvested, (500.0 + 64.0) / 1000.0, epsilon = 1e-6);
        let hourly = fleet.hourly_power(&table).unwrap();
        assert_relative_eq!(hourly[0], 500.0, epsilon = 1e-6);
        assert_relative_eq!(hourly[1], 64.0, epsilon = 1e-6);
    }

    #[test]
    fn panel_outside_the_table_is_an_error() {
        let table = IrradianceTable::constant(1, 4, 100.0);
        let scenario = ReplacementScenario::new(ReplacementPolicy::NoReplacement);
        let mut fleet = FleetSimulator::new(SurfaceKind::Roof, flat_technology(), &[3], 2024, FailureSettings::never());
        assert!(fleet.run(&table, 2024, 2026, &scenario).is_err());
    }

    #[test]
    fn empty_year_range_is_skipped() {
        let table = IrradianceTable::constant(1, 4, 100.0);
        let scenario = ReplacementScenario::new(ReplacementPolicy::NoReplacement);
        let mut fleet = FleetSimulator::new(SurfaceKind::Roof, flat_technology(), &[0], 2024, FailureSettings::never());
        assert_eq!(fleet.run(&table, 2024, 2027, &scenario).unwrap().len(), 3);
        assert!(fleet.run(&table, 2024, 2027, &scenario).unwrap().is_empty());
        assert_eq!(fleet.current_study_duration_in_years(), 3);
    }

    #[test]
    fn maintenance_counts_every_installed_panel() {
        let table = IrradianceTable::constant(3, 2, 100.0);
        let scenario = ReplacementScenario::new(ReplacementPolicy::NoReplacement);
        let failure = FailureSettings { draw: FailureDraw::ExpectedLifetime, seed: 0 };
        let mut fleet = FleetSimulator::new(SurfaceKind::Roof, flat_technology(), &[0, 1, 2], 2024, failure);
        let states = fleet.run(&table, 2024, 2054, &scenario).unwrap();
        // every panel failed at age 25 and is never replaced
        assert_eq!(states[24].nb_working_panels, 3);
        assert_eq!(states[25].nb_working_panels, 0);
        assert_relative_eq!(states[29].maintenance_cost, 3.0 * 3.0, epsilon = 1e-6);
        assert_relative_eq!(states[29].annual_energy_harvested, 0.0, epsilon = 1e-6);
    }
}
