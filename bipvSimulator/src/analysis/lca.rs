use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::constants::WH_PER_KWH;
use crate::core::fleet::FleetYearState;
use crate::models::building::SurfaceKind;
use crate::models::inverter::Inverter;
use crate::models::technology::PanelTechnology;
use crate::models::transportation::Transportation;
use crate::utils::logging::{self, OperationCategory};
use super::results::{CostSeries, SurfaceResults};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSeries {
    pub primary_energy: Vec<f64>,
    pub ghg: Vec<f64>,
    pub cost: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateToGateSeries {
    pub primary_energy: Vec<f64>,
    pub ghg: Vec<f64>,
    pub cost_investment: Vec<f64>,
    pub revenue_substituted_construction_material: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecyclingSeries {
    pub primary_energy: Vec<f64>,
    pub ghg: Vec<f64>,
    pub cost: Vec<f64>,
    pub revenue_material_recovery: Vec<f64>,
    pub dmfa_waste: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportationSeries {
    pub gate_to_gate: ImpactSeries,
    pub recycling: ImpactSeries,
}

fn scale(nb_new_panels: &[usize], coefficient: f64) -> Vec<f64> {
    nb_new_panels.iter().map(|count| *count as f64 * coefficient).collect()
}

/// Manufacturing impacts and the revenue of the construction material the panels replace.
pub fn gtg_series(nb_new_panels: &[usize], technology: &PanelTechnology, surface: SurfaceKind) -> GateToGateSeries {
    GateToGateSeries {
        primary_energy: scale(nb_new_panels, technology.primary_energy_manufacturing),
        ghg: scale(nb_new_panels, technology.ghg_manufacturing),
        cost_investment: scale(nb_new_panels, technology.cost_investment),
        revenue_substituted_construction_material: scale(
            nb_new_panels,
            technology.revenue_substituted_construction_material(surface.is_roof()),
        ),
    }
}

/// End of life impacts, charged in the year the panel is installed.
pub fn recycling_series(nb_new_panels: &[usize], technology: &PanelTechnology) -> RecyclingSeries {
    RecyclingSeries {
        primary_energy: scale(nb_new_panels, technology.primary_energy_recycling),
        ghg: scale(nb_new_panels, technology.ghg_recycling),
        cost: scale(nb_new_panels, technology.cost_recycling),
        revenue_material_recovery: scale(nb_new_panels, technology.revenue_material_recovery),
        dmfa_waste: scale(nb_new_panels, technology.weight),
    }
}

pub fn transportation_series(
    nb_new_panels: &[usize],
    technology: &PanelTechnology,
    transportation: &Transportation,
) -> TransportationSeries {
    let (gtg, recycling) = technology.compute_transportation_lca_and_cost(transportation);
    TransportationSeries {
        gate_to_gate: ImpactSeries {
            primary_energy: scale(nb_new_panels, gtg.primary_energy),
            ghg: scale(nb_new_panels, gtg.ghg),
            cost: scale(nb_new_panels, gtg.cost),
        },
        recycling: ImpactSeries {
            primary_energy: scale(nb_new_panels, recycling.primary_energy),
            ghg: scale(nb_new_panels, recycling.ghg),
            cost: scale(nb_new_panels, recycling.cost),
        },
    }
}

/// Yearly maintenance of every panel of the fleet, new or not.
pub fn maintenance_series(states: &[FleetYearState]) -> ImpactSeries {
    ImpactSeries {
        primary_energy: states.iter().map(|state| state.maintenance_primary_energy).collect(),
        ghg: states.iter().map(|state| state.maintenance_ghg).collect(),
        cost: states.iter().map(|state| state.maintenance_cost).collect(),
    }
}

/// Inverter impacts, charged only in the years the inverters are (re)placed.
pub fn inverter_series(years: &[u32], start_year: u32, inverter: &Inverter, capacity_kw: f64) -> ImpactSeries {
    let impact = inverter.impact_for_capacities(&inverter.sub_capacities(capacity_kw));
    let mut series = ImpactSeries::default();
    for year in years {
        let charged = inverter.is_replacement_year(*year, start_year);
        let factor = if charged { 1.0 } else { 0.0 };
        series.primary_energy.push(factor * impact.primary_energy);
        series.ghg.push(factor * impact.ghg);
        series.cost.push(factor * impact.cost);
    }
    series
}

/// Turns the yearly fleet output into the LCA and cost series of one surface group.
pub struct LcaCostAggregator<'a> {
    technology: &'a PanelTechnology,
    transportation: &'a Transportation,
    inverter: &'a Inverter,
    surface: SurfaceKind,
    start_year: u32,
    inverter_capacity_kw: f64,
}

impl<'a> LcaCostAggregator<'a> {
    pub fn new(
        technology: &'a PanelTechnology,
        transportation: &'a Transportation,
        inverter: &'a Inverter,
        surface: SurfaceKind,
        start_year: u32,
        inverter_capacity_w: f64,
    ) -> Self {
        Self {
            technology,
            transportation,
            inverter,
            surface,
            start_year,
            inverter_capacity_kw: inverter_capacity_w / WH_PER_KWH,
        }
    }

    pub fn aggregate(&self, states: &[FleetYearState]) -> SurfaceResults {
        let _timing = logging::start_timing("lca_aggregate", OperationCategory::LcaAccounting);

        let years: Vec<u32> = states.iter().map(|state| state.year).collect();
        let nb_new_panels: Vec<usize> = states.iter().map(|state| state.nb_new_panels).collect();

        let gtg = gtg_series(&nb_new_panels, self.technology, self.surface);
        let recycling = recycling_series(&nb_new_panels, self.technology);
        let transport = transportation_series(&nb_new_panels, self.technology, self.transportation);
        let maintenance = maintenance_series(states);
        let inverter = inverter_series(&years, self.start_year, self.inverter, self.inverter_capacity_kw);

        let mut results = SurfaceResults {
            years,
            energy_harvested: states.iter().map(|state| state.annual_energy_harvested).collect(),
            nb_new_panels,
            ..SurfaceResults::default()
        };
        let mut cost = CostSeries::default();
        for i in 0..states.len() {
            results.lca_cradle_to_installation_primary_energy.push(
                gtg.primary_energy[i]
                    + transport.gate_to_gate.primary_energy[i]
                    + maintenance.primary_energy[i]
                    + inverter.primary_energy[i],
            );
            results
                .lca_recycling_primary_energy
                .push(recycling.primary_energy[i] + transport.recycling.primary_energy[i]);
            results.lca_cradle_to_installation_carbon.push(
                gtg.ghg[i] + transport.gate_to_gate.ghg[i] + maintenance.ghg[i] + inverter.ghg[i],
            );
            results.lca_recycling_carbon.push(recycling.ghg[i] + transport.recycling.ghg[i]);
            results.dmfa_waste.push(recycling.dmfa_waste[i]);

            let transportation_cost = transport.gate_to_gate.cost[i] + transport.recycling.cost[i];
            cost.investment.push(gtg.cost_investment[i]);
            cost.transportation.push(transportation_cost);
            cost.maintenance.push(maintenance.cost[i]);
            cost.inverter.push(inverter.cost[i]);
            cost.recycling.push(recycling.cost[i]);
            cost.revenue_substituted_construction_material
                .push(gtg.revenue_substituted_construction_material[i]);
            cost.revenue_material_recovery.push(recycling.revenue_material_recovery[i]);
            cost.net.push(
                gtg.cost_investment[i] + transportation_cost + maintenance.cost[i] + inverter.cost[i]
                    + recycling.cost[i]
                    - gtg.revenue_substituted_construction_material[i]
                    - recycling.revenue_material_recovery[i],
            );
        }
        results.cost = cost;

        debug!(
            surface = %self.surface,
            technology = %self.technology.id,
            years = results.len(),
            "LCA series computed"
        );
        results
    }
}
