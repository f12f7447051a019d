use crate::core::simulation::{BuildingOutcome, BuildingReport};
use super::metrics::ResultsSummary;

fn year_or_never(year: Option<f64>, first_year: Option<u32>) -> String {
    match (year, first_year) {
        (Some(year), Some(first)) => format!("{:.1} (around {})", year, first + year.round() as u32),
        (Some(year), None) => format!("{:.1}", year),
        (None, _) => "not reached".to_string(),
    }
}

pub fn print_summary(summary: &ResultsSummary, first_year: Option<u32>) {
    println!("  Years simulated: {}", summary.nb_years);
    println!("  Energy harvested: {:.0} kWh", summary.total_energy_harvested);
    println!("  Primary energy: {:.0} kWh", summary.total_primary_energy);
    println!("  Carbon footprint: {:.0} kgCO2eq", summary.total_carbon);
    println!("  Carbon intensity: {:.1} gCO2eq/kWh", summary.ghg_per_kwh);
    println!("  EROI: {:.2}", summary.eroi);
    println!("  DMFA waste: {:.0} kg", summary.total_dmfa_waste);
    println!("  Net cost: {:.2}", summary.net_cost);
    println!("  Energy payback year: {}", year_or_never(summary.energy_payback_year, first_year));
    println!("  Energy reimbursement year: {}", year_or_never(summary.energy_reimbursement_year, first_year));
    println!("  GHG payback year: {}", year_or_never(summary.ghg_payback_year, first_year));
}

pub fn print_building_summary(report: &BuildingReport) {
    println!("\nBuilding {}", report.building_id);
    println!("----------------------------------------");
    for surface in &report.surfaces {
        println!(
            "{}: {} panels on {} cells ({}), inverter {:.1} kW{}",
            surface.surface,
            surface.nb_panels,
            surface.nb_candidate_cells,
            surface.technology_id,
            surface.inverter_capacity / 1000.0,
            if surface.resumed { ", resumed" } else { "" }
        );
    }
    print_summary(&report.summary, report.results.total.years.first().copied());
}

pub fn print_batch_summary(outcomes: &[BuildingOutcome]) {
    let reports: Vec<&BuildingReport> = outcomes.iter().filter_map(BuildingOutcome::report).collect();
    let energy: f64 = reports.iter().map(|report| report.summary.total_energy_harvested).sum();
    let primary_energy: f64 = reports.iter().map(|report| report.summary.total_primary_energy).sum();
    let carbon: f64 = reports.iter().map(|report| report.summary.total_carbon).sum();
    let panels: usize = reports.iter().map(|report| report.nb_panels()).sum();

    println!("\nBatch Summary");
    println!("========================================");
    println!("Buildings simulated: {}", reports.len());
    println!("Buildings skipped: {}", outcomes.len() - reports.len());
    println!("Panels: {}", panels);
    println!("Energy harvested: {:.0} kWh", energy);
    println!("Primary energy: {:.0} kWh", primary_energy);
    println!("Carbon footprint: {:.0} kgCO2eq", carbon);
    if primary_energy > 0.0 {
        println!("EROI: {:.2}", energy / primary_energy);
    }
    for outcome in outcomes {
        if let BuildingOutcome::Skipped { building_id, reason } = outcome {
            println!("  skipped {}: {}", building_id, reason);
        }
    }
}
