use serde::{Deserialize, Serialize};
use crate::config::constants::{INTERSECTION_BISECTION_STEPS, INTERSECTION_SAMPLES, WH_PER_KWH};
use crate::error::{BipvError, Result};
use super::results::SurfaceResults;

pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, value| {
            *total += value;
            Some(*total)
        })
        .collect()
}

/// Element-wise sum of two series of the same length.
pub fn add_series(name: &str, left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    if left.len() != right.len() {
        return Err(BipvError::SeriesLengthMismatch {
            series: name.to_string(),
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left.iter().zip(right).map(|(l, r)| l + r).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFunction {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFunction {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares line through the points. None with fewer than two distinct abscissas.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFunction> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let covariance: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let variance: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if variance == 0.0 {
        return None;
    }
    let slope = covariance / variance;
    Some(LinearFunction {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Piecewise constant function holding `ys[i]` on `[xs[i], xs[i + 1])`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFunction {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl StepFunction {
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() || xs.is_empty() {
            return Err(BipvError::SeriesLengthMismatch {
                series: "step_function".to_string(),
                left: xs.len(),
                right: ys.len(),
            });
        }
        Ok(Self { xs: xs.to_vec(), ys: ys.to_vec() })
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let position = self.xs.partition_point(|step| *step <= x);
        self.ys[position.saturating_sub(1)]
    }
}

/// First point of `[start, end]` where `f` catches up with `g`, searched on a regular
/// grid and refined by bisection.
pub fn find_intersection<F, G>(f: F, g: G, start: f64, end: f64) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let difference = |x: f64| f(x) - g(x);
    if difference(start) >= 0.0 {
        return Some((start, f(start)));
    }
    let step = (end - start) / INTERSECTION_SAMPLES as f64;
    let mut low = start;
    for sample in 1..=INTERSECTION_SAMPLES {
        let high = start + step * sample as f64;
        if difference(high) >= 0.0 {
            let mut bracket = (low, high);
            for _ in 0..INTERSECTION_BISECTION_STEPS {
                let middle = 0.5 * (bracket.0 + bracket.1);
                if difference(middle) >= 0.0 {
                    bracket.1 = middle;
                } else {
                    bracket.0 = middle;
                }
            }
            return Some((bracket.1, f(bracket.1)));
        }
        low = high;
    }
    None
}

fn study_years(length: usize) -> Vec<f64> {
    (0..length).map(|year| year as f64).collect()
}

fn cumulative_primary_energy(results: &SurfaceResults) -> Vec<f64> {
    cumulative_sum(
        &results
            .lca_cradle_to_installation_primary_energy
            .iter()
            .zip(&results.lca_recycling_primary_energy)
            .map(|(a, b)| a + b)
            .collect::<Vec<_>>(),
    )
}

fn cumulative_carbon(results: &SurfaceResults) -> Vec<f64> {
    cumulative_sum(
        &results
            .lca_cradle_to_installation_carbon
            .iter()
            .zip(&results.lca_recycling_carbon)
            .map(|(a, b)| a + b)
            .collect::<Vec<_>>(),
    )
}

/// Cumulative energy harvested over cumulative primary energy, year by year.
pub fn cumulative_eroi(results: &SurfaceResults) -> Vec<f64> {
    cumulative_sum(&results.energy_harvested)
        .iter()
        .zip(cumulative_primary_energy(results))
        .map(|(energy, primary)| if primary > 0.0 { energy / primary } else { 0.0 })
        .collect()
}

/// Cumulative emissions per kWh harvested, in gCO2eq/kWh.
pub fn ghg_per_kwh(results: &SurfaceResults) -> Vec<f64> {
    cumulative_carbon(results)
        .iter()
        .zip(cumulative_sum(&results.energy_harvested))
        .map(|(carbon, energy)| if energy > 0.0 { carbon / energy * WH_PER_KWH } else { 0.0 })
        .collect()
}

/// Study year at which the fitted cumulative harvest crosses the cumulative primary energy.
pub fn energy_payback_year(results: &SurfaceResults) -> Option<f64> {
    let years = study_years(results.len());
    let harvest = linear_fit(&years, &cumulative_sum(&results.energy_harvested))?;
    let footprint = StepFunction::new(&years, &cumulative_primary_energy(results)).ok()?;
    find_intersection(|x| harvest.evaluate(x), |x| footprint.evaluate(x), years[0], years[years.len() - 1])
        .map(|(x, _)| x)
}

/// Study year at which the fitted cumulative harvest reaches the primary energy of the whole study.
pub fn energy_reimbursement_year(results: &SurfaceResults) -> Option<f64> {
    let years = study_years(results.len());
    let harvest = linear_fit(&years, &cumulative_sum(&results.energy_harvested))?;
    let total = *cumulative_primary_energy(results).last()?;
    find_intersection(|x| harvest.evaluate(x), |_| total, years[0], years[years.len() - 1]).map(|(x, _)| x)
}

/// Study year at which the avoided grid emissions reach the emissions of the whole study.
pub fn ghg_payback_year(results: &SurfaceResults, country_ghg_intensity: f64) -> Option<f64> {
    let years = study_years(results.len());
    let avoided: Vec<f64> = results.energy_harvested.iter().map(|e| e * country_ghg_intensity).collect();
    let avoided_fit = linear_fit(&years, &cumulative_sum(&avoided))?;
    let total = *cumulative_carbon(results).last()?;
    find_intersection(|x| avoided_fit.evaluate(x), |_| total, years[0], years[years.len() - 1]).map(|(x, _)| x)
}

/// Headline figures of one surface (or the total) over the simulated years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub nb_years: usize,
    pub total_energy_harvested: f64,
    pub total_primary_energy: f64,
    pub total_carbon: f64,
    pub total_dmfa_waste: f64,
    pub net_cost: f64,
    pub eroi: f64,
    pub ghg_per_kwh: f64,
    pub energy_payback_year: Option<f64>,
    pub energy_reimbursement_year: Option<f64>,
    pub ghg_payback_year: Option<f64>,
}

impl ResultsSummary {
    pub fn from_results(results: &SurfaceResults, country_ghg_intensity: f64) -> Self {
        Self {
            nb_years: results.len(),
            total_energy_harvested: results.energy_harvested.iter().sum(),
            total_primary_energy: cumulative_primary_energy(results).last().copied().unwrap_or(0.0),
            total_carbon: cumulative_carbon(results).last().copied().unwrap_or(0.0),
            total_dmfa_waste: results.dmfa_waste.iter().sum(),
            net_cost: results.cost.net.iter().sum(),
            eroi: cumulative_eroi(results).last().copied().unwrap_or(0.0),
            ghg_per_kwh: ghg_per_kwh(results).last().copied().unwrap_or(0.0),
            energy_payback_year: energy_payback_year(results),
            energy_reimbursement_year: energy_reimbursement_year(results),
            ghg_payback_year: ghg_payback_year(results, country_ghg_intensity),
        }
    }
}
