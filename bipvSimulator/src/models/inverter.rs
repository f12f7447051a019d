use serde::{Deserialize, Serialize};
use crate::error::{BipvError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InverterImpact {
    pub primary_energy: f64,
    pub ghg: f64,
    pub cost: f64,
}

/// Inverter model: replaced every `replacement_frequency` years, sized in
/// units of at most `max_unit_capacity_kw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inverter {
    pub id: String,
    pub replacement_frequency: u32,
    pub max_unit_capacity_kw: f64,
    pub primary_energy_per_kw: f64,
    pub ghg_per_kw: f64,
    pub cost_per_kw: f64,
    #[serde(default)]
    pub fixed_cost_per_unit: f64,
}

impl Inverter {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| BipvError::InvalidLibraryRecord {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.replacement_frequency == 0 {
            return Err(invalid("the replacement frequency must be at least 1 year"));
        }
        if !(self.max_unit_capacity_kw > 0.0) {
            return Err(invalid("the unit capacity must be positive"));
        }
        let coefficients = [self.primary_energy_per_kw, self.ghg_per_kw, self.cost_per_kw, self.fixed_cost_per_unit];
        if coefficients.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("impacts per kW must be finite and non-negative"));
        }
        Ok(())
    }

    /// Splits a total capacity into the individual inverter sizes needed to cover it.
    pub fn sub_capacities(&self, total_capacity_kw: f64) -> Vec<f64> {
        if total_capacity_kw <= 0.0 {
            return Vec::new();
        }
        let full_units = (total_capacity_kw / self.max_unit_capacity_kw).floor() as usize;
        let mut capacities = vec![self.max_unit_capacity_kw; full_units];
        let remainder = total_capacity_kw - full_units as f64 * self.max_unit_capacity_kw;
        if remainder > 1e-9 {
            capacities.push(remainder);
        }
        capacities
    }

    pub fn impact_for_capacities(&self, capacities: &[f64]) -> InverterImpact {
        capacities.iter().fold(InverterImpact::default(), |acc, capacity| InverterImpact {
            primary_energy: acc.primary_energy + capacity * self.primary_energy_per_kw,
            ghg: acc.ghg + capacity * self.ghg_per_kw,
            cost: acc.cost + capacity * self.cost_per_kw + self.fixed_cost_per_unit,
        })
    }

    pub fn is_replacement_year(&self, year: u32, start_year: u32) -> bool {
        (year as i64 - start_year as i64).rem_euclid(self.replacement_frequency as i64) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inverter() -> Inverter {
        Inverter {
            id: "string".to_string(),
            replacement_frequency: 10,
            max_unit_capacity_kw: 5.0,
            primary_energy_per_kw: 100.0,
            ghg_per_kw: 20.0,
            cost_per_kw: 50.0,
            fixed_cost_per_unit: 10.0,
        }
    }

    #[test]
    fn capacity_is_split_into_units() {
        assert_eq!(inverter().sub_capacities(12.0), vec![5.0, 5.0, 2.0]);
        assert_eq!(inverter().sub_capacities(10.0), vec![5.0, 5.0]);
        assert!(inverter().sub_capacities(0.0).is_empty());
    }

    #[test]
    fn impact_sums_units() {
        let inv = inverter();
        let impact = inv.impact_for_capacities(&inv.sub_capacities(12.0));
        assert_relative_eq!(impact.primary_energy, 1200.0, epsilon = 1e-6);
        assert_relative_eq!(impact.ghg, 240.0, epsilon = 1e-6);
        assert_relative_eq!(impact.cost, 630.0, epsilon = 1e-6);
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        let zero_frequency = Inverter { replacement_frequency: 0, ..inverter() };
        let no_capacity = Inverter { max_unit_capacity_kw: 0.0, ..inverter() };
        let negative_cost = Inverter { cost_per_kw: -1.0, ..inverter() };
        for bad in [zero_frequency, no_capacity, negative_cost] {
            let err = bad.validate().unwrap_err();
            assert!(matches!(err, BipvError::InvalidLibraryRecord { ref id, .. } if id == "string"));
            assert!(err.is_configuration_error());
        }
        assert!(inverter().validate().is_ok());
    }

    #[test]
    fn replacement_years_follow_frequency() {
        let inv = inverter();
        assert!(inv.is_replacement_year(2030, 2030));
        assert!(!inv.is_replacement_year(2035, 2030));
        assert!(inv.is_replacement_year(2040, 2030));
    }
}
