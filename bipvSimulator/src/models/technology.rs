use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::config::constants::{DEFAULT_PERFORMANCE_RATIO, HOURS_PER_YEAR, STC_IRRADIANCE, WH_PER_KWH};
use crate::error::{BipvError, Result};
use super::transportation::{TransportImpact, Transportation};

/// Caller-supplied efficiency function of (age in years, hourly irradiance in W/m2).
#[derive(Clone)]
pub struct CustomEfficiency(Arc<dyn Fn(u32, f64) -> f64 + Send + Sync>);

impl CustomEfficiency {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(u32, f64) -> f64 + Send + Sync + 'static,
    {
        CustomEfficiency(Arc::new(function))
    }

    pub fn evaluate(&self, age: u32, irradiance: f64) -> f64 {
        (self.0)(age, irradiance)
    }
}

impl fmt::Debug for CustomEfficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomEfficiency(<fn>)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EfficiencyModel {
    Constant {
        efficiency: f64,
    },
    DegradingRate {
        initial_efficiency: f64,
        annual_degradation_rate: f64,
    },
    // Only constructible from code, library records carry the two variants above
    #[serde(skip)]
    Custom(CustomEfficiency),
}

impl EfficiencyModel {
    pub fn efficiency(&self, age: u32, irradiance: f64) -> f64 {
        match self {
            EfficiencyModel::Constant { efficiency } => *efficiency,
            EfficiencyModel::DegradingRate { initial_efficiency, annual_degradation_rate } => {
                (initial_efficiency * (1.0 - annual_degradation_rate).powi(age as i32)).max(0.0)
            }
            EfficiencyModel::Custom(function) => function.evaluate(age, irradiance).max(0.0),
        }
    }

    /// Models whose efficiency does not depend on the hourly irradiance.
    pub fn is_yearly_model(&self) -> bool {
        matches!(self, EfficiencyModel::Constant { .. } | EfficiencyModel::DegradingRate { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParameters {
    pub scale: f64,
    pub shape: f64,
    pub lifetime: u32,
}

/// A panel model. Shared by reference (`Arc`) across every panel of that kind
/// and never mutated once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelTechnology {
    pub id: String,
    pub panel_area: f64,          // m2
    pub nominal_efficiency: f64,  // efficiency at STC, used for peak power and screening
    #[serde(default = "default_performance_ratio")]
    pub performance_ratio: f64,
    pub efficiency_model: EfficiencyModel,
    pub weibull_law_failure_parameters: WeibullParameters,

    // Manufacturing, per panel
    pub primary_energy_manufacturing: f64, // kWh
    pub ghg_manufacturing: f64,            // kgCO2eq
    pub cost_investment: f64,
    pub weight: f64,                       // kg

    // Recycling, per panel
    pub primary_energy_recycling: f64,
    pub ghg_recycling: f64,
    pub cost_recycling: f64,
    pub revenue_material_recovery: f64,

    // Maintenance, per panel and per year
    pub primary_energy_annual_maintenance: f64,
    pub ghg_annual_maintenance: f64,
    pub cost_annual_maintenance: f64,

    pub revenue_substituted_construction_material_roof: f64,
    pub revenue_substituted_construction_material_facades: f64,

    pub estimated_primary_energy_inverter: f64,
}

fn default_performance_ratio() -> f64 {
    DEFAULT_PERFORMANCE_RATIO
}

impl PanelTechnology {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| BipvError::InvalidTechnology {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if !(self.panel_area > 0.0) {
            return Err(invalid("panel_area must be positive"));
        }
        if !(self.nominal_efficiency > 0.0 && self.nominal_efficiency <= 1.0) {
            return Err(invalid("nominal_efficiency must be in (0, 1]"));
        }
        if !(self.performance_ratio > 0.0) {
            return Err(invalid("performance_ratio must be positive"));
        }
        let weibull = &self.weibull_law_failure_parameters;
        if !(weibull.scale > 0.0 && weibull.shape > 0.0) || weibull.lifetime == 0 {
            return Err(invalid("weibull scale, shape and lifetime must be positive"));
        }
        Ok(())
    }

    /// Peak power of one panel in W.
    pub fn peak_power(&self) -> f64 {
        self.panel_area * self.nominal_efficiency * STC_IRRADIANCE
    }

    /// Instantaneous power in W for an hourly irradiance in Wh/m2.
    pub fn power_at(&self, irradiance: f64, age: u32) -> f64 {
        irradiance * self.panel_area * self.efficiency_model.efficiency(age, irradiance) * self.performance_ratio
    }

    /// Efficiency model used by the screening pass. Hourly models are replaced by a
    /// constant nominal efficiency, which overestimates the harvested energy.
    pub fn screening_efficiency_model(&self) -> EfficiencyModel {
        if self.efficiency_model.is_yearly_model() {
            self.efficiency_model.clone()
        } else {
            EfficiencyModel::Constant { efficiency: self.nominal_efficiency }
        }
    }

    /// Yearly energy in kWh for an annual irradiance in kWh/m2, inverter losses ignored.
    pub fn estimate_yearly_energy_harvested(
        &self,
        annual_irradiance: f64,
        age: u32,
        efficiency_override: Option<&EfficiencyModel>,
    ) -> f64 {
        let model = efficiency_override.unwrap_or(&self.efficiency_model);
        let mean_hourly_irradiance = annual_irradiance * WH_PER_KWH / HOURS_PER_YEAR as f64;
        annual_irradiance * self.panel_area * model.efficiency(age, mean_hourly_irradiance) * self.performance_ratio
    }

    /// Energy harvested over the expected lifetime, summing the yearly estimate at each age.
    pub fn estimate_lifetime_energy_harvested(&self, annual_irradiance: f64) -> f64 {
        let model = self.screening_efficiency_model();
        (0..self.weibull_law_failure_parameters.lifetime)
            .map(|age| self.estimate_yearly_energy_harvested(annual_irradiance, age, Some(&model)))
            .sum()
    }

    /// Returns the (gate-to-gate, recycling) transport impacts of one panel.
    pub fn compute_transportation_lca_and_cost(
        &self,
        transportation: &Transportation,
    ) -> (TransportImpact, TransportImpact) {
        transportation.impacts_for_weight(self.weight)
    }

    /// Embodied primary energy of one panel over its life, used as the EROI denominator.
    pub fn total_primary_energy(&self, transportation: &Transportation) -> Result<f64> {
        let (gtg_transport, recycling_transport) = self.compute_transportation_lca_and_cost(transportation);
        let total = self.primary_energy_manufacturing
            + gtg_transport.primary_energy
            + self.primary_energy_recycling
            + recycling_transport.primary_energy
            + self.estimated_primary_energy_inverter;
        if total <= 0.0 {
            return Err(BipvError::ZeroPrimaryEnergy(self.id.clone()));
        }
        Ok(total)
    }

    pub fn revenue_substituted_construction_material(&self, on_roof: bool) -> f64 {
        if on_roof {
            self.revenue_substituted_construction_material_roof
        } else {
            self.revenue_substituted_construction_material_facades
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::transportation::TransportLeg;
    use approx::assert_relative_eq;

    pub(crate) fn technology(efficiency_model: EfficiencyModel) -> PanelTechnology {
        PanelTechnology {
            id: "test c-Si".to_string(),
            panel_area: 1.6,
            nominal_efficiency: 0.2,
            performance_ratio: 1.0,
            efficiency_model,
            weibull_law_failure_parameters: WeibullParameters { scale: 25.0, shape: 3.0, lifetime: 25 },
            primary_energy_manufacturing: 1000.0,
            ghg_manufacturing: 300.0,
            cost_investment: 250.0,
            weight: 20.0,
            primary_energy_recycling: 50.0,
            ghg_recycling: 10.0,
            cost_recycling: 15.0,
            revenue_material_recovery: 5.0,
            primary_energy_annual_maintenance: 2.0,
            ghg_annual_maintenance: 0.5,
            cost_annual_maintenance: 3.0,
            revenue_substituted_construction_material_roof: 40.0,
            revenue_substituted_construction_material_facades: 60.0,
            estimated_primary_energy_inverter: 100.0,
        }
    }

    pub(crate) fn transportation() -> Transportation {
        let leg = TransportLeg { distance_km: 0.0, primary_energy_per_tkm: 0.0, ghg_per_tkm: 0.0, cost_per_tkm: 0.0 };
        Transportation { id: "none".to_string(), gate_to_gate: leg.clone(), recycling: leg }
    }

    #[test]
    fn degrading_rate_compounds_with_age() {
        let model = EfficiencyModel::DegradingRate { initial_efficiency: 0.2, annual_degradation_rate: 0.01 };
        assert_relative_eq!(model.efficiency(0, 500.0), 0.2, epsilon = 1e-6);
        assert_relative_eq!(model.efficiency(2, 500.0), 0.2 * 0.99 * 0.99, epsilon = 1e-6);
    }

    #[test]
    fn screening_replaces_custom_model_by_nominal_efficiency() {
        let tech = technology(EfficiencyModel::Custom(CustomEfficiency::new(|_, _| 0.05)));
        match tech.screening_efficiency_model() {
            EfficiencyModel::Constant { efficiency } => assert_relative_eq!(efficiency, 0.2, epsilon = 1e-6),
            other => panic!("unexpected model {:?}", other),
        }
        // nominal efficiency overestimates the custom 5 % efficiency
        let lifetime_energy = tech.estimate_lifetime_energy_harvested(1000.0);
        assert_relative_eq!(lifetime_energy, 25.0 * 1000.0 * 1.6 * 0.2, epsilon = 1e-6);
    }

    #[test]
    fn peak_power_uses_stc_irradiance() {
        let tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        assert_relative_eq!(tech.peak_power(), 320.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_primary_energy_is_a_configuration_error() {
        let mut tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        tech.primary_energy_manufacturing = 0.0;
        tech.primary_energy_recycling = 0.0;
        tech.estimated_primary_energy_inverter = 0.0;
        let err = tech.total_primary_energy(&transportation()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn efficiency_model_deserializes_from_tagged_json() {
        let model: EfficiencyModel = serde_json::from_str(
            r#"{"kind": "degrading_rate", "initial_efficiency": 0.21, "annual_degradation_rate": 0.005}"#,
        )
        .unwrap();
        assert!(model.is_yearly_model());
    }
}
