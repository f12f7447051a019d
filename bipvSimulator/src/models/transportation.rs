use serde::{Deserialize, Serialize};
use crate::config::constants::KG_PER_TONNE;
use crate::error::{BipvError, Result};

/// One transport leg, coefficients are per tonne-kilometre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLeg {
    pub distance_km: f64,
    pub primary_energy_per_tkm: f64, // kWh / t.km
    pub ghg_per_tkm: f64,            // kgCO2eq / t.km
    pub cost_per_tkm: f64,           // currency / t.km
}

/// Primary energy, GHG and cost of moving one panel over one leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportImpact {
    pub primary_energy: f64,
    pub ghg: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transportation {
    pub id: String,
    pub gate_to_gate: TransportLeg,
    pub recycling: TransportLeg,
}

impl TransportLeg {
    pub fn impact_for_weight(&self, weight_kg: f64) -> TransportImpact {
        let tonne_km = weight_kg / KG_PER_TONNE * self.distance_km;
        TransportImpact {
            primary_energy: tonne_km * self.primary_energy_per_tkm,
            ghg: tonne_km * self.ghg_per_tkm,
            cost: tonne_km * self.cost_per_tkm,
        }
    }

    fn validate(&self, id: &str, leg: &str) -> Result<()> {
        let values = [
            self.distance_km,
            self.primary_energy_per_tkm,
            self.ghg_per_tkm,
            self.cost_per_tkm,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(BipvError::InvalidLibraryRecord {
                id: id.to_string(),
                reason: format!("negative or non-finite coefficient on the {} leg", leg),
            });
        }
        Ok(())
    }
}

impl Transportation {
    /// Returns the (gate-to-gate, recycling) impacts for one unit of the given weight.
    pub fn impacts_for_weight(&self, weight_kg: f64) -> (TransportImpact, TransportImpact) {
        (
            self.gate_to_gate.impact_for_weight(weight_kg),
            self.recycling.impact_for_weight(weight_kg),
        )
    }

    pub fn validate(&self) -> Result<()> {
        self.gate_to_gate.validate(&self.id, "gate_to_gate")?;
        self.recycling.validate(&self.id, "recycling")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn leg(distance_km: f64) -> TransportLeg {
        TransportLeg {
            distance_km,
            primary_energy_per_tkm: 0.5,
            ghg_per_tkm: 0.1,
            cost_per_tkm: 0.02,
        }
    }

    #[test]
    fn impact_scales_with_weight_and_distance() {
        let transport = Transportation {
            id: "ship".to_string(),
            gate_to_gate: leg(10_000.0),
            recycling: leg(100.0),
        };
        let (gtg, recycling) = transport.impacts_for_weight(20.0);
        // 20 kg over 10 000 km = 200 t.km
        assert_relative_eq!(gtg.primary_energy, 100.0, epsilon = 1e-6);
        assert_relative_eq!(gtg.ghg, 20.0, epsilon = 1e-6);
        assert_relative_eq!(gtg.cost, 4.0, epsilon = 1e-6);
        assert_relative_eq!(recycling.primary_energy, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn negative_distance_is_rejected() {
        let transport = Transportation {
            id: "bad".to_string(),
            gate_to_gate: leg(-1.0),
            recycling: leg(1.0),
        };
        let err = transport.validate().unwrap_err();
        assert!(matches!(err, BipvError::InvalidLibraryRecord { ref id, .. } if id == "bad"));
        assert!(err.is_configuration_error());
    }
}
