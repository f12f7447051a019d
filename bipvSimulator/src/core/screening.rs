use tracing::{debug, warn};
use crate::error::{BipvError, Result};
use crate::models::building::SurfaceKind;
use crate::models::technology::PanelTechnology;
use crate::models::transportation::Transportation;
use crate::utils::logging::{self, OperationCategory};

/// Outcome of the screening pass over one sensor grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningResult {
    pub accepted: Vec<usize>,
    pub rejected_for_area: usize,
    pub rejected_for_eroi: usize,
}

impl ScreeningResult {
    pub fn nb_accepted(&self) -> usize {
        self.accepted.len()
    }

    /// Emits at most two aggregate warnings, whatever the number of rejected cells.
    pub fn log_warnings(&self, building_id: &str, surface: SurfaceKind) {
        if self.rejected_for_area > 0 {
            warn!(target: "user", "Some mesh faces of the {} of building {} were too small for a panel and were ignored", surface, building_id);
            warn!(
                target: "dev",
                building = building_id,
                surface = %surface,
                rejected = self.rejected_for_area,
                "mesh faces smaller than the panel area were not covered with panels"
            );
        }
        if self.rejected_for_eroi > 0 {
            warn!(target: "user", "Some panels on the {} of building {} were not installed, their EROI was too low", surface, building_id);
            warn!(
                target: "dev",
                building = building_id,
                surface = %surface,
                rejected = self.rejected_for_eroi,
                "panels below the minimum EROI threshold were not installed"
            );
        }
    }
}

/// Keeps the mesh cells large enough for a panel whose estimated lifetime EROI is
/// strictly above `minimum_panel_eroi`.
pub fn screen_panels(
    face_areas: &[f64],
    annual_irradiance: &[f64],
    technology: &PanelTechnology,
    transportation: &Transportation,
    minimum_panel_eroi: f64,
) -> Result<ScreeningResult> {
    let _timing = logging::start_timing("screen_panels", OperationCategory::Screening);

    if face_areas.len() != annual_irradiance.len() {
        return Err(BipvError::GridLengthMismatch {
            face_areas: face_areas.len(),
            irradiance: annual_irradiance.len(),
        });
    }
    let primary_energy = technology.total_primary_energy(transportation)?;

    let mut result = ScreeningResult {
        accepted: Vec::new(),
        rejected_for_area: 0,
        rejected_for_eroi: 0,
    };
    for (index, (area, irradiance)) in face_areas.iter().zip(annual_irradiance).enumerate() {
        if *area < technology.panel_area {
            result.rejected_for_area += 1;
            continue;
        }
        let eroi = technology.estimate_lifetime_energy_harvested(*irradiance) / primary_energy;
        if eroi <= minimum_panel_eroi {
            result.rejected_for_eroi += 1;
            continue;
        }
        result.accepted.push(index);
    }

    debug!(
        technology = %technology.id,
        accepted = result.accepted.len(),
        rejected_for_area = result.rejected_for_area,
        rejected_for_eroi = result.rejected_for_eroi,
        "screening done"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::technology::tests::{technology, transportation};
    use crate::models::technology::EfficiencyModel;

    #[test]
    fn small_and_unprofitable_cells_are_rejected() {
        let tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        // primary energy 1150 kWh, lifetime harvest 25 * irr * 1.6 * 0.2 = 8 * irr
        let face_areas = [2.0, 1.0, 2.0, 2.0];
        let irradiance = [1000.0, 1000.0, 100.0, 1000.0];
        let result = screen_panels(&face_areas, &irradiance, &tech, &transportation(), 1.2).unwrap();
        assert_eq!(result.accepted, vec![0, 3]);
        assert_eq!(result.rejected_for_area, 1);
        assert_eq!(result.rejected_for_eroi, 1);
    }

    #[test]
    fn threshold_applies_to_lifetime_eroi() {
        let tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        // 8000 / 1150 = 6.96
        let accepted = screen_panels(&[2.0], &[1000.0], &tech, &transportation(), 6.9).unwrap();
        assert_eq!(accepted.accepted, vec![0]);
        let rejected = screen_panels(&[2.0], &[1000.0], &tech, &transportation(), 7.0).unwrap();
        assert!(rejected.accepted.is_empty());
        assert_eq!(rejected.rejected_for_eroi, 1);
    }

    #[test]
    fn screening_is_idempotent() {
        let tech = technology(EfficiencyModel::DegradingRate { initial_efficiency: 0.2, annual_degradation_rate: 0.01 });
        let face_areas = [2.0, 1.7, 0.5, 3.0, 2.0];
        let irradiance = [900.0, 150.0, 1200.0, 600.0, 1400.0];
        let first = screen_panels(&face_areas, &irradiance, &tech, &transportation(), 1.2).unwrap();
        let second = screen_panels(&face_areas, &irradiance, &tech, &transportation(), 1.2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_grid_is_an_error() {
        let tech = technology(EfficiencyModel::Constant { efficiency: 0.2 });
        let err = screen_panels(&[2.0, 2.0], &[1000.0], &tech, &transportation(), 1.2).unwrap_err();
        assert!(matches!(err, BipvError::GridLengthMismatch { .. }));
    }
}
