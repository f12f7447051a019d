use std::convert::TryFrom;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::config::constants::{
    DEFAULT_COUNTRY_GHG_INTENSITY, DEFAULT_FACADES_PV_TECH_ID, DEFAULT_INVERTER_ID,
    DEFAULT_INVERTER_SIZING_RATIO, DEFAULT_MINIMUM_PANEL_EROI, DEFAULT_REPLACEMENT_FREQUENCY_YEARS,
    DEFAULT_REPLACEMENT_SCENARIO, DEFAULT_ROOF_PV_TECH_ID, DEFAULT_START_YEAR,
    DEFAULT_STUDY_DURATION_YEARS, DEFAULT_TRANSPORT_ID, MINIMUM_ALLOWED_PANEL_EROI,
};
use crate::core::replacement::ReplacementScenario;
use crate::error::{BipvError, Result};
use crate::models::building::SurfaceKind;
use crate::models::panel::FailureSettings;

/// Library ids and screening parameters of the BIPV installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BipvParameters {
    pub roof_pv_tech_id: String,
    pub facades_pv_tech_id: String,
    pub roof_transport_id: String,
    pub facades_transport_id: String,
    pub roof_inverter_id: String,
    pub facades_inverter_id: String,
    pub roof_inverter_sizing_ratio: f64,    // inverter power / peak power of the panels
    pub facades_inverter_sizing_ratio: f64,
    pub minimum_panel_eroi: f64,
}

impl Default for BipvParameters {
    fn default() -> Self {
        Self {
            roof_pv_tech_id: DEFAULT_ROOF_PV_TECH_ID.to_string(),
            facades_pv_tech_id: DEFAULT_FACADES_PV_TECH_ID.to_string(),
            roof_transport_id: DEFAULT_TRANSPORT_ID.to_string(),
            facades_transport_id: DEFAULT_TRANSPORT_ID.to_string(),
            roof_inverter_id: DEFAULT_INVERTER_ID.to_string(),
            facades_inverter_id: DEFAULT_INVERTER_ID.to_string(),
            roof_inverter_sizing_ratio: DEFAULT_INVERTER_SIZING_RATIO,
            facades_inverter_sizing_ratio: DEFAULT_INVERTER_SIZING_RATIO,
            minimum_panel_eroi: DEFAULT_MINIMUM_PANEL_EROI,
        }
    }
}

impl BipvParameters {
    pub fn pv_tech_id(&self, surface: SurfaceKind) -> &str {
        match surface {
            SurfaceKind::Roof => &self.roof_pv_tech_id,
            SurfaceKind::Facades => &self.facades_pv_tech_id,
        }
    }

    pub fn transport_id(&self, surface: SurfaceKind) -> &str {
        match surface {
            SurfaceKind::Roof => &self.roof_transport_id,
            SurfaceKind::Facades => &self.facades_transport_id,
        }
    }

    pub fn inverter_id(&self, surface: SurfaceKind) -> &str {
        match surface {
            SurfaceKind::Roof => &self.roof_inverter_id,
            SurfaceKind::Facades => &self.facades_inverter_id,
        }
    }

    pub fn inverter_sizing_ratio(&self, surface: SurfaceKind) -> f64 {
        match surface {
            SurfaceKind::Roof => self.roof_inverter_sizing_ratio,
            SurfaceKind::Facades => self.facades_inverter_sizing_ratio,
        }
    }
}

/// Untyped replacement parameters as written in config files and on the command line.
/// Converted once into a `ReplacementScenario` before simulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementParameters {
    pub replacement_scenario: String,
    pub replacement_frequency_in_years: Option<u32>,
    pub minimal_panel_age: Option<u32>,
    pub infrastructure_replacement_last_year: Option<u32>,
}

impl Default for ReplacementParameters {
    fn default() -> Self {
        Self {
            replacement_scenario: DEFAULT_REPLACEMENT_SCENARIO.to_string(),
            replacement_frequency_in_years: Some(DEFAULT_REPLACEMENT_FREQUENCY_YEARS),
            minimal_panel_age: None,
            infrastructure_replacement_last_year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub uc_start_year: u32,
    pub uc_current_year: u32,   // first year of fleets created by this run
    pub uc_end_year: u32,       // exclusive
    pub bipv_on_roof: bool,
    pub bipv_on_facades: bool,
    pub bipv: BipvParameters,
    pub replacement: ReplacementParameters,
    pub failure: FailureSettings,
    pub continue_simulation: bool,
    pub update_panel_technology: bool,
    pub country_ghg_intensity: f64, // kgCO2eq/kWh
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            uc_start_year: DEFAULT_START_YEAR,
            uc_current_year: DEFAULT_START_YEAR,
            uc_end_year: DEFAULT_START_YEAR + DEFAULT_STUDY_DURATION_YEARS,
            bipv_on_roof: true,
            bipv_on_facades: true,
            bipv: BipvParameters::default(),
            replacement: ReplacementParameters::default(),
            failure: FailureSettings::default(),
            continue_simulation: false,
            update_panel_technology: false,
            country_ghg_intensity: DEFAULT_COUNTRY_GHG_INTENSITY,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn is_enabled(&self, surface: SurfaceKind) -> bool {
        match surface {
            SurfaceKind::Roof => self.bipv_on_roof,
            SurfaceKind::Facades => self.bipv_on_facades,
        }
    }

    pub fn enabled_surfaces(&self) -> Vec<SurfaceKind> {
        SurfaceKind::ALL.into_iter().filter(|surface| self.is_enabled(*surface)).collect()
    }

    /// Runs every eager configuration check and returns the typed replacement scenario.
    pub fn validate(&self) -> Result<ReplacementScenario> {
        if !(self.uc_start_year <= self.uc_current_year && self.uc_current_year < self.uc_end_year) {
            return Err(BipvError::InvalidYearRange {
                start: self.uc_start_year,
                current: self.uc_current_year,
                end: self.uc_end_year,
            });
        }
        if !(self.bipv.minimum_panel_eroi > MINIMUM_ALLOWED_PANEL_EROI) {
            return Err(BipvError::InvalidMinimumPanelEroi(self.bipv.minimum_panel_eroi));
        }
        for ratio in [self.bipv.roof_inverter_sizing_ratio, self.bipv.facades_inverter_sizing_ratio] {
            if !(ratio > 0.0) {
                return Err(BipvError::InvalidInverterSizingRatio(ratio));
            }
        }
        if !(self.country_ghg_intensity >= 0.0) {
            return Err(BipvError::InvalidGhgIntensity(self.country_ghg_intensity));
        }
        ReplacementScenario::try_from(&self.replacement)
    }
}
