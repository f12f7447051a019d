// Time Constants
pub const DEFAULT_START_YEAR: u32 = 2024;
pub const DEFAULT_STUDY_DURATION_YEARS: u32 = 50;
pub const HOURS_PER_YEAR: usize = 8760;

// Physical Constants
pub const STC_IRRADIANCE: f64 = 1000.0;            // W/m2, standard test conditions
pub const WH_PER_KWH: f64 = 1000.0;
pub const KG_PER_TONNE: f64 = 1000.0;

// Screening Defaults
pub const DEFAULT_MINIMUM_PANEL_EROI: f64 = 1.2;
pub const MINIMUM_ALLOWED_PANEL_EROI: f64 = 1.0;    // thresholds must be strictly above

// Inverter Defaults
pub const DEFAULT_INVERTER_SIZING_RATIO: f64 = 0.9; // inverter power / peak power of the panels

// Technology Defaults
pub const DEFAULT_PERFORMANCE_RATIO: f64 = 1.0;

// Replacement Defaults
pub const DEFAULT_REPLACEMENT_SCENARIO: &str = "replace_failed_panels_every_X_years";
pub const DEFAULT_REPLACEMENT_FREQUENCY_YEARS: u32 = 5;

// Failure Model Defaults
pub const DEFAULT_FAILURE_SEED: u64 = 42;

// Reporting Defaults
pub const DEFAULT_COUNTRY_GHG_INTENSITY: f64 = 0.6;  // kgCO2eq per kWh of grid electricity
pub const INTERSECTION_SAMPLES: usize = 1000;
pub const INTERSECTION_BISECTION_STEPS: usize = 60;

// Default library record ids
pub const DEFAULT_ROOF_PV_TECH_ID: &str = "mitrex_roof c-Si";
pub const DEFAULT_FACADES_PV_TECH_ID: &str = "metsolar_facades c-Si";
pub const DEFAULT_TRANSPORT_ID: &str = "china_to_israel";
pub const DEFAULT_INVERTER_ID: &str = "central_inverter";

// File names
pub const CHECKPOINT_FILE_NAME: &str = "checkpoint.json";
pub const RESULTS_CSV_FILE_NAME: &str = "results.csv";
pub const RESULTS_JSON_FILE_NAME: &str = "results.json";
pub const SUMMARY_CSV_FILE_NAME: &str = "summary.csv";
