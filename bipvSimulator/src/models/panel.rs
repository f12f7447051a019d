use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use crate::config::constants::DEFAULT_FAILURE_SEED;
use super::technology::PanelTechnology;

/// How the failure age of a freshly installed panel is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDraw {
    Never,
    ExpectedLifetime,
    Weibull,
}

impl fmt::Display for FailureDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDraw::Never => write!(f, "never"),
            FailureDraw::ExpectedLifetime => write!(f, "expected_lifetime"),
            FailureDraw::Weibull => write!(f, "weibull"),
        }
    }
}

impl FromStr for FailureDraw {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(FailureDraw::Never),
            "expected_lifetime" => Ok(FailureDraw::ExpectedLifetime),
            "weibull" => Ok(FailureDraw::Weibull),
            _ => Err(format!("Unknown failure draw: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureSettings {
    pub draw: FailureDraw,
    pub seed: u64,
}

impl Default for FailureSettings {
    fn default() -> Self {
        Self {
            draw: FailureDraw::Weibull,
            seed: DEFAULT_FAILURE_SEED,
        }
    }
}

impl FailureSettings {
    pub fn never() -> Self {
        Self { draw: FailureDraw::Never, seed: DEFAULT_FAILURE_SEED }
    }

    /// Draws the age (in years) at which a panel installed for the `install_count`-th
    /// time at cell `index` stops working. The draw depends only on its arguments, so
    /// a resumed fleet sees the same failures as an uninterrupted one.
    pub fn draw_failure_age(&self, technology: &PanelTechnology, index: usize, install_count: u32) -> Option<u32> {
        let weibull = &technology.weibull_law_failure_parameters;
        match self.draw {
            FailureDraw::Never => None,
            FailureDraw::ExpectedLifetime => Some(weibull.lifetime.max(1)),
            FailureDraw::Weibull => {
                let mut rng = StdRng::seed_from_u64(panel_seed(self.seed, index, install_count));
                let u: f64 = rng.gen();
                let sample = weibull.scale * (-(1.0 - u).ln()).powf(1.0 / weibull.shape);
                Some(sample.ceil().clamp(1.0, u32::MAX as f64) as u32)
            }
        }
    }
}

fn panel_seed(seed: u64, index: usize, install_count: u32) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (install_count as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// One physical panel bound to a sensor grid cell.
#[derive(Debug, Clone)]
pub struct PanelUnit {
    index: usize,
    technology: Arc<PanelTechnology>,
    age: u32,
    is_working: bool,
    failure_age: Option<u32>,
    install_count: u32,
}

/// Serializable snapshot of a panel, technologies are stored by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub index: usize,
    pub technology_id: String,
    pub age: u32,
    pub is_working: bool,
    pub failure_age: Option<u32>,
    pub install_count: u32,
}

impl PanelUnit {
    /// Creates an uninstalled panel, it produces nothing until first installed.
    pub fn new(index: usize, technology: Arc<PanelTechnology>) -> Self {
        Self {
            index,
            technology,
            age: 0,
            is_working: false,
            failure_age: None,
            install_count: 0,
        }
    }

    pub fn from_state(state: &PanelState, technology: Arc<PanelTechnology>) -> Self {
        Self {
            index: state.index,
            technology,
            age: state.age,
            is_working: state.is_working,
            failure_age: state.failure_age,
            install_count: state.install_count,
        }
    }

    pub fn to_state(&self) -> PanelState {
        PanelState {
            index: self.index,
            technology_id: self.technology.id.clone(),
            age: self.age,
            is_working: self.is_working,
            failure_age: self.failure_age,
            install_count: self.install_count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn technology(&self) -> &Arc<PanelTechnology> {
        &self.technology
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn failure_age(&self) -> Option<u32> {
        self.failure_age
    }

    pub fn install_count(&self) -> u32 {
        self.install_count
    }

    pub fn is_installed(&self) -> bool {
        self.install_count > 0
    }

    pub fn is_working(&self) -> bool {
        self.is_working
    }

    pub fn initialize_or_replace(&mut self, technology: Arc<PanelTechnology>, failure: &FailureSettings) {
        self.install_count += 1;
        self.age = 0;
        self.failure_age = failure.draw_failure_age(&technology, self.index, self.install_count);
        self.technology = technology;
        self.is_working = true;
    }

    pub fn increment_age_by_one_year(&mut self) {
        self.age += 1;
        if let Some(failure_age) = self.failure_age {
            if self.age >= failure_age {
                self.is_working = false;
            }
        }
    }

    /// Power in W for each hour of the given irradiance row (Wh/m2).
    pub fn hourly_power_generation(&self, hourly_irradiance: &[f64]) -> Vec<f64> {
        let mut power = vec![0.0; hourly_irradiance.len()];
        self.add_hourly_power_into(hourly_irradiance, &mut power);
        power
    }

    /// Adds this panel's hourly power to `totals`. Failed panels add nothing.
    pub fn add_hourly_power_into(&self, hourly_irradiance: &[f64], totals: &mut [f64]) {
        if !self.is_working {
            return;
        }
        for (total, irradiance) in totals.iter_mut().zip(hourly_irradiance) {
            *total += self.technology.power_at(*irradiance, self.age);
        }
    }
}
