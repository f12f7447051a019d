use std::convert::TryFrom;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::config::simulation_config::ReplacementParameters;
use crate::error::{BipvError, Result};
use crate::models::panel::PanelUnit;

pub const NO_REPLACEMENT: &str = "no_replacement";
pub const REPLACE_FAILED_PANELS_EVERY_X_YEARS: &str = "replace_failed_panels_every_X_years";
pub const REPLACE_ALL_PANELS_EVERY_X_YEARS: &str = "replace_all_panels_every_X_years";
pub const UC_REPLACE_FAILED_PANELS_EVERY_X_YEARS: &str = "uc_replace_failed_panels_every_X_years";
pub const UC_REPLACE_ALL_PANELS_EVERY_X_YEARS: &str = "uc_replace_all_panels_every_X_years";

/// Replacement policy with the parameters its kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicy {
    NoReplacement,
    ReplaceFailedPanelsEveryXYears { frequency: u32 },
    ReplaceAllPanelsEveryXYears { frequency: u32, minimal_panel_age: Option<u32> },
    UcReplaceFailedPanelsEveryXYears { frequency: u32 },
    UcReplaceAllPanelsEveryXYears { frequency: u32, minimal_panel_age: Option<u32> },
}

impl ReplacementPolicy {
    pub fn id(&self) -> &'static str {
        match self {
            ReplacementPolicy::NoReplacement => NO_REPLACEMENT,
            ReplacementPolicy::ReplaceFailedPanelsEveryXYears { .. } => REPLACE_FAILED_PANELS_EVERY_X_YEARS,
            ReplacementPolicy::ReplaceAllPanelsEveryXYears { .. } => REPLACE_ALL_PANELS_EVERY_X_YEARS,
            ReplacementPolicy::UcReplaceFailedPanelsEveryXYears { .. } => UC_REPLACE_FAILED_PANELS_EVERY_X_YEARS,
            ReplacementPolicy::UcReplaceAllPanelsEveryXYears { .. } => UC_REPLACE_ALL_PANELS_EVERY_X_YEARS,
        }
    }

    /// Builds a policy from its string id, checking the parameters it requires.
    pub fn from_parts(id: &str, frequency: Option<u32>, minimal_panel_age: Option<u32>) -> Result<Self> {
        if id == NO_REPLACEMENT {
            return Ok(ReplacementPolicy::NoReplacement);
        }
        let known = [
            REPLACE_FAILED_PANELS_EVERY_X_YEARS,
            REPLACE_ALL_PANELS_EVERY_X_YEARS,
            UC_REPLACE_FAILED_PANELS_EVERY_X_YEARS,
            UC_REPLACE_ALL_PANELS_EVERY_X_YEARS,
        ];
        if !known.contains(&id) {
            return Err(BipvError::UnknownReplacementScenario(id.to_string()));
        }
        let frequency = frequency.ok_or_else(|| BipvError::MissingReplacementFrequency(id.to_string()))?;
        if frequency == 0 {
            return Err(BipvError::InvalidReplacementFrequency(frequency));
        }
        Ok(match id {
            REPLACE_FAILED_PANELS_EVERY_X_YEARS => ReplacementPolicy::ReplaceFailedPanelsEveryXYears { frequency },
            REPLACE_ALL_PANELS_EVERY_X_YEARS => {
                ReplacementPolicy::ReplaceAllPanelsEveryXYears { frequency, minimal_panel_age }
            }
            UC_REPLACE_FAILED_PANELS_EVERY_X_YEARS => {
                ReplacementPolicy::UcReplaceFailedPanelsEveryXYears { frequency }
            }
            _ => ReplacementPolicy::UcReplaceAllPanelsEveryXYears { frequency, minimal_panel_age },
        })
    }

    fn is_trigger_year(&self, year: u32, start_year: u32, uc_start_year: u32) -> bool {
        let elapsed = |reference: u32, frequency: u32| {
            (year as i64 - reference as i64).rem_euclid(frequency as i64) == 0
        };
        match *self {
            ReplacementPolicy::NoReplacement => false,
            ReplacementPolicy::ReplaceFailedPanelsEveryXYears { frequency }
            | ReplacementPolicy::ReplaceAllPanelsEveryXYears { frequency, .. } => elapsed(start_year, frequency),
            ReplacementPolicy::UcReplaceFailedPanelsEveryXYears { frequency }
            | ReplacementPolicy::UcReplaceAllPanelsEveryXYears { frequency, .. } => elapsed(uc_start_year, frequency),
        }
    }

    fn selects(&self, panel: &PanelUnit) -> bool {
        match *self {
            ReplacementPolicy::NoReplacement => false,
            ReplacementPolicy::ReplaceFailedPanelsEveryXYears { .. }
            | ReplacementPolicy::UcReplaceFailedPanelsEveryXYears { .. } => !panel.is_working(),
            ReplacementPolicy::ReplaceAllPanelsEveryXYears { minimal_panel_age, .. }
            | ReplacementPolicy::UcReplaceAllPanelsEveryXYears { minimal_panel_age, .. } => match minimal_panel_age {
                Some(minimal_age) => !panel.is_working() || panel.age() >= minimal_age,
                None => true,
            },
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A policy plus the optional year after which the installation is no longer maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementScenario {
    pub policy: ReplacementPolicy,
    pub infrastructure_replacement_last_year: Option<u32>,
}

impl ReplacementScenario {
    pub fn new(policy: ReplacementPolicy) -> Self {
        Self {
            policy,
            infrastructure_replacement_last_year: None,
        }
    }

    pub fn with_infrastructure_replacement_last_year(mut self, last_year: u32) -> Self {
        self.infrastructure_replacement_last_year = Some(last_year);
        self
    }

    fn is_retired(&self, year: u32, start_year: u32) -> bool {
        match self.infrastructure_replacement_last_year {
            Some(last_year) => year as i64 - start_year as i64 > last_year as i64,
            None => false,
        }
    }
}

impl TryFrom<&ReplacementParameters> for ReplacementScenario {
    type Error = BipvError;

    fn try_from(parameters: &ReplacementParameters) -> Result<Self> {
        let policy = ReplacementPolicy::from_parts(
            &parameters.replacement_scenario,
            parameters.replacement_frequency_in_years,
            parameters.minimal_panel_age,
        )?;
        Ok(Self {
            policy,
            infrastructure_replacement_last_year: parameters.infrastructure_replacement_last_year,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    Bootstrap,
    Policy,
    NotTriggered,
    InfrastructureRetired,
}

/// Positions (in the fleet) of the panels to (re)install this year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementDecision {
    pub year: u32,
    pub reason: DecisionReason,
    pub panels: Vec<usize>,
}

impl ReplacementDecision {
    pub fn nb_new_panels(&self) -> usize {
        self.panels.len()
    }
}

/// Decides which panels get installed in `year`. `start_year` is the first year of the
/// fleet, `uc_start_year` the first year of the urban canopy study.
pub fn select_panels_to_replace(
    panels: &[PanelUnit],
    year: u32,
    start_year: u32,
    uc_start_year: u32,
    scenario: &ReplacementScenario,
) -> ReplacementDecision {
    let decision = |reason: DecisionReason, panels: Vec<usize>| ReplacementDecision { year, reason, panels };

    if scenario.is_retired(year, start_year) {
        return decision(DecisionReason::InfrastructureRetired, Vec::new());
    }
    if year == start_year {
        return decision(DecisionReason::Bootstrap, (0..panels.len()).collect());
    }
    if !scenario.policy.is_trigger_year(year, start_year, uc_start_year) {
        return decision(DecisionReason::NotTriggered, Vec::new());
    }
    let selected = panels
        .iter()
        .enumerate()
        .filter(|(_, panel)| scenario.policy.selects(panel))
        .map(|(position, _)| position)
        .collect();
    decision(DecisionReason::Policy, selected)
}
