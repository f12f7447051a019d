use serde::{Deserialize, Serialize};
use crate::error::{BipvError, Result};
use crate::models::building::SurfaceKind;
use super::metrics::add_series;

/// Yearly cost breakdown. Revenues are positive numbers subtracted in `net`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSeries {
    pub investment: Vec<f64>,
    pub transportation: Vec<f64>,
    pub maintenance: Vec<f64>,
    pub inverter: Vec<f64>,
    pub recycling: Vec<f64>,
    pub revenue_substituted_construction_material: Vec<f64>,
    pub revenue_material_recovery: Vec<f64>,
    pub net: Vec<f64>,
}

impl CostSeries {
    pub fn named_series(&self) -> Vec<(&'static str, &[f64])> {
        vec![
            ("cost_investment", &self.investment[..]),
            ("cost_transportation", &self.transportation[..]),
            ("cost_maintenance", &self.maintenance[..]),
            ("cost_inverter", &self.inverter[..]),
            ("cost_recycling", &self.recycling[..]),
            ("revenue_substituted_construction_material", &self.revenue_substituted_construction_material[..]),
            ("revenue_material_recovery", &self.revenue_material_recovery[..]),
            ("cost_net", &self.net[..]),
        ]
    }

    fn merge(&self, other: &CostSeries) -> Result<CostSeries> {
        Ok(CostSeries {
            investment: add_series("cost_investment", &self.investment, &other.investment)?,
            transportation: add_series("cost_transportation", &self.transportation, &other.transportation)?,
            maintenance: add_series("cost_maintenance", &self.maintenance, &other.maintenance)?,
            inverter: add_series("cost_inverter", &self.inverter, &other.inverter)?,
            recycling: add_series("cost_recycling", &self.recycling, &other.recycling)?,
            revenue_substituted_construction_material: add_series(
                "revenue_substituted_construction_material",
                &self.revenue_substituted_construction_material,
                &other.revenue_substituted_construction_material,
            )?,
            revenue_material_recovery: add_series(
                "revenue_material_recovery",
                &self.revenue_material_recovery,
                &other.revenue_material_recovery,
            )?,
            net: add_series("cost_net", &self.net, &other.net)?,
        })
    }

    fn append(&mut self, other: CostSeries) {
        self.investment.extend(other.investment);
        self.transportation.extend(other.transportation);
        self.maintenance.extend(other.maintenance);
        self.inverter.extend(other.inverter);
        self.recycling.extend(other.recycling);
        self.revenue_substituted_construction_material
            .extend(other.revenue_substituted_construction_material);
        self.revenue_material_recovery.extend(other.revenue_material_recovery);
        self.net.extend(other.net);
    }
}

/// Year-indexed results of one surface group, or of the whole building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceResults {
    pub years: Vec<u32>,
    pub energy_harvested: Vec<f64>,          // kWh
    pub nb_new_panels: Vec<usize>,
    pub lca_cradle_to_installation_primary_energy: Vec<f64>, // kWh
    pub lca_recycling_primary_energy: Vec<f64>,
    pub lca_cradle_to_installation_carbon: Vec<f64>,         // kgCO2eq
    pub lca_recycling_carbon: Vec<f64>,
    pub dmfa_waste: Vec<f64>,                // kg
    pub cost: CostSeries,
}

impl SurfaceResults {
    /// Results of a surface with no panels over the given years.
    pub fn zeros(years: &[u32]) -> Self {
        let n = years.len();
        SurfaceResults {
            years: years.to_vec(),
            energy_harvested: vec![0.0; n],
            nb_new_panels: vec![0; n],
            lca_cradle_to_installation_primary_energy: vec![0.0; n],
            lca_recycling_primary_energy: vec![0.0; n],
            lca_cradle_to_installation_carbon: vec![0.0; n],
            lca_recycling_carbon: vec![0.0; n],
            dmfa_waste: vec![0.0; n],
            cost: CostSeries {
                investment: vec![0.0; n],
                transportation: vec![0.0; n],
                maintenance: vec![0.0; n],
                inverter: vec![0.0; n],
                recycling: vec![0.0; n],
                revenue_substituted_construction_material: vec![0.0; n],
                revenue_material_recovery: vec![0.0; n],
                net: vec![0.0; n],
            },
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Every float series with its export name.
    pub fn named_series(&self) -> Vec<(&'static str, &[f64])> {
        let mut series: Vec<(&'static str, &[f64])> = vec![
            ("energy_harvested", &self.energy_harvested[..]),
            ("lca_cradle_to_installation_primary_energy", &self.lca_cradle_to_installation_primary_energy[..]),
            ("lca_recycling_primary_energy", &self.lca_recycling_primary_energy[..]),
            ("lca_cradle_to_installation_carbon", &self.lca_cradle_to_installation_carbon[..]),
            ("lca_recycling_carbon", &self.lca_recycling_carbon[..]),
            ("dmfa_waste", &self.dmfa_waste[..]),
        ];
        series.extend(self.cost.named_series());
        series
    }

    /// Checks that every series covers every year.
    pub fn check_lengths(&self) -> Result<()> {
        let expected = self.years.len();
        if self.nb_new_panels.len() != expected {
            return Err(BipvError::SeriesLengthMismatch {
                series: "nb_new_panels".to_string(),
                left: expected,
                right: self.nb_new_panels.len(),
            });
        }
        for (name, series) in self.named_series() {
            if series.len() != expected {
                return Err(BipvError::SeriesLengthMismatch {
                    series: name.to_string(),
                    left: expected,
                    right: series.len(),
                });
            }
        }
        Ok(())
    }

    /// Element-wise sum of two surfaces covering the same years.
    pub fn merge(&self, other: &SurfaceResults) -> Result<SurfaceResults> {
        if self.years.len() != other.years.len() {
            return Err(BipvError::SeriesLengthMismatch {
                series: "years".to_string(),
                left: self.years.len(),
                right: other.years.len(),
            });
        }
        if self.years != other.years {
            return Err(BipvError::InvalidInput(
                "cannot merge results covering different years".to_string(),
            ));
        }
        if self.nb_new_panels.len() != other.nb_new_panels.len() {
            return Err(BipvError::SeriesLengthMismatch {
                series: "nb_new_panels".to_string(),
                left: self.nb_new_panels.len(),
                right: other.nb_new_panels.len(),
            });
        }
        Ok(SurfaceResults {
            years: self.years.clone(),
            energy_harvested: add_series("energy_harvested", &self.energy_harvested, &other.energy_harvested)?,
            nb_new_panels: self.nb_new_panels.iter().zip(&other.nb_new_panels).map(|(a, b)| a + b).collect(),
            lca_cradle_to_installation_primary_energy: add_series(
                "lca_cradle_to_installation_primary_energy",
                &self.lca_cradle_to_installation_primary_energy,
                &other.lca_cradle_to_installation_primary_energy,
            )?,
            lca_recycling_primary_energy: add_series(
                "lca_recycling_primary_energy",
                &self.lca_recycling_primary_energy,
                &other.lca_recycling_primary_energy,
            )?,
            lca_cradle_to_installation_carbon: add_series(
                "lca_cradle_to_installation_carbon",
                &self.lca_cradle_to_installation_carbon,
                &other.lca_cradle_to_installation_carbon,
            )?,
            lca_recycling_carbon: add_series(
                "lca_recycling_carbon",
                &self.lca_recycling_carbon,
                &other.lca_recycling_carbon,
            )?,
            dmfa_waste: add_series("dmfa_waste", &self.dmfa_waste, &other.dmfa_waste)?,
            cost: self.cost.merge(&other.cost)?,
        })
    }

    /// Appends the years of a resumed run, which must start after the stored ones.
    pub fn append(&mut self, other: SurfaceResults) -> Result<()> {
        other.check_lengths()?;
        if let (Some(last), Some(first)) = (self.years.last(), other.years.first()) {
            if first <= last {
                return Err(BipvError::InvalidInput(format!(
                    "cannot append results starting in {} after results ending in {}",
                    first, last
                )));
            }
        }
        self.years.extend(other.years);
        self.energy_harvested.extend(other.energy_harvested);
        self.nb_new_panels.extend(other.nb_new_panels);
        self.lca_cradle_to_installation_primary_energy
            .extend(other.lca_cradle_to_installation_primary_energy);
        self.lca_recycling_primary_energy.extend(other.lca_recycling_primary_energy);
        self.lca_cradle_to_installation_carbon
            .extend(other.lca_cradle_to_installation_carbon);
        self.lca_recycling_carbon.extend(other.lca_recycling_carbon);
        self.dmfa_waste.extend(other.dmfa_waste);
        self.cost.append(other.cost);
        Ok(())
    }
}

/// Roof, facades and their sum for one building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingResults {
    pub roof: Option<SurfaceResults>,
    pub facades: Option<SurfaceResults>,
    pub total: SurfaceResults,
}

impl BuildingResults {
    pub fn from_surfaces(roof: Option<SurfaceResults>, facades: Option<SurfaceResults>) -> Result<Self> {
        let total = total_of(roof.as_ref(), facades.as_ref())?;
        Ok(Self { roof, facades, total })
    }

    pub fn surface(&self, surface: SurfaceKind) -> Option<&SurfaceResults> {
        match surface {
            SurfaceKind::Roof => self.roof.as_ref(),
            SurfaceKind::Facades => self.facades.as_ref(),
        }
    }

    /// Appends a resumed run surface by surface and recomputes the total.
    ///
    /// A surface present on one side only is padded with zero years, so a
    /// surface enabled (or left out) since the checkpoint keeps the building's
    /// span.
    pub fn append(&mut self, newer: BuildingResults) -> Result<()> {
        let stored_years = self.total.years.clone();
        let newer_years = newer.total.years.clone();
        self.roof = append_surface(self.roof.take(), newer.roof, &stored_years, &newer_years)?;
        self.facades = append_surface(self.facades.take(), newer.facades, &stored_years, &newer_years)?;
        self.total = total_of(self.roof.as_ref(), self.facades.as_ref())?;
        Ok(())
    }
}

fn append_surface(
    stored: Option<SurfaceResults>,
    newer: Option<SurfaceResults>,
    stored_years: &[u32],
    newer_years: &[u32],
) -> Result<Option<SurfaceResults>> {
    if stored.is_none() && newer.is_none() {
        return Ok(None);
    }
    let mut surface = stored.unwrap_or_else(|| SurfaceResults::zeros(stored_years));
    surface.append(newer.unwrap_or_else(|| SurfaceResults::zeros(newer_years)))?;
    Ok(Some(surface))
}

fn total_of(roof: Option<&SurfaceResults>, facades: Option<&SurfaceResults>) -> Result<SurfaceResults> {
    match (roof, facades) {
        (Some(roof), Some(facades)) => roof.merge(facades),
        (Some(only), None) | (None, Some(only)) => Ok(only.clone()),
        (None, None) => Ok(SurfaceResults::default()),
    }
}
