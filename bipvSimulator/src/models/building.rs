use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{BipvError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Roof,
    Facades,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 2] = [SurfaceKind::Roof, SurfaceKind::Facades];

    pub fn is_roof(&self) -> bool {
        matches!(self, SurfaceKind::Roof)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Roof => write!(f, "roof"),
            SurfaceKind::Facades => write!(f, "facades"),
        }
    }
}

impl FromStr for SurfaceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roof" => Ok(SurfaceKind::Roof),
            "facades" | "facade" => Ok(SurfaceKind::Facades),
            _ => Err(format!("Unknown surface kind: {}", s)),
        }
    }
}

/// Sensor grid of one surface group: one entry per mesh cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub face_areas: Vec<f64>,          // m2
    pub annual_irradiance: Vec<f64>,   // kWh/m2/year
    #[serde(default)]
    pub hourly_irradiance_file: Option<PathBuf>,
}

impl SurfaceGrid {
    pub fn len(&self) -> usize {
        self.face_areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.face_areas.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.face_areas.len() != self.annual_irradiance.len() {
            return Err(BipvError::GridLengthMismatch {
                face_areas: self.face_areas.len(),
                irradiance: self.annual_irradiance.len(),
            });
        }
        Ok(())
    }
}

/// Building ids name the per-building checkpoint and export folders, so they
/// must be a single path component.
pub fn check_building_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(BipvError::InvalidBuildingId(id.to_string()));
    }
    Ok(())
}

/// Building as described by the GIS layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingBasic {
    pub id: String,
    #[serde(default)]
    pub index_in_gis: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub construction_year: Option<u32>,
    #[serde(default)]
    pub typology: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub num_floor: Option<u32>,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub floor_height: Option<f64>,
}

/// Building selected for simulation, carrying its sensor grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingModeled {
    pub id: String,
    pub index_in_gis: Option<usize>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub construction_year: Option<u32>,
    pub typology: Option<String>,
    pub height: Option<f64>,
    pub num_floor: Option<u32>,
    pub elevation: f64,
    pub floor_height: Option<f64>,
    pub is_target: bool,
    pub roof_grid: Option<SurfaceGrid>,
    pub facades_grid: Option<SurfaceGrid>,
}

impl BuildingModeled {
    pub fn from_basic(basic: BuildingBasic, is_target: bool) -> Self {
        let BuildingBasic {
            id,
            index_in_gis,
            name,
            group,
            construction_year,
            typology,
            height,
            num_floor,
            elevation,
            floor_height,
        } = basic;
        Self {
            id,
            index_in_gis,
            name,
            group,
            construction_year,
            typology,
            height,
            num_floor,
            elevation,
            floor_height,
            is_target,
            roof_grid: None,
            facades_grid: None,
        }
    }

    pub fn grid(&self, surface: SurfaceKind) -> Option<&SurfaceGrid> {
        match surface {
            SurfaceKind::Roof => self.roof_grid.as_ref(),
            SurfaceKind::Facades => self.facades_grid.as_ref(),
        }
    }

    pub fn set_grid(&mut self, surface: SurfaceKind, grid: SurfaceGrid) {
        match surface {
            SurfaceKind::Roof => self.roof_grid = Some(grid),
            SurfaceKind::Facades => self.facades_grid = Some(grid),
        }
    }
}
