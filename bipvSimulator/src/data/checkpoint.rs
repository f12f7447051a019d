use std::path::{Path, PathBuf};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::analysis::results::BuildingResults;
use crate::config::constants::CHECKPOINT_FILE_NAME;
use crate::core::fleet::FleetState;
use crate::error::Result;
use crate::models::building::{check_building_id, SurfaceKind};
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Everything needed to resume the simulation of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingCheckpoint {
    pub building_id: String,
    pub saved_at: String,
    pub roof: Option<FleetState>,
    pub facades: Option<FleetState>,
    pub results: BuildingResults,
}

impl BuildingCheckpoint {
    pub fn new(
        building_id: &str,
        roof: Option<FleetState>,
        facades: Option<FleetState>,
        results: BuildingResults,
    ) -> Self {
        Self {
            building_id: building_id.to_string(),
            saved_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            roof,
            facades,
            results,
        }
    }

    pub fn fleet(&self, surface: SurfaceKind) -> Option<&FleetState> {
        match surface {
            SurfaceKind::Roof => self.roof.as_ref(),
            SurfaceKind::Facades => self.facades.as_ref(),
        }
    }

    pub fn path(checkpoint_dir: &Path, building_id: &str) -> Result<PathBuf> {
        check_building_id(building_id)?;
        Ok(checkpoint_dir.join(building_id).join(CHECKPOINT_FILE_NAME))
    }

    pub fn save(&self, checkpoint_dir: &Path) -> Result<PathBuf> {
        let _timing = logging::start_timing(
            "save_checkpoint",
            OperationCategory::FileIO { subcategory: FileIOType::CheckpointSave },
        );
        let path = Self::path(checkpoint_dir, &self.building_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        debug!(building = %self.building_id, path = %path.display(), "checkpoint saved");
        Ok(path)
    }

    /// Returns None when the building was never simulated.
    pub fn load(checkpoint_dir: &Path, building_id: &str) -> Result<Option<Self>> {
        let _timing = logging::start_timing(
            "load_checkpoint",
            OperationCategory::FileIO { subcategory: FileIOType::CheckpointLoad },
        );
        let path = Self::path(checkpoint_dir, building_id)?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let checkpoint: Self = serde_json::from_str(&content)?;
            Ok(Some(checkpoint))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::results::tests::results;
    use crate::error::BipvError;
    use crate::models::panel::PanelState;

    #[test]
    fn checkpoint_survives_a_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let roof = FleetState {
            surface: SurfaceKind::Roof,
            start_year: 2024,
            current_study_duration_in_years: 3,
            technology_id: "tech".to_string(),
            inverter_capacity: 4500.0,
            panels: vec![PanelState {
                index: 7,
                technology_id: "tech".to_string(),
                age: 3,
                is_working: false,
                failure_age: Some(3),
                install_count: 1,
            }],
        };
        let building_results = BuildingResults::from_surfaces(Some(results(&[2024, 2025, 2026], 2.0)), None).unwrap();
        let checkpoint = BuildingCheckpoint::new("b1", Some(roof), None, building_results);
        checkpoint.save(dir.path()).unwrap();

        let restored = BuildingCheckpoint::load(dir.path(), "b1").unwrap().unwrap();
        assert_eq!(restored, checkpoint);
        assert!(BuildingCheckpoint::load(dir.path(), "b2").unwrap().is_none());
    }

    #[test]
    fn checkpoint_stays_inside_its_folder() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint_dir = dir.path().join("checkpoints");
        let checkpoint = BuildingCheckpoint::new("../b1", None, None, BuildingResults::default());
        assert!(matches!(checkpoint.save(&checkpoint_dir), Err(BipvError::InvalidBuildingId(_))));
        assert!(!dir.path().join("b1").exists());
        assert!(BuildingCheckpoint::load(&checkpoint_dir, "../b1").is_err());
    }
}
