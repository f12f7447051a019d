// Main module declarations for the BIPV fleet simulator

pub mod error;

// Core simulation modules
pub mod core {
    pub mod screening;
    pub mod replacement;
    pub mod fleet;
    pub mod simulation;
    pub mod multi_simulation;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod simulation_config;
}

// Model definitions
pub mod models {
    pub mod technology;
    pub mod transportation;
    pub mod inverter;
    pub mod panel;
    pub mod building;
}

// Data loaders and persisted state
pub mod data {
    pub mod library_loader;
    pub mod buildings_loader;
    pub mod checkpoint;
}

// LCA accounting, result series and derived metrics
pub mod analysis {
    pub mod lca;
    pub mod results;
    pub mod metrics;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::core::fleet::{FleetSimulator, FleetYearState};
pub use crate::core::replacement::{ReplacementPolicy, ReplacementScenario};
pub use crate::error::{BipvError, Result};
pub use crate::models::panel::PanelUnit;
pub use crate::models::technology::PanelTechnology;
