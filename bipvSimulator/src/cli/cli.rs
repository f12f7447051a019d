use std::path::PathBuf;
use clap::Parser;
use crate::models::panel::FailureDraw;

#[derive(Parser, Debug)]
#[command(author, version, about = "BIPV fleet simulation with life cycle and cost accounting", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON file describing the buildings and their sensor grids")]
    buildings: PathBuf,

    #[arg(short, long, required = true, help = "Library JSON file(s) with technologies, transportation and inverters")]
    library: Vec<PathBuf>,

    #[arg(short, long, help = "Simulation configuration JSON, overridden by the flags below")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, help = "Folder of the per-building checkpoints used to resume a run")]
    checkpoint_dir: Option<PathBuf>,

    #[arg(long)]
    start_year: Option<u32>,

    #[arg(long, help = "First year of the fleets created by this run")]
    current_year: Option<u32>,

    #[arg(long, help = "Last simulated year, exclusive")]
    end_year: Option<u32>,

    #[arg(short = 'r', long)]
    replacement_scenario: Option<String>,

    #[arg(short = 'f', long)]
    replacement_frequency: Option<u32>,

    #[arg(long)]
    minimal_panel_age: Option<u32>,

    #[arg(long)]
    minimum_panel_eroi: Option<f64>,

    #[arg(long, help = "never, expected_lifetime or weibull")]
    failure_draw: Option<FailureDraw>,

    #[arg(long, help = "Random seed of the panel failure draws")]
    seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    continue_simulation: bool,

    #[arg(long, default_value_t = false)]
    update_panel_technology: bool,

    #[arg(long = "building-id", help = "Only simulate these buildings")]
    building_ids: Vec<String>,

    #[arg(long, default_value_t = false)]
    sequential: bool,

    #[arg(long, default_value_t = false)]
    no_progress: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,
}

impl Args {
    pub fn buildings(&self) -> &PathBuf {
        &self.buildings
    }

    pub fn library(&self) -> &[PathBuf] {
        &self.library
    }

    pub fn config(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn checkpoint_dir(&self) -> Option<&PathBuf> {
        self.checkpoint_dir.as_ref()
    }

    pub fn start_year(&self) -> Option<u32> {
        self.start_year
    }

    pub fn current_year(&self) -> Option<u32> {
        self.current_year
    }

    pub fn end_year(&self) -> Option<u32> {
        self.end_year
    }

    pub fn replacement_scenario(&self) -> Option<&str> {
        self.replacement_scenario.as_deref()
    }

    pub fn replacement_frequency(&self) -> Option<u32> {
        self.replacement_frequency
    }

    pub fn minimal_panel_age(&self) -> Option<u32> {
        self.minimal_panel_age
    }

    pub fn minimum_panel_eroi(&self) -> Option<f64> {
        self.minimum_panel_eroi
    }

    pub fn failure_draw(&self) -> Option<FailureDraw> {
        self.failure_draw
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn continue_simulation(&self) -> bool {
        self.continue_simulation
    }

    pub fn update_panel_technology(&self) -> bool {
        self.update_panel_technology
    }

    pub fn building_ids(&self) -> &[String] {
        &self.building_ids
    }

    pub fn sequential(&self) -> bool {
        self.sequential
    }

    pub fn no_progress(&self) -> bool {
        self.no_progress
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}
