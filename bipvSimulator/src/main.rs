use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bipvsim::analysis::reporting;
use bipvsim::cli::cli::Args;
use bipvsim::config::simulation_config::SimulationConfig;
use bipvsim::core::multi_simulation::{run_multi_simulation, BatchOptions};
use bipvsim::data::buildings_loader::load_buildings;
use bipvsim::data::library_loader::Library;
use bipvsim::utils::csv_export::CsvExporter;
use bipvsim::utils::logging;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging());

    let config = build_config(&args)?;
    info!(
        target: "user",
        "BIPV simulation {}-{} (roof: {}, facades: {}, resume: {})",
        config.uc_current_year,
        config.uc_end_year,
        config.bipv_on_roof,
        config.bipv_on_facades,
        config.continue_simulation
    );

    let library = Library::load(args.library()).context("Failed to load the library")?;
    let buildings = load_buildings(args.buildings())
        .with_context(|| format!("Failed to load buildings from {}", args.buildings().display()))?;

    let options = BatchOptions {
        parallel: !args.sequential(),
        show_progress: !args.no_progress(),
        building_ids: args.building_ids().to_vec(),
        checkpoint_dir: args.checkpoint_dir().cloned(),
    };
    let outcomes = run_multi_simulation(&buildings, &library, &config, &options)?;

    for report in outcomes.iter().filter_map(|outcome| outcome.report()) {
        reporting::print_building_summary(report);
    }
    reporting::print_batch_summary(&outcomes);

    let exporter = CsvExporter::new(args.output_dir(), true)
        .with_context(|| format!("Failed to create the output folder in {}", args.output_dir().display()))?;
    exporter.export_outcomes(&outcomes).context("Failed to export results")?;

    logging::print_timing_report();
    Ok(())
}

/// Configuration file (or defaults) with the command line flags applied on top.
fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match args.config() {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(year) = args.start_year() {
        config.uc_start_year = year;
        config.uc_current_year = config.uc_current_year.max(year);
    }
    if let Some(year) = args.current_year() {
        config.uc_current_year = year;
    }
    if let Some(year) = args.end_year() {
        config.uc_end_year = year;
    }
    if let Some(scenario) = args.replacement_scenario() {
        config.replacement.replacement_scenario = scenario.to_string();
    }
    if let Some(frequency) = args.replacement_frequency() {
        config.replacement.replacement_frequency_in_years = Some(frequency);
    }
    if let Some(age) = args.minimal_panel_age() {
        config.replacement.minimal_panel_age = Some(age);
    }
    if let Some(eroi) = args.minimum_panel_eroi() {
        config.bipv.minimum_panel_eroi = eroi;
    }
    if let Some(draw) = args.failure_draw() {
        config.failure.draw = draw;
    }
    if let Some(seed) = args.seed() {
        config.failure.seed = seed;
    }
    config.continue_simulation |= args.continue_simulation();
    config.update_panel_technology |= args.update_panel_technology();

    config.validate().context("Invalid simulation configuration")?;
    Ok(config)
}
